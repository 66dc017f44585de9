//! Per-dimension capacity ledger

use api_types::{FormattedQuantities, NodeState, ResourceSummary};
use error_stack::Report;

use super::error::{AccountingError, AccountingResult};
use super::node::Node;
use super::units::DisplayFormat;

/// Splits the capacity of one resource dimension into idle, allocated,
/// unavailable and down across the nodes folded into it.
///
/// `idle + allocated + unavailable + down` always equals the summed node
/// totals. Allocation beyond a node's total is clamped and tracked in
/// `over_allocation` instead.
#[derive(Debug, Clone)]
pub struct ResourceAccumulator {
    name: String,
    format: DisplayFormat,
    idle: u64,
    allocated: u64,
    unavailable: u64,
    down: u64,
    over_allocation: u64,
}

impl ResourceAccumulator {
    pub fn new(name: impl Into<String>, format: DisplayFormat) -> Self {
        Self {
            name: name.into(),
            format,
            idle: 0,
            allocated: 0,
            unavailable: 0,
            down: 0,
            over_allocation: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn idle(&self) -> u64 {
        self.idle
    }

    pub fn allocated(&self) -> u64 {
        self.allocated
    }

    pub fn unavailable(&self) -> u64 {
        self.unavailable
    }

    pub fn down(&self) -> u64 {
        self.down
    }

    pub fn over_allocation(&self) -> u64 {
        self.over_allocation
    }

    pub fn usable(&self) -> u64 {
        self.idle + self.allocated + self.unavailable
    }

    pub fn total(&self) -> u64 {
        self.usable() + self.down
    }

    /// Fold one node's capacity for this dimension into the ledger.
    ///
    /// Leftover capacity on an `Allocated` node is unavailable; on a `Mixed`
    /// node it is idle only if the node could still take another job.
    ///
    /// # Errors
    ///
    /// - [`AccountingError::Unclassified`] if the node has no state yet
    /// - [`AccountingError::MissingResource`] if the node does not report this dimension
    pub fn update(&mut self, node: &Node) -> AccountingResult<()> {
        let state = node.state().ok_or_else(|| {
            Report::new(AccountingError::Unclassified {
                node: node.name().to_string(),
            })
        })?;
        let usage = node.resource(&self.name).ok_or_else(|| {
            Report::new(AccountingError::MissingResource {
                node: node.name().to_string(),
                resource: self.name.clone(),
            })
        })?;

        let total = usage.total;
        let mut allocated = usage.allocated;
        if allocated > total {
            let excess = allocated - total;
            tracing::warn!(
                node = node.name(),
                resource = %self.name,
                allocated,
                total,
                "node reports more {} allocated than configured",
                self.name
            );
            self.over_allocation += excess;
            allocated = total;
        }
        let remainder = total - allocated;

        match state {
            NodeState::Down => self.down += total,
            NodeState::Idle => self.idle += total,
            NodeState::Allocated => {
                self.allocated += allocated;
                self.unavailable += remainder;
            }
            NodeState::Mixed => {
                self.allocated += allocated;
                if node.can_run_another_job() {
                    self.idle += remainder;
                } else {
                    self.unavailable += remainder;
                }
            }
        }

        Ok(())
    }

    /// Snapshot the ledger for a report.
    pub fn summary(&self) -> ResourceSummary {
        let usable = self.usable();
        ResourceSummary {
            name: self.name.clone(),
            idle: self.idle,
            allocated: self.allocated,
            unavailable: self.unavailable,
            down: self.down,
            usable,
            total: self.total(),
            over_allocation: self.over_allocation,
            idle_percent: percent(self.idle, usable),
            allocated_percent: percent(self.allocated, usable),
            unavailable_percent: percent(self.unavailable, usable),
            formatted: FormattedQuantities {
                idle: self.format.format(self.idle),
                allocated: self.format.format(self.allocated),
                unavailable: self.format.format(self.unavailable),
                down: self.format.format(self.down),
                usable: self.format.format(usable),
                total: self.format.format(self.total()),
            },
        }
    }
}

/// `part` as a percentage of `whole`, 0 when `whole` is 0.
pub fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 * 100.0 / whole as f64
    }
}
