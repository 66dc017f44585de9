//! Node model

use std::collections::{BTreeMap, BTreeSet, HashMap};

use api_types::NodeState;
use error_stack::Report;

use super::dimensions::{ResourceDimensionConfig, CPU, MEM};
use super::error::{AccountingError, AccountingResult};

/// CPUs the smallest realistic job asks for.
pub const MIN_JOB_CPUS: u64 = 2;

/// Allocated and total quantity of one resource on one node, in base units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceUsage {
    pub allocated: u64,
    pub total: u64,
}

impl ResourceUsage {
    pub const fn new(allocated: u64, total: u64) -> Self {
        Self { allocated, total }
    }

    pub const fn free(&self) -> u64 {
        self.total.saturating_sub(self.allocated)
    }

    /// Whether at least `needed` is free; never true when over-allocated.
    pub const fn has_room_for(&self, needed: u64) -> bool {
        self.allocated <= self.total && self.free() >= needed
    }
}

/// Scheduler-reported state and allocation of a node
#[derive(Debug, Clone)]
pub struct NodeUsageParams<'a> {
    pub raw_state: &'a str,
    pub cpu: ResourceUsage,
    /// Memory, in MB
    pub mem: ResourceUsage,
    /// Raw allocated quantity per generic resource name
    pub generic_allocated: &'a HashMap<String, u64>,
    /// Raw configured quantity per generic resource name
    pub generic_total: &'a HashMap<String, u64>,
}

/// Normalize a raw scheduler state.
///
/// Drained and down flags win over everything else; returns `None` for
/// states that cannot be mapped.
pub fn classify_state(raw_state: &str) -> Option<NodeState> {
    let state = raw_state.to_ascii_lowercase();
    if state.contains("drain") || state.contains("down") {
        Some(NodeState::Down)
    } else if state.contains("idle") {
        Some(NodeState::Idle)
    } else if state.contains("mixed") {
        Some(NodeState::Mixed)
    } else if state.contains("allocated") {
        Some(NodeState::Allocated)
    } else {
        None
    }
}

/// One cluster node.
///
/// Partition memberships and the default memory per CPU are collected
/// first; state and resources are then set together, once.
#[derive(Debug, Clone)]
pub struct Node {
    name: String,
    partitions: BTreeSet<String>,
    default_mem_per_cpu: Option<u64>,
    state: Option<NodeState>,
    resources: BTreeMap<String, ResourceUsage>,
    can_run_another_job: bool,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            partitions: BTreeSet::new(),
            default_mem_per_cpu: None,
            state: None,
            resources: BTreeMap::new(),
            can_run_another_job: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn partitions(&self) -> &BTreeSet<String> {
        &self.partitions
    }

    pub fn default_mem_per_cpu(&self) -> Option<u64> {
        self.default_mem_per_cpu
    }

    /// `None` until [`Node::set_resources_and_state`] succeeded.
    pub fn state(&self) -> Option<NodeState> {
        self.state
    }

    pub fn resource(&self, name: &str) -> Option<ResourceUsage> {
        self.resources.get(name).copied()
    }

    /// Whether a 2-CPU job with twice the default memory per CPU would still
    /// fit. Generic resources are not considered.
    pub fn can_run_another_job(&self) -> bool {
        self.can_run_another_job
    }

    pub fn add_partition(&mut self, partition: impl Into<String>) -> bool {
        self.partitions.insert(partition.into())
    }

    /// Keep the smallest default memory per CPU seen across partitions.
    pub fn update_default_mem_per_cpu(&mut self, value: u64) {
        self.default_mem_per_cpu = Some(match self.default_mem_per_cpu {
            Some(current) => current.min(value),
            None => value,
        });
    }

    /// Classify the node and record its per-dimension allocation.
    ///
    /// Generic resources the node does not report count as zero. Must run
    /// after every partition contributed its default memory per CPU.
    ///
    /// # Errors
    ///
    /// - [`AccountingError::AlreadyClassified`] on a second call
    /// - [`AccountingError::InvalidState`] if the raw state cannot be normalized
    pub fn set_resources_and_state(
        &mut self,
        params: &NodeUsageParams<'_>,
        dimensions: &ResourceDimensionConfig,
    ) -> AccountingResult<()> {
        if self.state.is_some() {
            return Err(Report::new(AccountingError::AlreadyClassified {
                node: self.name.clone(),
            }));
        }

        let state = classify_state(params.raw_state).ok_or_else(|| {
            Report::new(AccountingError::InvalidState {
                node: self.name.clone(),
                raw_state: params.raw_state.to_string(),
            })
        })?;

        let mut resources = BTreeMap::new();
        resources.insert(CPU.to_string(), params.cpu);
        resources.insert(MEM.to_string(), params.mem);
        for dimension in dimensions.generic() {
            let allocated = params
                .generic_allocated
                .get(&dimension.name)
                .copied()
                .unwrap_or(0);
            let total = params
                .generic_total
                .get(&dimension.name)
                .copied()
                .unwrap_or(0);
            resources.insert(
                dimension.name.clone(),
                ResourceUsage::new(
                    dimension.unit.to_base_units(allocated),
                    dimension.unit.to_base_units(total),
                ),
            );
        }

        let min_job_mem = MIN_JOB_CPUS.saturating_mul(self.default_mem_per_cpu.unwrap_or(0));
        self.can_run_another_job =
            params.cpu.has_room_for(MIN_JOB_CPUS) && params.mem.has_room_for(min_job_mem);
        self.state = Some(state);
        self.resources = resources;

        tracing::debug!(
            node = %self.name,
            raw_state = params.raw_state,
            %state,
            can_run_another_job = self.can_run_another_job,
            "classified node"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;

    use super::*;
    use crate::domain::dimensions::ResourceDimension;
    use crate::domain::units::ResourceUnit;

    fn params<'a>(
        raw_state: &'a str,
        cpu: ResourceUsage,
        mem: ResourceUsage,
        empty: &'a HashMap<String, u64>,
    ) -> NodeUsageParams<'a> {
        NodeUsageParams {
            raw_state,
            cpu,
            mem,
            generic_allocated: empty,
            generic_total: empty,
        }
    }

    fn node_with_dmpc(dmpc: u64) -> Node {
        let mut node = Node::new("worker001");
        node.add_partition("general");
        node.update_default_mem_per_cpu(dmpc);
        node
    }

    #[test]
    fn classify_state_vocabulary() {
        let cases = [
            ("IDLE", Some(NodeState::Idle)),
            ("idle+cloud", Some(NodeState::Idle)),
            ("MIXED", Some(NodeState::Mixed)),
            ("ALLOCATED", Some(NodeState::Allocated)),
            ("DOWN", Some(NodeState::Down)),
            ("DRAINED", Some(NodeState::Down)),
            ("MIXED+DRAIN", Some(NodeState::Down)),
            ("IDLE+DRAIN", Some(NodeState::Down)),
            ("ALLOCATED+DOWN", Some(NodeState::Down)),
            ("FUTURE", None),
            ("", None),
        ];
        for (raw, expected) in cases {
            assert_eq!(classify_state(raw), expected, "raw state {raw}");
        }
    }

    #[test]
    fn add_partition_is_idempotent() {
        let mut node = Node::new("worker001");
        assert!(node.add_partition("general"));
        assert!(!node.add_partition("general"));
        assert!(node.add_partition("gpu"));
        assert_eq!(node.partitions().len(), 2);
    }

    #[test]
    fn default_mem_per_cpu_keeps_minimum() {
        let mut node = Node::new("worker001");
        assert_eq!(node.default_mem_per_cpu(), None);

        for value in [4096, 2048, 8192] {
            node.update_default_mem_per_cpu(value);
        }

        assert_eq!(node.default_mem_per_cpu(), Some(2048));
    }

    #[test]
    fn can_run_another_job_on_exact_boundary() {
        let empty = HashMap::new();
        let mut node = node_with_dmpc(1000);
        node.set_resources_and_state(
            &params(
                "MIXED",
                ResourceUsage::new(6, 8),
                ResourceUsage::new(8000, 10000),
                &empty,
            ),
            &ResourceDimensionConfig::default(),
        )
        .unwrap();

        assert!(node.can_run_another_job());
    }

    #[test]
    fn can_run_another_job_one_cpu_short() {
        let empty = HashMap::new();
        let mut node = node_with_dmpc(1000);
        node.set_resources_and_state(
            &params(
                "MIXED",
                ResourceUsage::new(7, 8),
                ResourceUsage::new(8000, 10000),
                &empty,
            ),
            &ResourceDimensionConfig::default(),
        )
        .unwrap();

        assert!(!node.can_run_another_job());
    }

    #[test]
    fn can_run_another_job_one_megabyte_short() {
        let empty = HashMap::new();
        let mut node = node_with_dmpc(1000);
        node.set_resources_and_state(
            &params(
                "MIXED",
                ResourceUsage::new(6, 8),
                ResourceUsage::new(8001, 10000),
                &empty,
            ),
            &ResourceDimensionConfig::default(),
        )
        .unwrap();

        assert!(!node.can_run_another_job());
    }

    #[test]
    fn over_allocated_node_cannot_run_another_job() {
        let empty = HashMap::new();
        let mut node = node_with_dmpc(0);
        node.set_resources_and_state(
            &params(
                "MIXED",
                ResourceUsage::new(12, 10),
                ResourceUsage::new(0, 10000),
                &empty,
            ),
            &ResourceDimensionConfig::default(),
        )
        .unwrap();

        assert!(!node.can_run_another_job());
    }

    #[test]
    fn over_allocated_memory_blocks_another_job_without_default_mem() {
        let empty = HashMap::new();
        let mut node = node_with_dmpc(0);
        node.set_resources_and_state(
            &params(
                "MIXED",
                ResourceUsage::new(4, 16),
                ResourceUsage::new(9000, 8192),
                &empty,
            ),
            &ResourceDimensionConfig::default(),
        )
        .unwrap();

        assert!(!node.can_run_another_job());
    }

    #[test]
    fn has_room_for_rejects_over_allocation() {
        assert!(ResourceUsage::new(0, 0).has_room_for(0));
        assert!(ResourceUsage::new(8, 10).has_room_for(2));
        assert!(!ResourceUsage::new(9, 10).has_room_for(2));
        assert!(!ResourceUsage::new(11, 10).has_room_for(0));
    }

    #[test]
    fn generic_resources_are_scaled_and_default_to_zero() {
        let dimensions = ResourceDimensionConfig::new(vec![
            ResourceDimension {
                name: "scratch".to_string(),
                unit: ResourceUnit::Gb,
            },
            ResourceDimension {
                name: "gpu".to_string(),
                unit: ResourceUnit::Count,
            },
        ])
        .unwrap();
        let allocated = HashMap::from([("scratch".to_string(), 20)]);
        let total = HashMap::from([("scratch".to_string(), 100)]);

        let mut node = node_with_dmpc(1024);
        node.set_resources_and_state(
            &NodeUsageParams {
                raw_state: "IDLE",
                cpu: ResourceUsage::new(0, 32),
                mem: ResourceUsage::new(0, 192000),
                generic_allocated: &allocated,
                generic_total: &total,
            },
            &dimensions,
        )
        .unwrap();

        assert_eq!(node.state(), Some(NodeState::Idle));
        assert_eq!(node.resource("cpu"), Some(ResourceUsage::new(0, 32)));
        assert_eq!(node.resource("mem"), Some(ResourceUsage::new(0, 192000)));
        assert_eq!(
            node.resource("scratch"),
            Some(ResourceUsage::new(20 * 1024, 102400))
        );
        assert_eq!(node.resource("gpu"), Some(ResourceUsage::new(0, 0)));
    }

    #[test]
    fn invalid_state_is_rejected() {
        let empty = HashMap::new();
        let mut node = node_with_dmpc(1024);
        let err = node
            .set_resources_and_state(
                &params(
                    "REBOOT_ISSUED",
                    ResourceUsage::default(),
                    ResourceUsage::default(),
                    &empty,
                ),
                &ResourceDimensionConfig::default(),
            )
            .unwrap_err();

        assert!(matches!(
            err.current_context(),
            AccountingError::InvalidState { node, raw_state }
                if node == "worker001" && raw_state == "REBOOT_ISSUED"
        ));
        assert_eq!(node.state(), None);
    }

    #[test]
    fn state_is_set_only_once() {
        let empty = HashMap::new();
        let mut node = node_with_dmpc(1024);
        let usage = params(
            "IDLE",
            ResourceUsage::new(0, 4),
            ResourceUsage::new(0, 4096),
            &empty,
        );
        node.set_resources_and_state(&usage, &ResourceDimensionConfig::default())
            .unwrap();

        let err = node
            .set_resources_and_state(&usage, &ResourceDimensionConfig::default())
            .unwrap_err();

        assert!(matches!(
            err.current_context(),
            AccountingError::AlreadyClassified { .. }
        ));
    }
}
