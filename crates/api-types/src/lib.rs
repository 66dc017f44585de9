//! Shared API type definitions
//!
//! This crate contains the data exchanged with the collaborators of the
//! accounting core: the raw scheduler facts a cluster snapshot is assembled
//! from, and the usage report handed to presentation layers.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

/// Normalized node state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeState {
    Idle,
    Mixed,
    Allocated,
    Down,
}

impl NodeState {
    /// All states, in report order.
    pub const ALL: [NodeState; 4] = [
        NodeState::Idle,
        NodeState::Mixed,
        NodeState::Allocated,
        NodeState::Down,
    ];
}

impl std::fmt::Display for NodeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Scheduler facts about one partition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartitionFacts {
    /// Configured default memory per CPU, in MB
    pub default_mem_per_cpu: u64,
    /// Compact host range of member nodes, e.g. `node[1-3]`
    pub nodes: String,
}

/// Scheduler facts about one node
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeFacts {
    /// Raw scheduler state, e.g. `MIXED+DRAIN`
    pub state: String,
    pub alloc_cpus: u64,
    pub total_cpus: u64,
    /// Allocated memory in MB
    pub alloc_mem: u64,
    /// Configured memory in MB
    pub total_mem: u64,
    /// Configured generic resources, e.g. `gpu:a100:4`
    #[serde(default)]
    pub gres: Vec<String>,
    /// Allocated generic resources, e.g. `gpu:a100:2(IDX:0-1)`
    #[serde(default)]
    pub gres_used: Vec<String>,
}

/// Partition and node facts fetched from the scheduler
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterSnapshot {
    pub partitions: BTreeMap<String, PartitionFacts>,
    pub nodes: BTreeMap<String, NodeFacts>,
}

/// Node count for one state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSummary {
    pub state: NodeState,
    pub count: u64,
    /// Share of all matched nodes, 0 when none matched
    pub percent: f64,
}

/// Human readable quantities of a resource summary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormattedQuantities {
    pub idle: String,
    pub allocated: String,
    pub unavailable: String,
    pub down: String,
    pub usable: String,
    pub total: String,
}

/// Accounting result for one resource dimension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSummary {
    /// Dimension name (`cpu`, `mem` or a generic resource)
    pub name: String,
    pub idle: u64,
    pub allocated: u64,
    pub unavailable: u64,
    pub down: u64,
    pub usable: u64,
    pub total: u64,
    /// Allocation in excess of declared totals, not part of the ledger above
    pub over_allocation: u64,
    /// Shares of `usable`, 0 when nothing is usable
    pub idle_percent: f64,
    pub allocated_percent: f64,
    pub unavailable_percent: f64,
    pub formatted: FormattedQuantities,
}

/// Usage summary of a set of nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageReport {
    pub title: String,
    pub node_count: u64,
    pub states: Vec<StateSummary>,
    pub resources: Vec<ResourceSummary>,
}

impl UsageReport {
    /// Look up the summary of a resource dimension by name
    pub fn resource(&self, name: &str) -> Option<&ResourceSummary> {
        self.resources.iter().find(|resource| resource.name == name)
    }

    /// Look up the node count of a state
    pub fn state(&self, state: NodeState) -> Option<&StateSummary> {
        self.states.iter().find(|summary| summary.state == state)
    }
}
