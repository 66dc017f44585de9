//! Assembles nodes from raw partition and node facts

use std::collections::{BTreeMap, BTreeSet, HashMap};

use api_types::ClusterSnapshot;
use error_stack::{Report, ResultExt};

use super::dimensions::ResourceDimensionConfig;
use super::error::{AccountingError, AccountingResult, HostRangeError};
use super::node::{Node, NodeUsageParams, ResourceUsage};

/// Placeholder the scheduler reports for nodes without generic resources.
const NULL_GRES: &str = "(null)";

/// Expands compact host range expressions such as `node[1-3]`.
pub trait HostRangeExpander {
    fn expand(&self, expression: &str) -> Result<Vec<String>, Report<HostRangeError>>;
}

/// Split a generic resource string `name[:qualifier]*:quantity` into its
/// name and quantity, ignoring a trailing annotation such as `(IDX:0-1)`.
///
/// Returns `None` if the string has no name or no integer quantity.
pub fn parse_gres(raw: &str) -> Option<(&str, u64)> {
    let spec = raw.trim().split('(').next().unwrap_or_default();
    let mut fields = spec.split(':');
    let name = fields.next().filter(|name| !name.is_empty())?;
    let quantity = fields.next_back()?.trim().parse::<u64>().ok()?;
    Some((name, quantity))
}

/// Sum the quantities of a node's generic resource strings per name.
///
/// Empty strings and the `(null)` placeholder are skipped.
///
/// # Errors
///
/// - [`AccountingError::MalformedGres`] if a string has no integer quantity
pub fn parse_gres_list(node: &str, raw: &[String]) -> AccountingResult<HashMap<String, u64>> {
    let mut quantities = HashMap::new();
    for entry in raw {
        let trimmed = entry.trim();
        if trimmed.is_empty() || trimmed == NULL_GRES {
            continue;
        }
        let (name, quantity) = parse_gres(trimmed).ok_or_else(|| {
            Report::new(AccountingError::MalformedGres {
                node: node.to_string(),
                raw: entry.clone(),
            })
        })?;
        *quantities.entry(name.to_string()).or_insert(0) += quantity;
    }
    Ok(quantities)
}

/// Builds the node collection of one report run.
pub struct SnapshotBuilder<'a, E> {
    dimensions: &'a ResourceDimensionConfig,
    excluded_partitions: &'a BTreeSet<String>,
    expander: &'a E,
}

impl<'a, E: HostRangeExpander> SnapshotBuilder<'a, E> {
    pub fn new(
        dimensions: &'a ResourceDimensionConfig,
        excluded_partitions: &'a BTreeSet<String>,
        expander: &'a E,
    ) -> Self {
        Self {
            dimensions,
            excluded_partitions,
            expander,
        }
    }

    /// Create nodes from partition membership, then classify each of them
    /// from its node facts.
    ///
    /// Nodes are returned ordered by name.
    ///
    /// # Errors
    ///
    /// - [`AccountingError::HostRange`] if a partition's host range is malformed
    /// - [`AccountingError::UnknownNode`] if node facts name a host of no included partition
    /// - [`AccountingError::Unclassified`] if a partition member has no node facts
    /// - [`AccountingError::InvalidState`] and [`AccountingError::MalformedGres`]
    ///   for unusable node facts
    pub fn build(&self, snapshot: &ClusterSnapshot) -> AccountingResult<Vec<Node>> {
        let mut nodes: BTreeMap<String, Node> = BTreeMap::new();

        for (partition, facts) in &snapshot.partitions {
            if self.excluded_partitions.contains(partition) {
                tracing::debug!("Skipping excluded partition {}", partition);
                continue;
            }

            let hosts = self.expander.expand(&facts.nodes).change_context(
                AccountingError::HostRange {
                    partition: partition.clone(),
                    expression: facts.nodes.clone(),
                },
            )?;

            for host in hosts {
                let node = nodes
                    .entry(host)
                    .or_insert_with_key(|host| Node::new(host.clone()));
                node.add_partition(partition.clone());
                node.update_default_mem_per_cpu(facts.default_mem_per_cpu);
            }
        }

        for (name, facts) in &snapshot.nodes {
            let node = nodes.get_mut(name).ok_or_else(|| {
                Report::new(AccountingError::UnknownNode { node: name.clone() })
            })?;

            let generic_total = parse_gres_list(name, &facts.gres)?;
            let generic_allocated = parse_gres_list(name, &facts.gres_used)?;

            node.set_resources_and_state(
                &NodeUsageParams {
                    raw_state: &facts.state,
                    cpu: ResourceUsage::new(facts.alloc_cpus, facts.total_cpus),
                    mem: ResourceUsage::new(facts.alloc_mem, facts.total_mem),
                    generic_allocated: &generic_allocated,
                    generic_total: &generic_total,
                },
                self.dimensions,
            )?;
        }

        if let Some(node) = nodes.values().find(|node| node.state().is_none()) {
            return Err(Report::new(AccountingError::Unclassified {
                node: node.name().to_string(),
            })
            .attach_printable("partition member has no node facts"));
        }

        tracing::info!(
            "Built snapshot of {} nodes from {} partitions",
            nodes.len(),
            snapshot.partitions.len() - self.excluded_count(snapshot)
        );

        Ok(nodes.into_values().collect())
    }

    fn excluded_count(&self, snapshot: &ClusterSnapshot) -> usize {
        snapshot
            .partitions
            .keys()
            .filter(|partition| self.excluded_partitions.contains(*partition))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use api_types::{NodeFacts, NodeState, PartitionFacts};
    use similar_asserts::assert_eq;

    use super::*;
    use crate::domain::dimensions::ResourceDimension;
    use crate::domain::units::ResourceUnit;

    /// Comma separated host lists only.
    struct ListExpander;

    impl HostRangeExpander for ListExpander {
        fn expand(&self, expression: &str) -> Result<Vec<String>, Report<HostRangeError>> {
            if expression.contains('[') {
                return Err(Report::new(HostRangeError {
                    expression: expression.to_string(),
                    reason: "ranges are not supported".to_string(),
                }));
            }
            Ok(expression.split(',').map(str::to_string).collect())
        }
    }

    fn partition(default_mem_per_cpu: u64, nodes: &str) -> PartitionFacts {
        PartitionFacts {
            default_mem_per_cpu,
            nodes: nodes.to_string(),
        }
    }

    fn facts(state: &str, gres: &[&str], gres_used: &[&str]) -> NodeFacts {
        NodeFacts {
            state: state.to_string(),
            alloc_cpus: 4,
            total_cpus: 32,
            alloc_mem: 8192,
            total_mem: 256000,
            gres: gres.iter().map(|g| g.to_string()).collect(),
            gres_used: gres_used.iter().map(|g| g.to_string()).collect(),
        }
    }

    fn dimensions() -> ResourceDimensionConfig {
        ResourceDimensionConfig::new(vec![
            ResourceDimension {
                name: "gpu".to_string(),
                unit: ResourceUnit::Count,
            },
            ResourceDimension {
                name: "scratch".to_string(),
                unit: ResourceUnit::Gb,
            },
        ])
        .unwrap()
    }

    #[test]
    fn parse_gres_forms() {
        assert_eq!(parse_gres("gpu:4"), Some(("gpu", 4)));
        assert_eq!(parse_gres("gpu:a100:4"), Some(("gpu", 4)));
        assert_eq!(parse_gres("gpu:a100:2(IDX:0-1)"), Some(("gpu", 2)));
        assert_eq!(parse_gres("scratch:100"), Some(("scratch", 100)));
        assert_eq!(parse_gres("gpu"), None);
        assert_eq!(parse_gres("gpu:a100:many"), None);
        assert_eq!(parse_gres(":4"), None);
    }

    #[test]
    fn parse_gres_list_sums_by_name() {
        let raw = vec![
            "gpu:a100:2".to_string(),
            "gpu:v100:2".to_string(),
            "scratch:100".to_string(),
            "(null)".to_string(),
            String::new(),
        ];

        let quantities = parse_gres_list("gpu001", &raw).unwrap();

        assert_eq!(quantities.get("gpu"), Some(&4));
        assert_eq!(quantities.get("scratch"), Some(&100));
    }

    #[test]
    fn parse_gres_list_reports_node_and_string() {
        let raw = vec!["gpu:a100:lots".to_string()];

        let err = parse_gres_list("gpu001", &raw).unwrap_err();

        assert!(matches!(
            err.current_context(),
            AccountingError::MalformedGres { node, raw }
                if node == "gpu001" && raw == "gpu:a100:lots"
        ));
    }

    #[test]
    fn build_resolves_memberships_and_resources() {
        let snapshot = ClusterSnapshot {
            partitions: BTreeMap::from([
                ("gen".to_string(), partition(4096, "n1,n2")),
                ("gpu".to_string(), partition(2048, "n2,g1")),
                ("long".to_string(), partition(8192, "n2")),
            ]),
            nodes: BTreeMap::from([
                ("n1".to_string(), facts("IDLE", &[], &[])),
                ("n2".to_string(), facts("MIXED", &["scratch:100"], &["scratch:10"])),
                (
                    "g1".to_string(),
                    facts("ALLOCATED", &["gpu:a100:4"], &["gpu:a100:4(IDX:0-3)"]),
                ),
            ]),
        };
        let dimensions = dimensions();
        let excluded = BTreeSet::new();

        let nodes = SnapshotBuilder::new(&dimensions, &excluded, &ListExpander)
            .build(&snapshot)
            .unwrap();

        let names: Vec<_> = nodes.iter().map(Node::name).collect();
        assert_eq!(names, vec!["g1", "n1", "n2"]);

        let n2 = &nodes[2];
        assert_eq!(n2.default_mem_per_cpu(), Some(2048));
        assert_eq!(n2.partitions().len(), 3);
        assert_eq!(n2.state(), Some(NodeState::Mixed));
        assert_eq!(
            n2.resource("scratch"),
            Some(ResourceUsage::new(10 * 1024, 100 * 1024))
        );
        assert_eq!(n2.resource("gpu"), Some(ResourceUsage::new(0, 0)));

        let g1 = &nodes[0];
        assert_eq!(g1.state(), Some(NodeState::Allocated));
        assert_eq!(g1.resource("gpu"), Some(ResourceUsage::new(4, 4)));
    }

    #[test]
    fn excluded_partitions_do_not_contribute() {
        let snapshot = ClusterSnapshot {
            partitions: BTreeMap::from([
                ("gen".to_string(), partition(4096, "n1")),
                ("test".to_string(), partition(512, "n1,t1")),
            ]),
            nodes: BTreeMap::from([("n1".to_string(), facts("IDLE", &[], &[]))]),
        };
        let dimensions = ResourceDimensionConfig::default();
        let excluded = BTreeSet::from(["test".to_string()]);

        let nodes = SnapshotBuilder::new(&dimensions, &excluded, &ListExpander)
            .build(&snapshot)
            .unwrap();

        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].default_mem_per_cpu(), Some(4096));
        assert!(!nodes[0].partitions().contains("test"));
    }

    #[test]
    fn node_outside_included_partitions_is_fatal() {
        let snapshot = ClusterSnapshot {
            partitions: BTreeMap::from([
                ("gen".to_string(), partition(4096, "n1")),
                ("test".to_string(), partition(512, "t1")),
            ]),
            nodes: BTreeMap::from([
                ("n1".to_string(), facts("IDLE", &[], &[])),
                ("t1".to_string(), facts("IDLE", &[], &[])),
            ]),
        };
        let dimensions = ResourceDimensionConfig::default();
        let excluded = BTreeSet::from(["test".to_string()]);

        let err = SnapshotBuilder::new(&dimensions, &excluded, &ListExpander)
            .build(&snapshot)
            .unwrap_err();

        assert!(matches!(
            err.current_context(),
            AccountingError::UnknownNode { node } if node == "t1"
        ));
    }

    #[test]
    fn partition_member_without_facts_is_fatal() {
        let snapshot = ClusterSnapshot {
            partitions: BTreeMap::from([("gen".to_string(), partition(4096, "n1,n2"))]),
            nodes: BTreeMap::from([("n1".to_string(), facts("IDLE", &[], &[]))]),
        };
        let dimensions = ResourceDimensionConfig::default();
        let excluded = BTreeSet::new();

        let err = SnapshotBuilder::new(&dimensions, &excluded, &ListExpander)
            .build(&snapshot)
            .unwrap_err();

        assert!(matches!(
            err.current_context(),
            AccountingError::Unclassified { node } if node == "n2"
        ));
    }

    #[test]
    fn malformed_host_range_names_the_partition() {
        let snapshot = ClusterSnapshot {
            partitions: BTreeMap::from([("gen".to_string(), partition(4096, "n[1-2]"))]),
            nodes: BTreeMap::new(),
        };
        let dimensions = ResourceDimensionConfig::default();
        let excluded = BTreeSet::new();

        let err = SnapshotBuilder::new(&dimensions, &excluded, &ListExpander)
            .build(&snapshot)
            .unwrap_err();

        assert!(matches!(
            err.current_context(),
            AccountingError::HostRange { partition, .. } if partition == "gen"
        ));
    }

    #[test]
    fn invalid_node_state_aborts_the_build() {
        let snapshot = ClusterSnapshot {
            partitions: BTreeMap::from([("gen".to_string(), partition(4096, "n1"))]),
            nodes: BTreeMap::from([("n1".to_string(), facts("UNKNOWN", &[], &[]))]),
        };
        let dimensions = ResourceDimensionConfig::default();
        let excluded = BTreeSet::new();

        let err = SnapshotBuilder::new(&dimensions, &excluded, &ListExpander)
            .build(&snapshot)
            .unwrap_err();

        assert!(matches!(
            err.current_context(),
            AccountingError::InvalidState { .. }
        ));
    }
}
