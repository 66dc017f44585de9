//! Report aggregation over node collections

use std::collections::{BTreeSet, HashMap};

use api_types::{NodeState, StateSummary, UsageReport};
use error_stack::Report;

use super::accumulator::{percent, ResourceAccumulator};
use super::dimensions::ResourceDimensionConfig;
use super::error::{AccountingError, AccountingResult};
use super::grouping::{node_group, GroupingConfig};
use super::node::Node;

/// Title of the report covering every node.
pub const ALL_NODES_TITLE: &str = "All nodes";

/// Summarize the nodes accepted by `predicate`.
///
/// Every tracked dimension gets its own ledger; state and resource
/// percentages are 0 when nothing matched.
///
/// # Errors
///
/// - [`AccountingError::Unclassified`] if a matched node has no state
/// - [`AccountingError::MissingResource`] if a matched node lacks a tracked dimension
pub fn summarize<'n, I, P>(
    nodes: I,
    dimensions: &ResourceDimensionConfig,
    title: &str,
    mut predicate: P,
) -> AccountingResult<UsageReport>
where
    I: IntoIterator<Item = &'n Node>,
    P: FnMut(&Node) -> bool,
{
    let mut accumulators: Vec<_> = dimensions
        .tracked()
        .map(|(name, format)| ResourceAccumulator::new(name, format))
        .collect();
    let mut counts: HashMap<NodeState, u64> = HashMap::new();
    let mut node_count = 0u64;

    for node in nodes.into_iter().filter(|node| predicate(*node)) {
        let state = node.state().ok_or_else(|| {
            Report::new(AccountingError::Unclassified {
                node: node.name().to_string(),
            })
        })?;
        *counts.entry(state).or_insert(0) += 1;
        node_count += 1;

        for accumulator in &mut accumulators {
            accumulator.update(node)?;
        }
    }

    let states = NodeState::ALL
        .iter()
        .map(|&state| {
            let count = counts.get(&state).copied().unwrap_or(0);
            StateSummary {
                state,
                count,
                percent: percent(count, node_count),
            }
        })
        .collect();

    tracing::debug!("Summarized {} nodes for {}", node_count, title);

    Ok(UsageReport {
        title: title.to_string(),
        node_count,
        states,
        resources: accumulators.iter().map(ResourceAccumulator::summary).collect(),
    })
}

/// Membership predicate for nodes in any of `partitions`; accepts every
/// node when `partitions` is empty.
pub fn in_partitions(partitions: &BTreeSet<String>) -> impl Fn(&Node) -> bool + '_ {
    move |node: &Node| partitions.is_empty() || !node.partitions().is_disjoint(partitions)
}

/// Summarize all nodes, then each configured group and the `other` group.
pub fn summarize_groups(
    nodes: &[Node],
    dimensions: &ResourceDimensionConfig,
    grouping: &GroupingConfig,
) -> AccountingResult<Vec<UsageReport>> {
    let groups: HashMap<&str, &str> = nodes
        .iter()
        .map(|node| (node.name(), node_group(node, grouping)))
        .collect();

    let mut reports = vec![summarize(nodes, dimensions, ALL_NODES_TITLE, |_| true)?];
    for group in grouping.group_names() {
        let title = format!("Group {group}");
        reports.push(summarize(nodes, dimensions, &title, |node| {
            groups.get(node.name()) == Some(&group)
        })?);
    }
    Ok(reports)
}
