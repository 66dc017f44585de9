//! Partition based node groups

use std::collections::{BTreeSet, HashSet};

use error_stack::Report;

use super::error::{ConfigError, ConfigResult};
use super::node::Node;

/// Group of nodes matching no configured group.
pub const OTHER_GROUP: &str = "other";

/// A named set of partitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionGroup {
    pub name: String,
    pub partitions: BTreeSet<String>,
}

/// Ordered group definitions; the first group sharing a partition with a
/// node claims it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupingConfig {
    groups: Vec<PartitionGroup>,
}

impl GroupingConfig {
    /// # Errors
    ///
    /// - [`ConfigError::InvalidGrouping`] for empty, duplicate or reserved
    ///   group names and for groups without partitions
    pub fn new(groups: Vec<PartitionGroup>) -> ConfigResult<Self> {
        let mut names = HashSet::new();
        for group in &groups {
            let message = if group.name.is_empty() {
                Some("group name must not be empty".to_string())
            } else if group.name == OTHER_GROUP {
                Some(format!("group name `{OTHER_GROUP}` is reserved"))
            } else if !names.insert(group.name.as_str()) {
                Some(format!("group `{}` is defined more than once", group.name))
            } else if group.partitions.is_empty() {
                Some(format!("group `{}` has no partitions", group.name))
            } else {
                None
            };
            if let Some(message) = message {
                return Err(Report::new(ConfigError::InvalidGrouping { message }));
            }
        }

        for (index, group) in groups.iter().enumerate() {
            for earlier in &groups[..index] {
                let shared: Vec<_> = group.partitions.intersection(&earlier.partitions).collect();
                if !shared.is_empty() {
                    tracing::warn!(
                        "Groups {} and {} share partitions {:?}; nodes in them belong to {}",
                        earlier.name,
                        group.name,
                        shared,
                        earlier.name
                    );
                }
            }
        }

        Ok(Self { groups })
    }

    pub fn groups(&self) -> &[PartitionGroup] {
        &self.groups
    }

    /// Configured group names followed by [`OTHER_GROUP`].
    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups
            .iter()
            .map(|group| group.name.as_str())
            .chain(std::iter::once(OTHER_GROUP))
    }
}

/// Name of the group a set of partitions falls into.
pub fn resolve_group<'a>(partitions: &BTreeSet<String>, config: &'a GroupingConfig) -> &'a str {
    config
        .groups
        .iter()
        .find(|group| !group.partitions.is_disjoint(partitions))
        .map(|group| group.name.as_str())
        .unwrap_or(OTHER_GROUP)
}

/// Name of the group a node falls into.
pub fn node_group<'a>(node: &Node, config: &'a GroupingConfig) -> &'a str {
    resolve_group(node.partitions(), config)
}
