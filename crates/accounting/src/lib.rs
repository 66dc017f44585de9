//! Resource utilization accounting for batch scheduled clusters.
//!
//! A [`ClusterSnapshot`](api_types::ClusterSnapshot) of partition and node
//! facts is turned into [`Node`](domain::node::Node)s by the
//! [`SnapshotBuilder`](domain::snapshot::SnapshotBuilder), then folded into
//! [`UsageReport`](api_types::UsageReport)s by [`domain::report`].

pub mod cmd;
pub mod config;
pub mod domain;
pub mod infrastructure;
