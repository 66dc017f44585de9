use std::collections::BTreeSet;

use anyhow::Result;
use api_types::{ClusterSnapshot, UsageReport};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utils::version;

use crate::config::{load_cluster_config, ClusterConfig, ReportArgs};
use crate::domain::error::AccountingResult;
use crate::domain::node::Node;
use crate::domain::report::{in_partitions, summarize, summarize_groups, ALL_NODES_TITLE};
use crate::domain::snapshot::{HostRangeExpander, SnapshotBuilder};
use crate::infrastructure::hostlist::SlurmHostlist;
use crate::infrastructure::logging;
use crate::infrastructure::metrics::emit_report_metrics;
use crate::infrastructure::snapshot_source::FileSnapshotSource;

/// Which reports to produce from a snapshot.
#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    /// Restrict reports to nodes in any of these partitions; empty means all.
    pub partitions: BTreeSet<String>,
    pub by_group: bool,
    pub title: Option<String>,
}

impl From<&ReportArgs> for ReportOptions {
    fn from(args: &ReportArgs) -> Self {
        Self {
            partitions: args.partition.iter().cloned().collect(),
            by_group: args.by_group,
            title: args.title.clone(),
        }
    }
}

/// Report output printed on stdout.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDocument {
    pub generated_at: DateTime<Utc>,
    pub version: String,
    pub reports: Vec<UsageReport>,
}

/// Build the node collection of `snapshot` and summarize it.
///
/// The overall report comes first; with `by_group` it is followed by one
/// report per configured group and `other`.
pub fn build_reports<E: HostRangeExpander>(
    config: &ClusterConfig,
    snapshot: &ClusterSnapshot,
    expander: &E,
    options: &ReportOptions,
) -> AccountingResult<Vec<UsageReport>> {
    let nodes = SnapshotBuilder::new(&config.dimensions, &config.excluded_partitions, expander)
        .build(snapshot)?;

    let selected: Vec<Node> = nodes
        .into_iter()
        .filter(in_partitions(&options.partitions))
        .collect();
    if !options.partitions.is_empty() {
        tracing::info!(
            "Selected {} nodes in partitions {:?}",
            selected.len(),
            options.partitions
        );
    }

    let title = options.title.as_deref().unwrap_or(ALL_NODES_TITLE);
    if !options.by_group {
        return Ok(vec![summarize(&selected, &config.dimensions, title, |_| {
            true
        })?]);
    }

    let mut reports = summarize_groups(&selected, &config.dimensions, &config.grouping)?;
    if let Some(overall) = reports.first_mut() {
        overall.title = title.to_string();
    }
    Ok(reports)
}

pub async fn run_report(args: ReportArgs) -> Result<()> {
    let _guard = logging::init(args.metrics_file.as_ref());

    tracing::info!("Starting cluster-usage report {}", &**version::VERSION);

    let config = load_cluster_config(&args.config)
        .await
        .map_err(|e| anyhow::anyhow!("{e:?}"))?;
    let snapshot = FileSnapshotSource::new(&args.partitions, &args.nodes)
        .load()
        .await
        .map_err(|e| anyhow::anyhow!("{e:?}"))?;

    let generated_at = Utc::now();
    let reports = build_reports(
        &config,
        &snapshot,
        &SlurmHostlist,
        &ReportOptions::from(&args),
    )
    .map_err(|e| anyhow::anyhow!("{e:?}"))?;

    emit_report_metrics(&reports, &args.metrics_format, generated_at);

    let document = ReportDocument {
        generated_at,
        version: version::VERSION.to_string(),
        reports,
    };
    println!("{}", serde_json::to_string_pretty(&document)?);
    Ok(())
}
