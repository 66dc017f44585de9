use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Clone, Debug)]
pub struct ReportArgs {
    #[arg(
        long,
        env = "CLUSTER_USAGE_CONFIG",
        value_hint = clap::ValueHint::FilePath,
        help = "Path for the cluster configuration, e.g. /etc/cluster-usage/cluster.yaml"
    )]
    pub config: PathBuf,

    #[arg(
        long,
        value_hint = clap::ValueHint::FilePath,
        help = "Path for the partition facts JSON, keyed by partition name"
    )]
    pub partitions: PathBuf,

    #[arg(
        long,
        value_hint = clap::ValueHint::FilePath,
        help = "Path for the node facts JSON, keyed by node name"
    )]
    pub nodes: PathBuf,

    #[arg(
        long = "partition",
        help = "Only report nodes in this partition, may be repeated"
    )]
    pub partition: Vec<String>,

    #[arg(
        long,
        help = "Also print one report per configured group and the `other` group"
    )]
    pub by_group: bool,

    #[arg(long, help = "Title of the overall report, defaults to `All nodes`")]
    pub title: Option<String>,

    #[arg(
        long,
        env = "CLUSTER_USAGE_METRICS_FILE",
        value_hint = clap::ValueHint::FilePath,
        help = "Path for report metrics, rotated daily, e.g. /logs/usage-metrics.log"
    )]
    pub metrics_file: Option<PathBuf>,

    #[arg(
        long,
        env = "CLUSTER_USAGE_METRICS_FORMAT",
        default_value = "influx",
        value_parser = ["influx", "json"],
        help = "Encoding of report metrics"
    )]
    pub metrics_format: String,
}

#[derive(Parser, Clone, Debug)]
pub struct CheckConfigArgs {
    #[arg(
        long,
        env = "CLUSTER_USAGE_CONFIG",
        value_hint = clap::ValueHint::FilePath,
        help = "Path for the cluster configuration"
    )]
    pub config: PathBuf,
}
