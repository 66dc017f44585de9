use clap::{Parser, Subcommand};
use utils::version;

use crate::config::report::{CheckConfigArgs, ReportArgs};

/// Summarize how the capacity of a batch cluster is used.
#[derive(Parser)]
#[command(about, long_about, version = &**version::VERSION)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print usage reports for a cluster snapshot
    Report(Box<ReportArgs>),
    /// Validate a cluster configuration and print its normalized form
    #[command(name = "check-config")]
    CheckConfig(CheckConfigArgs),
}
