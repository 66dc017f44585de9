//! Command layer - Entry points for the cluster-usage subcommands

pub mod check_config;
pub mod report;

pub use check_config::run_check_config;
pub use report::{build_reports, run_report, ReportDocument, ReportOptions};
