use anyhow::Result;
use clap::Parser;

use accounting::cmd::{run_check_config, run_report};
use accounting::config::{Cli, Commands};

/// Sets up global panic hooks.
fn setup_global_hooks() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        default_hook(panic_info);
        tracing::error!("Thread panicked: {}", panic_info);
    }));
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_global_hooks();

    let cli = Cli::parse();

    match cli.command {
        Commands::Report(report_args) => run_report(*report_args).await,
        Commands::CheckConfig(check_config_args) => run_check_config(check_config_args).await,
    }
}
