//! provides logging helpers

use std::path::Path;

use tracing::Subscriber;
use tracing_appender::rolling;
use tracing_subscriber::filter::{self};
use tracing_subscriber::fmt::layer;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

/// Redirects diagnostic logs from stderr to the given file when set.
pub const LOG_PATH_ENV_VAR: &str = "CLUSTER_USAGE_LOG_PATH";

/// Build the human readable fmt layer, writing to `log_path` or stderr.
pub fn get_fmt_layer<S>(log_path: Option<String>) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    match log_path {
        Some(log_path) => {
            let path = Path::new(&log_path);
            let dir = path.parent().unwrap_or(Path::new("."));
            let file = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "cluster-usage.log".to_string());
            layer()
                .with_writer(rolling::never(dir, file))
                .with_target(true)
                .with_ansi(false)
                .boxed()
        }
        None => layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed(),
    }
}

/// initiate the global tracing subscriber
pub fn init() {
    let env_filter = filter::EnvFilter::builder()
        .with_default_directive(filter::LevelFilter::INFO.into())
        .from_env_lossy();

    let log_path = std::env::var(LOG_PATH_ENV_VAR).ok();
    let fmt_layer = get_fmt_layer(log_path).with_filter(env_filter);

    registry().with(fmt_layer).init();
}
