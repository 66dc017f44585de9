//! Subscriber set-up for the binary

use std::fmt;
use std::path::Path;

use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::{self, FilterExt};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{layer, FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry;
use tracing_subscriber::registry::LookupSpan;

use super::metrics::METRICS_TARGET;

/// Writes the `msg` field of metrics events as is.
struct MetricsLineFormatter;

#[derive(Default)]
struct MessageVisitor {
    msg: Option<String>,
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "msg" {
            self.msg = Some(value.to_string());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "msg" {
            self.msg = Some(format!("{value:?}"));
        }
    }
}

impl<S, N> FormatEvent<S, N> for MetricsLineFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        match visitor.msg {
            Some(line) => writeln!(writer, "{}", line.trim_end()),
            None => Ok(()),
        }
    }
}

fn is_metrics(target: &str) -> bool {
    target == METRICS_TARGET
}

/// Install the global subscriber.
///
/// Diagnostics go to the fmt layer from [`utils::logging::get_fmt_layer`];
/// metrics events go to a daily rotated `metrics_file` when one is given.
/// The returned guard flushes the metrics file on drop.
pub fn init<P: AsRef<Path>>(metrics_file: Option<P>) -> Option<WorkerGuard> {
    let env_filter = filter::EnvFilter::builder()
        .with_default_directive(filter::LevelFilter::INFO.into())
        .from_env_lossy();
    let log_path = std::env::var(utils::logging::LOG_PATH_ENV_VAR).ok();
    let fmt_layer = utils::logging::get_fmt_layer(log_path).with_filter(
        env_filter.and(filter::filter_fn(|metadata| !is_metrics(metadata.target()))),
    );

    let Some((metrics_layer, guard)) = metrics_file.and_then(|path| metrics_layer(path.as_ref()))
    else {
        registry().with(fmt_layer).init();
        return None;
    };

    registry().with(fmt_layer).with(metrics_layer).init();
    Some(guard)
}

fn metrics_layer<S>(
    path: &Path,
) -> Option<(Box<dyn tracing_subscriber::Layer<S> + Send + Sync>, WorkerGuard)>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let dir = path.parent().unwrap_or(Path::new("."));
    let prefix = path.file_name()?.to_string_lossy().into_owned();

    let appender = match RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(prefix)
        .max_log_files(3)
        .build(dir)
    {
        Ok(appender) => appender,
        Err(e) => {
            eprintln!("failed to create metrics file appender in {dir:?}: {e}");
            return None;
        }
    };
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    let layer = layer()
        .event_format(MetricsLineFormatter)
        .with_writer(file_writer)
        .with_ansi(false)
        .with_filter(filter::filter_fn(|metadata| is_metrics(metadata.target())))
        .boxed();
    Some((layer, guard))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_targets_are_routed_to_the_metrics_file() {
        assert!(is_metrics("metrics"));
        assert!(!is_metrics("accounting::infrastructure::metrics"));
        assert!(!is_metrics("accounting::domain::snapshot"));
    }

    #[test]
    fn metrics_layer_needs_a_file_name() {
        let layer = metrics_layer::<registry::Registry>(Path::new("/"));

        assert!(layer.is_none());
    }
}
