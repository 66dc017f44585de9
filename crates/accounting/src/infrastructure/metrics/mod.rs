//! Report metrics in InfluxDB line protocol or JSON

use std::fmt;

use api_types::UsageReport;
use chrono::{DateTime, Utc};

pub mod encoders;
use encoders::{create_encoder, MetricsEncoder};

/// Target the metrics file layer listens on.
pub const METRICS_TARGET: &str = "metrics";

// Wrapper struct for Vec<u8> that implements Display
pub struct BytesWrapper(Vec<u8>);

impl fmt::Display for BytesWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

impl From<Vec<u8>> for BytesWrapper {
    fn from(bytes: Vec<u8>) -> Self {
        BytesWrapper(bytes)
    }
}

/// One node line followed by one line per resource dimension.
pub fn report_metric_lines(
    report: &UsageReport,
    encoder: &dyn MetricsEncoder,
    timestamp: i64,
) -> Vec<String> {
    std::iter::once(encoder.encode_node_metrics(report, timestamp))
        .chain(
            report
                .resources
                .iter()
                .map(|resource| encoder.encode_resource_metrics(&report.title, resource, timestamp)),
        )
        .collect()
}

/// Log the metric lines of every report to the metrics target.
pub fn emit_report_metrics(reports: &[UsageReport], format: &str, generated_at: DateTime<Utc>) {
    let encoder = create_encoder(format);
    let timestamp = generated_at.timestamp_nanos_opt().unwrap_or_default();

    let mut count = 0;
    for report in reports {
        for line in report_metric_lines(report, encoder.as_ref(), timestamp) {
            tracing::info!(target: METRICS_TARGET, msg = %line);
            count += 1;
        }
    }
    tracing::debug!("Emitted {} {} metric lines", count, format);
}
