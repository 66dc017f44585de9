use std::collections::HashMap;

use api_types::{ResourceSummary, UsageReport};

pub mod influx;
pub mod json;

pub const NODES_MEASUREMENT: &str = "cluster_usage_nodes";
pub const RESOURCE_MEASUREMENT: &str = "cluster_usage_resource";

/// Encodes metric lines in one wire format. Every field is an unsigned counter.
pub trait MetricsEncoder: Send + Sync {
    fn encode_metrics(
        &self,
        measurement: &str,
        tags: &HashMap<String, String>,
        fields: &HashMap<String, u64>,
        timestamp: i64,
    ) -> String;

    /// Node counts per state of one report.
    fn encode_node_metrics(&self, report: &UsageReport, timestamp: i64) -> String {
        let mut tags = HashMap::new();
        tags.insert("title".to_string(), report.title.clone());

        let mut fields = HashMap::new();
        fields.insert("node_count".to_string(), report.node_count);
        for state in &report.states {
            fields.insert(state.state.to_string().to_lowercase(), state.count);
        }
        self.encode_metrics(NODES_MEASUREMENT, &tags, &fields, timestamp)
    }

    /// Capacity ledger of one dimension of a report.
    fn encode_resource_metrics(
        &self,
        title: &str,
        resource: &ResourceSummary,
        timestamp: i64,
    ) -> String {
        let mut tags = HashMap::new();
        tags.insert("title".to_string(), title.to_string());
        tags.insert("resource".to_string(), resource.name.clone());

        let mut fields = HashMap::new();
        fields.insert("idle".to_string(), resource.idle);
        fields.insert("allocated".to_string(), resource.allocated);
        fields.insert("unavailable".to_string(), resource.unavailable);
        fields.insert("down".to_string(), resource.down);
        fields.insert("usable".to_string(), resource.usable);
        fields.insert("total".to_string(), resource.total);
        fields.insert("over_allocation".to_string(), resource.over_allocation);
        self.encode_metrics(RESOURCE_MEASUREMENT, &tags, &fields, timestamp)
    }
}

/// Factory function to create encoders based on format string
pub fn create_encoder(format: &str) -> Box<dyn MetricsEncoder + Send + Sync> {
    match format.to_lowercase().as_str() {
        "json" => Box::new(json::JsonEncoder::new()),
        _ => Box::new(influx::InfluxEncoder::new()),
    }
}
