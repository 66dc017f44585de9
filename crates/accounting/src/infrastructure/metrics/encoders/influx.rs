use std::collections::HashMap;

use influxdb_line_protocol::LineProtocolBuilder;

use super::MetricsEncoder;
use crate::infrastructure::metrics::BytesWrapper;

/// InfluxDB line protocol encoder
#[derive(Debug, Default)]
pub struct InfluxEncoder;

impl InfluxEncoder {
    pub fn new() -> Self {
        Self
    }
}

impl MetricsEncoder for InfluxEncoder {
    fn encode_metrics(
        &self,
        measurement: &str,
        tags: &HashMap<String, String>,
        fields: &HashMap<String, u64>,
        timestamp: i64,
    ) -> String {
        let mut tag_entries: Vec<_> = tags.iter().collect();
        tag_entries.sort_by_key(|(k, _)| *k);

        let mut builder = LineProtocolBuilder::new().measurement(measurement);
        for (key, value) in tag_entries {
            builder = builder.tag(key, value);
        }

        let mut field_entries: Vec<_> = fields.iter().collect();
        field_entries.sort_by_key(|(k, _)| *k);

        // the builder only reaches its after-field state through a first field
        let Some(((first_key, first_value), rest)) = field_entries.split_first() else {
            let built = builder
                .field("_empty", true)
                .timestamp(timestamp)
                .close_line()
                .build();
            return BytesWrapper::from(built).to_string();
        };

        let mut line = builder.field(first_key, **first_value);
        for (key, value) in rest {
            line = line.field(key, **value);
        }

        let built = line.timestamp(timestamp).close_line().build();
        BytesWrapper::from(built).to_string()
    }
}
