pub mod hostlist;
pub mod logging;
pub mod metrics;
pub mod snapshot_source;
