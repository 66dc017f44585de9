//! Domain layer - cluster resource accounting

pub mod accumulator;
pub mod dimensions;
pub mod error;
pub mod grouping;
pub mod node;
pub mod report;
pub mod snapshot;
pub mod units;
