//! Error contexts for the accounting core

use core::error::Error;

use error_stack::Report;
use thiserror::Error as ThisError;

/// Result type for snapshot building and report aggregation.
pub type AccountingResult<T> = Result<T, Report<AccountingError>>;

/// Result type for configuration loading and validation.
pub type ConfigResult<T> = Result<T, Report<ConfigError>>;

/// The scheduler snapshot is internally inconsistent; no accounting result
/// derived from it can be trusted.
#[derive(Debug, derive_more::Display)]
pub enum AccountingError {
    #[display("Node {node} does not belong to any included partition")]
    UnknownNode { node: String },

    #[display("Node {node} has unrecognized state `{raw_state}`")]
    InvalidState { node: String, raw_state: String },

    #[display("Node {node} has malformed generic resource `{raw}`")]
    MalformedGres { node: String, raw: String },

    #[display("Node {node} already has its state and resources set")]
    AlreadyClassified { node: String },

    #[display("Node {node} has no state and resources set")]
    Unclassified { node: String },

    #[display("Node {node} reports no `{resource}` resource")]
    MissingResource { node: String, resource: String },

    #[display("Failed to expand host range `{expression}` of partition {partition}")]
    HostRange {
        partition: String,
        expression: String,
    },
}

impl Error for AccountingError {}

/// Configuration is malformed; detected before any snapshot is read.
#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("Unknown unit `{unit}`, expected one of count, MB, GB, TB")]
    UnknownUnit { unit: String },

    #[error("Resource {name} is configured more than once")]
    DuplicateResource { name: String },

    #[error("Resource name {name} is reserved")]
    ReservedResource { name: String },

    #[error("Invalid grouping configuration: {message}")]
    InvalidGrouping { message: String },

    #[error("Failed to read configuration file {path}")]
    Read { path: String },

    #[error("Failed to parse configuration file {path}")]
    Parse { path: String },
}

/// A compact host range expression could not be expanded.
#[derive(Debug, ThisError)]
#[error("Malformed host range `{expression}`: {reason}")]
pub struct HostRangeError {
    pub expression: String,
    pub reason: String,
}
