//! Resource units and quantity formatting

use std::fmt;
use std::str::FromStr;

use error_stack::Report;
use serde::Serialize;

use super::error::{ConfigError, ConfigResult};

const MEMORY_SUFFIXES: [&str; 4] = ["MB", "GB", "TB", "PB"];

/// Unit a generic resource quantity is reported in.
///
/// Size units scale into megabytes so they can be compared and summed with
/// memory; `Count` quantities are kept as reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ResourceUnit {
    #[serde(rename = "count")]
    Count,
    #[serde(rename = "MB")]
    Mb,
    #[serde(rename = "GB")]
    Gb,
    #[serde(rename = "TB")]
    Tb,
}

impl ResourceUnit {
    pub const fn scale_factor(self) -> u64 {
        match self {
            ResourceUnit::Count | ResourceUnit::Mb => 1,
            ResourceUnit::Gb => 1024,
            ResourceUnit::Tb => 1024 * 1024,
        }
    }

    /// Convert a raw quantity into base units.
    pub const fn to_base_units(self, quantity: u64) -> u64 {
        quantity.saturating_mul(self.scale_factor())
    }

    /// How quantities of this unit are rendered once in base units.
    pub const fn display_format(self) -> DisplayFormat {
        match self {
            ResourceUnit::Count => DisplayFormat::Count,
            ResourceUnit::Mb | ResourceUnit::Gb | ResourceUnit::Tb => DisplayFormat::Memory,
        }
    }
}

impl FromStr for ResourceUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "count" => Ok(ResourceUnit::Count),
            "MB" => Ok(ResourceUnit::Mb),
            "GB" => Ok(ResourceUnit::Gb),
            "TB" => Ok(ResourceUnit::Tb),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for ResourceUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceUnit::Count => "count",
            ResourceUnit::Mb => "MB",
            ResourceUnit::Gb => "GB",
            ResourceUnit::Tb => "TB",
        };
        f.write_str(name)
    }
}

/// Convert `quantity` expressed in the named unit into base units.
///
/// # Errors
///
/// - [`ConfigError::UnknownUnit`] if `unit` is not one of `count`, `MB`, `GB`, `TB`
pub fn to_base_units(quantity: u64, unit: &str) -> ConfigResult<u64> {
    let unit = unit
        .parse::<ResourceUnit>()
        .map_err(|unit| Report::new(ConfigError::UnknownUnit { unit }))?;
    Ok(unit.to_base_units(quantity))
}

/// Rendering strategy of a resource dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayFormat {
    Count,
    Memory,
}

impl DisplayFormat {
    pub fn format(self, value: u64) -> String {
        match self {
            DisplayFormat::Count => value.to_string(),
            DisplayFormat::Memory => format_memory(value as f64),
        }
    }
}

/// Format a quantity of megabytes with the largest suffix that keeps it
/// below 1024, stopping at PB.
pub fn format_memory(value_mb: f64) -> String {
    let mut value = value_mb;
    let mut suffix = MEMORY_SUFFIXES[0];
    for &next in &MEMORY_SUFFIXES[1..] {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        suffix = next;
    }
    format!("{value:.1} {suffix}")
}
