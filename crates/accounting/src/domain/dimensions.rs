//! Tracked resource dimensions

use std::collections::HashSet;

use error_stack::Report;

use super::error::{ConfigError, ConfigResult};
use super::units::{DisplayFormat, ResourceUnit};

pub const CPU: &str = "cpu";
pub const MEM: &str = "mem";

/// A configured generic resource and the unit its raw quantities use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDimension {
    pub name: String,
    pub unit: ResourceUnit,
}

/// Ordered set of generic resources tracked next to `cpu` and `mem`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceDimensionConfig {
    generic: Vec<ResourceDimension>,
}

impl ResourceDimensionConfig {
    /// # Errors
    ///
    /// - [`ConfigError::ReservedResource`] if a generic resource is named `cpu` or `mem`
    /// - [`ConfigError::DuplicateResource`] if a name appears twice
    pub fn new(generic: Vec<ResourceDimension>) -> ConfigResult<Self> {
        let mut seen = HashSet::new();
        for dimension in &generic {
            if dimension.name == CPU || dimension.name == MEM {
                return Err(Report::new(ConfigError::ReservedResource {
                    name: dimension.name.clone(),
                }));
            }
            if !seen.insert(dimension.name.as_str()) {
                return Err(Report::new(ConfigError::DuplicateResource {
                    name: dimension.name.clone(),
                }));
            }
        }
        Ok(Self { generic })
    }

    pub fn generic(&self) -> &[ResourceDimension] {
        &self.generic
    }

    /// Every tracked dimension in report order: `cpu`, `mem`, then the
    /// generic resources as configured.
    pub fn tracked(&self) -> impl Iterator<Item = (&str, DisplayFormat)> {
        [(CPU, DisplayFormat::Count), (MEM, DisplayFormat::Memory)]
            .into_iter()
            .chain(
                self.generic
                    .iter()
                    .map(|dimension| (dimension.name.as_str(), dimension.unit.display_format())),
            )
    }
}
