//! Cluster configuration file

use std::collections::BTreeSet;
use std::path::Path;

use error_stack::{Report, ResultExt};
use serde::{Deserialize, Serialize};

use crate::domain::dimensions::{ResourceDimension, ResourceDimensionConfig};
use crate::domain::error::{ConfigError, ConfigResult};
use crate::domain::grouping::{GroupingConfig, PartitionGroup};
use crate::domain::units::ResourceUnit;

/// Cluster configuration as written in YAML.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RawClusterConfig {
    #[serde(default)]
    pub excluded_partitions: Vec<String>,
    #[serde(default)]
    pub groups: Vec<RawGroup>,
    #[serde(default)]
    pub resources: Vec<RawResource>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawGroup {
    pub name: String,
    pub partitions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawResource {
    pub name: String,
    pub unit: String,
}

/// Validated cluster configuration.
#[derive(Debug, Clone, Default)]
pub struct ClusterConfig {
    pub excluded_partitions: BTreeSet<String>,
    pub grouping: GroupingConfig,
    pub dimensions: ResourceDimensionConfig,
}

impl TryFrom<RawClusterConfig> for ClusterConfig {
    type Error = Report<ConfigError>;

    fn try_from(raw: RawClusterConfig) -> ConfigResult<Self> {
        let mut generic = Vec::with_capacity(raw.resources.len());
        for resource in raw.resources {
            let unit = resource.unit.parse::<ResourceUnit>().map_err(|unit| {
                Report::new(ConfigError::UnknownUnit { unit })
                    .attach_printable(format!("resource: {}", resource.name))
            })?;
            generic.push(ResourceDimension {
                name: resource.name,
                unit,
            });
        }
        let dimensions = ResourceDimensionConfig::new(generic)?;

        let grouping = GroupingConfig::new(
            raw.groups
                .into_iter()
                .map(|group| PartitionGroup {
                    name: group.name,
                    partitions: group.partitions.into_iter().collect(),
                })
                .collect(),
        )?;

        Ok(Self {
            excluded_partitions: raw.excluded_partitions.into_iter().collect(),
            grouping,
            dimensions,
        })
    }
}

impl ClusterConfig {
    /// Parse and validate a YAML document; `origin` names it in errors.
    pub fn from_yaml(yaml: &str, origin: &str) -> ConfigResult<Self> {
        let raw: RawClusterConfig =
            serde_yaml::from_str(yaml).change_context(ConfigError::Parse {
                path: origin.to_string(),
            })?;
        Self::try_from(raw).attach_printable_lazy(|| format!("config file: {origin}"))
    }

    /// The configuration in its canonical YAML shape.
    pub fn to_raw(&self) -> RawClusterConfig {
        RawClusterConfig {
            excluded_partitions: self.excluded_partitions.iter().cloned().collect(),
            groups: self
                .grouping
                .groups()
                .iter()
                .map(|group| RawGroup {
                    name: group.name.clone(),
                    partitions: group.partitions.iter().cloned().collect(),
                })
                .collect(),
            resources: self
                .dimensions
                .generic()
                .iter()
                .map(|dimension| RawResource {
                    name: dimension.name.clone(),
                    unit: dimension.unit.to_string(),
                })
                .collect(),
        }
    }
}

/// Load and validate the cluster configuration file.
pub async fn load_cluster_config(path: impl AsRef<Path>) -> ConfigResult<ClusterConfig> {
    let path = path.as_ref();
    tracing::info!("Loading cluster configuration from {:?}", path);

    let yaml = tokio::fs::read_to_string(path)
        .await
        .change_context(ConfigError::Read {
            path: path.display().to_string(),
        })?;
    let config = ClusterConfig::from_yaml(&yaml, &path.display().to_string())?;

    tracing::info!(
        "Loaded {} groups, {} generic resources and {} excluded partitions",
        config.grouping.groups().len(),
        config.dimensions.generic().len(),
        config.excluded_partitions.len()
    );
    Ok(config)
}
