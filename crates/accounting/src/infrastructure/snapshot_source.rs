//! Reads scheduler facts from JSON files

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use api_types::{ClusterSnapshot, NodeFacts, PartitionFacts};
use error_stack::{Report, ResultExt};
use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to read snapshot file {path}")]
    Read { path: String },

    #[error("Failed to parse snapshot file {path}")]
    Parse { path: String },
}

/// Partition facts and node facts, each in its own JSON object keyed by name.
#[derive(Debug, Clone)]
pub struct FileSnapshotSource {
    partitions: PathBuf,
    nodes: PathBuf,
}

impl FileSnapshotSource {
    pub fn new(partitions: impl Into<PathBuf>, nodes: impl Into<PathBuf>) -> Self {
        Self {
            partitions: partitions.into(),
            nodes: nodes.into(),
        }
    }

    /// Read both files concurrently.
    pub async fn load(&self) -> Result<ClusterSnapshot, Report<SourceError>> {
        let (partitions, nodes) = tokio::try_join!(
            read_json::<BTreeMap<String, PartitionFacts>>(&self.partitions),
            read_json::<BTreeMap<String, NodeFacts>>(&self.nodes),
        )?;

        tracing::info!(
            "Read {} partitions and {} nodes",
            partitions.len(),
            nodes.len()
        );
        Ok(ClusterSnapshot { partitions, nodes })
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, Report<SourceError>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .change_context(SourceError::Read {
            path: path.display().to_string(),
        })?;
    serde_json::from_str(&content).change_context(SourceError::Parse {
        path: path.display().to_string(),
    })
}
