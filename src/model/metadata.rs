//! Training metadata written alongside the model (`model_metadata.json`).

use crate::features::FeatureSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelMetadata {
    /// Winning estimator family, e.g. "RandomForest"
    pub model_type: String,
    /// Held-out accuracy at selection time
    pub accuracy: Option<f64>,
    pub n_features: Option<usize>,
    pub feature_columns: Vec<String>,
}

impl ModelMetadata {
    pub fn load(path: &Path) -> Result<Self, MetadataError> {
        let data = std::fs::read_to_string(path).map_err(|source| MetadataError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&data).map_err(|source| MetadataError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// False if the metadata names a different column count or order than `schema`.
    /// Fields the metadata omits are not checked.
    pub fn agrees_with(&self, schema: &FeatureSchema) -> bool {
        let count_ok = self.n_features.map_or(true, |n| n == schema.len());
        let columns_ok = self.feature_columns.is_empty() || self.feature_columns == schema.names();
        count_ok && columns_ok
    }
}
