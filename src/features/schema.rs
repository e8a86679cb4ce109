//! Feature schema: the ordered column names the classifier was trained on.
//!
//! Loaded from a JSON array of strings (`feature_columns.json`). A missing or
//! unusable file is a deployment nuisance, not a fatal error: the loader logs a
//! warning and falls back to [`FeatureSchema::builtin`].
//!
//! Changing the built-in list (names or order) changes its fingerprint and
//! breaks compatibility with models trained on the previous layout.

use super::{Feature, FEATURE_COUNT};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;
use tracing::{info, warn};

static BUILTIN: OnceLock<FeatureSchema> = OnceLock::new();

#[derive(Debug, Error)]
pub enum SchemaError {
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
    #[error("schema is empty")]
    Empty,
    #[error("duplicate feature name {0:?}")]
    Duplicate(String),
}

/// Where a loaded schema came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaSource {
    File(PathBuf),
    Builtin,
    /// Supplied directly by the host
    Custom,
}

#[derive(Debug, Clone)]
pub struct SchemaLoad {
    pub schema: FeatureSchema,
    pub source: SchemaSource,
}

/// Ordered, unique feature names. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSchema {
    names: Vec<String>,
}

impl FeatureSchema {
    /// Build from names; rejects empty lists and duplicates.
    pub fn new(names: Vec<String>) -> Result<Self, SchemaError> {
        if names.is_empty() {
            return Err(SchemaError::Empty);
        }
        let mut seen = HashSet::with_capacity(names.len());
        for name in &names {
            if !seen.insert(name.as_str()) {
                return Err(SchemaError::Duplicate(name.clone()));
            }
        }
        Ok(Self { names })
    }

    /// The 48-column layout the reference model was trained with.
    pub fn builtin() -> &'static FeatureSchema {
        BUILTIN.get_or_init(|| FeatureSchema {
            names: Feature::ALL.iter().map(|f| f.name().to_string()).collect(),
        })
    }

    /// Read a JSON array of names from `path`.
    pub fn from_file(path: &Path) -> Result<Self, SchemaError> {
        let data = std::fs::read_to_string(path).map_err(|source| SchemaError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let names: Vec<String> =
            serde_json::from_str(&data).map_err(|source| SchemaError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        Self::new(names)
    }

    /// Load from `path` if given, falling back to the built-in layout.
    pub fn load(path: Option<&Path>) -> SchemaLoad {
        let Some(path) = path else {
            return SchemaLoad {
                schema: Self::builtin().clone(),
                source: SchemaSource::Builtin,
            };
        };
        match Self::from_file(path) {
            Ok(schema) => {
                info!(
                    path = %path.display(),
                    features = schema.len(),
                    fingerprint = %schema.fingerprint(),
                    "feature schema loaded"
                );
                SchemaLoad {
                    schema,
                    source: SchemaSource::File(path.to_path_buf()),
                }
            }
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    fallback_features = FEATURE_COUNT,
                    "feature schema unavailable; using built-in layout"
                );
                SchemaLoad {
                    schema: Self::builtin().clone(),
                    source: SchemaSource::Builtin,
                }
            }
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// SHA-256 over the ordered names (NUL separated), lowercase hex.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for name in &self.names {
            hasher.update(name.as_bytes());
            hasher.update([0u8]);
        }
        format!("{:x}", hasher.finalize())
    }
}
