//! Detector configuration. JSON file; every section falls back to its default.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Path to the ONNX classifier artifact
    pub model_path: PathBuf,
    /// Ordered feature column names (JSON array); built-in layout when absent
    pub feature_columns_path: Option<PathBuf>,
    /// Training metadata written next to the model
    pub metadata_path: Option<PathBuf>,
    /// Feature extraction parameters
    pub features: FeaturesConfig,
    /// Risk tier thresholds
    pub risk: RiskConfig,
    /// Logging
    pub log: LogConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FeaturesConfig {
    /// Public suffixes recognised in addition to the built-in table (e.g. `"ac.be"`)
    pub extra_public_suffixes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Probability at or above this is high risk (0.0–1.0)
    pub high_threshold: f64,
    /// Probability at or above this is medium risk
    pub medium_threshold: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("phishing_model.onnx"),
            feature_columns_path: Some(PathBuf::from("feature_columns.json")),
            metadata_path: Some(PathBuf::from("model_metadata.json")),
            features: FeaturesConfig::default(),
            risk: RiskConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            high_threshold: 0.7,
            medium_threshold: 0.3,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: true,
        }
    }
}

impl DetectorConfig {
    /// Load from JSON file if present; otherwise return default
    pub fn load(path: &std::path::Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        let parsed = std::fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|data| serde_json::from_str::<DetectorConfig>(&data).map_err(|e| e.to_string()));
        match parsed {
            Ok(c) => c,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "invalid config; using defaults");
                Self::default()
            }
        }
    }
}
