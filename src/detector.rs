//! The classification context: schema, classifier and thresholds, built once
//! by the host and shared read-only across requests.

use crate::config::DetectorConfig;
use crate::features::{
    assemble, assemble_bag, Extraction, FeatureBag, FeatureExtractor, FeatureSchema,
    FeatureVector, SchemaSource,
};
use crate::model::{
    Capability, Classifier, InferenceFailure, ModelError, ModelMetadata, OnnxClassifier,
};
use crate::risk::{PredictionResult, RiskEngine, RiskLevel};
use serde::Serialize;
use std::io::BufRead;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Prefixes accepted as an explicit scheme. Case-sensitive.
const SCHEME_PREFIXES: &[&str] = &["http://", "https://", "ftp://"];

/// Prepend `https://` unless `url` starts with a recognised scheme prefix.
pub fn normalize_url(url: &str) -> String {
    if SCHEME_PREFIXES.iter().any(|p| url.starts_with(p)) {
        url.to_string()
    } else {
        format!("https://{}", url)
    }
}

/// One URL per line. Only the line terminator is removed, so a line is
/// analysed exactly as an argument would be; whitespace-only lines are skipped.
pub fn url_lines(reader: impl BufRead) -> std::io::Result<Vec<String>> {
    let mut urls = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if !line.trim().is_empty() {
            urls.push(line);
        }
    }
    Ok(urls)
}

/// Normalize `url`, extract and align to `schema`. Never fails.
pub fn vectorize(
    extractor: &FeatureExtractor,
    schema: &FeatureSchema,
    url: &str,
) -> (String, Extraction, FeatureVector) {
    let url = normalize_url(url);
    let extraction = extractor.extract(&url);
    let vector = assemble(extraction.mapping(), schema);
    (url, extraction, vector)
}

/// Named features for `url` without running a classifier.
pub fn explain(extractor: &FeatureExtractor, schema: &FeatureSchema, url: &str) -> Explanation {
    let (url, extraction, vector) = vectorize(extractor, schema, url);
    let degrade_reason = match &extraction {
        Extraction::Degraded { reason, .. } => Some(reason.to_string()),
        Extraction::Parsed(_) => None,
    };
    Explanation {
        url,
        degraded: extraction.is_degraded(),
        degrade_reason,
        features: schema.names().iter().cloned().zip(vector.values).collect(),
    }
}

/// Summary of a loaded detector for health/status reporting
#[derive(Debug, Clone, Serialize)]
pub struct DetectorInfo {
    pub model_kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_sha256: Option<String>,
    pub capability: Capability,
    pub features_count: usize,
    pub schema_fingerprint: String,
    pub schema_source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ModelMetadata>,
}

/// Named, schema-ordered view of what the classifier sees for a URL
#[derive(Debug, Clone, Serialize)]
pub struct Explanation {
    pub url: String,
    pub degraded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degrade_reason: Option<String>,
    pub features: Vec<(String, f32)>,
}

pub struct Detector {
    schema: Arc<FeatureSchema>,
    schema_source: SchemaSource,
    classifier: Classifier,
    extractor: FeatureExtractor,
    risk: RiskEngine,
    metadata: Option<ModelMetadata>,
}

impl Detector {
    pub fn new(schema: Arc<FeatureSchema>, classifier: Classifier, config: &DetectorConfig) -> Self {
        let schema_source = if *schema == *FeatureSchema::builtin() {
            SchemaSource::Builtin
        } else {
            SchemaSource::Custom
        };
        Self {
            schema,
            schema_source,
            classifier,
            extractor: FeatureExtractor::new(config.features.clone()),
            risk: RiskEngine::new(config.risk.clone()),
            metadata: None,
        }
    }

    /// Load schema, optional metadata and the ONNX model named by `config`.
    /// Schema and metadata problems are logged and tolerated; a model that
    /// cannot be loaded is an error.
    pub fn from_config(config: &DetectorConfig) -> Result<Self, ModelError> {
        let loaded = FeatureSchema::load(config.feature_columns_path.as_deref());
        let schema = Arc::new(loaded.schema);

        let metadata = config.metadata_path.as_deref().and_then(|path| {
            if !path.exists() {
                return None;
            }
            match ModelMetadata::load(path) {
                Ok(m) => Some(m),
                Err(e) => {
                    warn!(error = %e, "model metadata unreadable; ignored");
                    None
                }
            }
        });
        if let Some(meta) = &metadata {
            if !meta.agrees_with(&schema) {
                warn!(
                    model_type = %meta.model_type,
                    metadata_features = ?meta.n_features,
                    schema_features = schema.len(),
                    "model metadata disagrees with feature schema"
                );
            }
        }

        let classifier = OnnxClassifier::load(&config.model_path, schema.len())?.into_classifier();
        info!(
            features = schema.len(),
            fingerprint = %schema.fingerprint(),
            capability = ?classifier.capability(),
            "detector ready"
        );

        let mut detector = Self::new(schema, classifier, config);
        detector.schema_source = loaded.source;
        detector.metadata = metadata;
        Ok(detector)
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Normalized URL and its schema-aligned vector. Never fails.
    pub fn vectorize(&self, url: &str) -> (String, Extraction, FeatureVector) {
        vectorize(&self.extractor, &self.schema, url)
    }

    /// Classify one URL. Only the classifier call can fail.
    pub fn classify(&self, url: &str) -> Result<PredictionResult, InferenceFailure> {
        let (url, extraction, vector) = self.vectorize(url);
        if extraction.is_degraded() {
            debug!(url = %url, "classifying degraded feature vector");
        }
        self.decide(url, &vector)
    }

    /// Classify from caller-supplied feature values instead of extraction.
    /// `url` is only echoed (after normalization).
    pub fn classify_features(
        &self,
        url: &str,
        bag: &FeatureBag,
    ) -> Result<PredictionResult, InferenceFailure> {
        let vector = assemble_bag(bag, &self.schema);
        self.decide(normalize_url(url), &vector)
    }

    pub fn explain(&self, url: &str) -> Explanation {
        explain(&self.extractor, &self.schema, url)
    }

    pub fn info(&self) -> DetectorInfo {
        DetectorInfo {
            model_kind: self.classifier.kind().to_string(),
            model_sha256: self.classifier.fingerprint().map(str::to_string),
            capability: self.classifier.capability(),
            features_count: self.schema.len(),
            schema_fingerprint: self.schema.fingerprint(),
            schema_source: match &self.schema_source {
                SchemaSource::File(p) => p.display().to_string(),
                SchemaSource::Builtin => "builtin".to_string(),
                SchemaSource::Custom => "custom".to_string(),
            },
            metadata: self.metadata.clone(),
        }
    }

    fn decide(&self, url: String, vector: &FeatureVector) -> Result<PredictionResult, InferenceFailure> {
        let inference = self.classifier.infer(vector)?;
        let result = self.risk.evaluate(url, inference);
        if result.risk_level == RiskLevel::High {
            info!(
                url = %result.url,
                probability = result.probability,
                calibrated = inference.calibrated,
                "high risk url"
            );
        } else {
            debug!(
                url = %result.url,
                probability = result.probability,
                level = result.risk_level.as_str(),
                "url classified"
            );
        }
        Ok(result)
    }
}
