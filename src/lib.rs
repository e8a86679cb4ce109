//! phishguard — phishing URL classifier.
//!
//! Modular structure:
//! - [`features`] — URL decomposition and schema-aligned lexical features
//! - [`model`] — Capability-tagged classifiers and ONNX inference
//! - [`risk`] — Risk tier, confidence and result packaging
//! - [`detector`] — The classification context and `classify` entry point
//! - [`logging`] — Structured JSON logging

pub mod config;
pub mod detector;
pub mod features;
pub mod logging;
pub mod model;
pub mod risk;

pub use config::DetectorConfig;
pub use detector::{normalize_url, Detector};
pub use features::{FeatureExtractor, FeatureMapping, FeatureSchema, FeatureVector};
pub use model::{Classifier, InferenceFailure};
pub use risk::{PredictionResult, RiskEngine, RiskLevel};
pub use logging::StructuredLogger;
