//! Classifier inference: feature vector → (label, probability of phishing).
//!
//! Classifiers are tagged by capability. A [`Classifier::Probabilistic`]
//! model reports a per-class distribution; a [`Classifier::LabelOnly`] model
//! reports just the class, and its probability degrades to the label itself
//! (0.0 or 1.0). That loss of precision is surfaced in
//! [`Inference::calibrated`], never hidden.

mod metadata;
mod onnx;

pub use metadata::{MetadataError, ModelMetadata};
pub use onnx::OnnxClassifier;

use crate::features::FeatureVector;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Class index of the phishing label.
pub const PHISHING_CLASS: usize = 1;

/// Errors raised by a classifier backend.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("read model {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("model runtime: {0}")]
    Runtime(String),
    #[error("unexpected model output: {0}")]
    Output(String),
}

/// The classifier could not produce a verdict. Never converted into "safe".
#[derive(Debug, Error)]
pub enum InferenceFailure {
    #[error("feature vector has {actual} values, model expects {expected}")]
    ShapeMismatch { expected: usize, actual: usize },
    #[error("classifier returned label {0}, expected 0 or 1")]
    InvalidLabel(i64),
    #[error("probability distribution has {0} classes, no phishing class")]
    MissingPositiveClass(usize),
    #[error("invalid probability {0}")]
    InvalidProbability(f64),
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// A model that predicts a discrete class for one feature row.
pub trait LabelModel: Send + Sync {
    fn predict(&self, features: &[f32]) -> Result<i64, ModelError>;

    /// Number of features the model was trained on, if known.
    fn input_width(&self) -> Option<usize> {
        None
    }

    /// Short human-readable model family, e.g. `"onnx"`.
    fn kind(&self) -> &str {
        "custom"
    }

    /// Content hash of the model artifact (hex SHA-256), if it has one.
    fn fingerprint(&self) -> Option<&str> {
        None
    }
}

/// A model that also reports a per-class probability distribution.
pub trait ProbabilisticModel: LabelModel {
    fn predict_proba(&self, features: &[f32]) -> Result<Vec<f64>, ModelError>;

    /// Label and distribution together. Backends that compute both in one
    /// pass should override this.
    fn predict_with_proba(&self, features: &[f32]) -> Result<(i64, Vec<f64>), ModelError> {
        Ok((self.predict(features)?, self.predict_proba(features)?))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Probabilistic,
    LabelOnly,
}

/// A trained classifier, tagged by what it can report.
pub enum Classifier {
    Probabilistic(Box<dyn ProbabilisticModel>),
    LabelOnly(Box<dyn LabelModel>),
}

/// Normalized classifier output
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Inference {
    /// 0 = safe, 1 = phishing
    pub label: u8,
    /// Probability of the phishing class in [0, 1]
    pub probability: f64,
    /// False when the probability was derived from the label alone
    pub calibrated: bool,
}

impl Classifier {
    pub fn capability(&self) -> Capability {
        match self {
            Classifier::Probabilistic(_) => Capability::Probabilistic,
            Classifier::LabelOnly(_) => Capability::LabelOnly,
        }
    }

    pub fn kind(&self) -> &str {
        match self {
            Classifier::Probabilistic(m) => m.kind(),
            Classifier::LabelOnly(m) => m.kind(),
        }
    }

    pub fn fingerprint(&self) -> Option<&str> {
        match self {
            Classifier::Probabilistic(m) => m.fingerprint(),
            Classifier::LabelOnly(m) => m.fingerprint(),
        }
    }

    pub fn input_width(&self) -> Option<usize> {
        match self {
            Classifier::Probabilistic(m) => m.input_width(),
            Classifier::LabelOnly(m) => m.input_width(),
        }
    }

    /// Run the classifier on one vector.
    pub fn infer(&self, vector: &FeatureVector) -> Result<Inference, InferenceFailure> {
        if let Some(expected) = self.input_width() {
            if expected != vector.len() {
                return Err(InferenceFailure::ShapeMismatch {
                    expected,
                    actual: vector.len(),
                });
            }
        }

        match self {
            Classifier::Probabilistic(model) => {
                let (raw, distribution) = model.predict_with_proba(vector.as_slice())?;
                let label = check_label(raw)?;
                if let Some(bad) = distribution.iter().find(|p| !p.is_finite()) {
                    return Err(InferenceFailure::InvalidProbability(*bad));
                }
                let probability = *distribution
                    .get(PHISHING_CLASS)
                    .ok_or(InferenceFailure::MissingPositiveClass(distribution.len()))?;
                if !(0.0..=1.0).contains(&probability) {
                    return Err(InferenceFailure::InvalidProbability(probability));
                }
                Ok(Inference {
                    label,
                    probability,
                    calibrated: true,
                })
            }
            Classifier::LabelOnly(model) => {
                let label = check_label(model.predict(vector.as_slice())?)?;
                Ok(Inference {
                    label,
                    probability: f64::from(label),
                    calibrated: false,
                })
            }
        }
    }
}

fn check_label(raw: i64) -> Result<u8, InferenceFailure> {
    match raw {
        0 => Ok(0),
        1 => Ok(1),
        other => Err(InferenceFailure::InvalidLabel(other)),
    }
}
