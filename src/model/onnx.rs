//! ONNX Runtime host for scikit-learn classifiers exported with `zipmap` disabled.
//! Input: [1, n_features] f32. Output 0: int64 label; output 1 (optional):
//! [1, n_classes] f32 probabilities.

use super::{Classifier, LabelModel, ModelError, ProbabilisticModel};
use ndarray::Array2;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

pub struct OnnxClassifier {
    session: Mutex<Session>,
    label_output: String,
    proba_output: Option<String>,
    input_width: usize,
    sha256: String,
}

fn runtime(e: impl std::fmt::Display) -> ModelError {
    ModelError::Runtime(e.to_string())
}

impl OnnxClassifier {
    /// Load model from path. A missing file is an error: a classifier that
    /// cannot run must not report anything.
    pub fn load(path: &Path, input_width: usize) -> Result<Self, ModelError> {
        if !path.exists() {
            return Err(ModelError::NotFound(path.to_path_buf()));
        }
        let bytes = std::fs::read(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let sha256 = format!("{:x}", Sha256::digest(&bytes));

        let session = Session::builder()
            .map_err(runtime)?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(runtime)?
            .commit_from_memory(&bytes)
            .map_err(runtime)?;

        let mut outputs = session.outputs.iter().map(|o| o.name.clone());
        let label_output = outputs
            .next()
            .ok_or_else(|| ModelError::Output("model declares no outputs".to_string()))?;
        let proba_output = outputs.next();

        info!(
            path = %path.display(),
            sha256 = %sha256,
            input_width,
            probabilistic = proba_output.is_some(),
            "ONNX classifier loaded"
        );

        Ok(Self {
            session: Mutex::new(session),
            label_output,
            proba_output,
            input_width,
            sha256,
        })
    }

    /// Tag by capability: a second output means probabilities are available.
    pub fn into_classifier(self) -> Classifier {
        if self.proba_output.is_some() {
            Classifier::Probabilistic(Box::new(self))
        } else {
            Classifier::LabelOnly(Box::new(self))
        }
    }

    fn run(&self, features: &[f32]) -> Result<(i64, Option<Vec<f64>>), ModelError> {
        let arr = Array2::from_shape_vec((1, features.len()), features.to_vec()).map_err(runtime)?;
        let input = Tensor::from_array(arr).map_err(runtime)?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| ModelError::Runtime("session lock poisoned".to_string()))?;
        let outputs = session.run(ort::inputs![input]).map_err(runtime)?;

        let label_value = outputs
            .get(&self.label_output)
            .ok_or_else(|| ModelError::Output(format!("missing output {}", self.label_output)))?;
        let (_, labels) = label_value
            .try_extract_tensor::<i64>()
            .map_err(|e| ModelError::Output(format!("label tensor: {}", e)))?;
        let label = labels
            .first()
            .copied()
            .ok_or_else(|| ModelError::Output("empty label tensor".to_string()))?;

        let distribution = match &self.proba_output {
            Some(name) => {
                let value = outputs
                    .get(name)
                    .ok_or_else(|| ModelError::Output(format!("missing output {}", name)))?;
                let (_, probs) = value
                    .try_extract_tensor::<f32>()
                    .map_err(|e| ModelError::Output(format!("probability tensor: {}", e)))?;
                Some(probs.iter().map(|p| f64::from(*p)).collect())
            }
            None => None,
        };

        Ok((label, distribution))
    }
}

impl LabelModel for OnnxClassifier {
    fn predict(&self, features: &[f32]) -> Result<i64, ModelError> {
        self.run(features).map(|(label, _)| label)
    }

    fn input_width(&self) -> Option<usize> {
        Some(self.input_width)
    }

    fn kind(&self) -> &str {
        "onnx"
    }

    fn fingerprint(&self) -> Option<&str> {
        Some(&self.sha256)
    }
}

impl ProbabilisticModel for OnnxClassifier {
    fn predict_proba(&self, features: &[f32]) -> Result<Vec<f64>, ModelError> {
        self.predict_with_proba(features).map(|(_, p)| p)
    }

    fn predict_with_proba(&self, features: &[f32]) -> Result<(i64, Vec<f64>), ModelError> {
        let (label, distribution) = self.run(features)?;
        let distribution = distribution
            .ok_or_else(|| ModelError::Output("model has no probability output".to_string()))?;
        Ok((label, distribution))
    }
}
