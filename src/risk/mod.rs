//! Risk tiering and result packaging.

mod engine;

pub use engine::{confidence, PredictionResult, RiskEngine, RiskLevel};
