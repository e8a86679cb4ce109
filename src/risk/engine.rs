//! Maps phishing probability to a risk tier and confidence; packages the verdict.

use crate::config::RiskConfig;
use crate::model::Inference;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Lower bounds are inclusive: exactly `medium_threshold` is Medium,
    /// exactly `high_threshold` is High.
    pub fn from_probability(probability: f64, config: &RiskConfig) -> Self {
        if probability >= config.high_threshold {
            RiskLevel::High
        } else if probability >= config.medium_threshold {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        }
    }
}

/// Distance of `probability` from 0.5, rescaled to 0–100 and rounded to
/// two decimals. 0 means the model is undecided, 100 means it is certain
/// either way. This is not a calibrated statistical confidence interval.
pub fn confidence(probability: f64) -> f64 {
    round_to((probability - 0.5).abs() * 200.0, 2).clamp(0.0, 100.0)
}

/// Exact ties go to the even neighbour (0.03125 → 0.0312 at 4 places).
fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round_ties_even() / scale
}

/// Final verdict for one URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// The analysed URL, after scheme normalization
    pub url: String,
    pub is_phishing: bool,
    /// 0 = safe, 1 = phishing
    pub prediction: u8,
    /// 0–100, see [`confidence`]
    pub confidence: f64,
    /// Probability of phishing, 4 decimals
    pub probability: f64,
    pub risk_level: RiskLevel,
    /// ISO-8601 UTC with `Z` suffix
    pub timestamp: String,
}

impl PredictionResult {
    /// Package an inference for `url`, timestamped now.
    pub fn new(url: String, inference: Inference, config: &RiskConfig) -> Self {
        Self {
            url,
            is_phishing: inference.label == 1,
            prediction: inference.label,
            confidence: confidence(inference.probability),
            probability: round_to(inference.probability, 4),
            risk_level: RiskLevel::from_probability(inference.probability, config),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        }
    }
}

pub struct RiskEngine {
    config: RiskConfig,
}

impl RiskEngine {
    pub fn new(config: RiskConfig) -> Self {
        Self { config }
    }

    pub fn evaluate(&self, url: String, inference: Inference) -> PredictionResult {
        PredictionResult::new(url, inference, &self.config)
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }
}
