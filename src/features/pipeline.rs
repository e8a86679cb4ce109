//! Schema alignment: feature mapping (or a loose feature bag) → schema-ordered vector.

use super::{Feature, FeatureMapping, FeatureSchema, FeatureVector};
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

/// Caller-supplied feature values, keyed by schema name. Values may be any
/// JSON type; see [`assemble_bag`] for coercion.
pub type FeatureBag = HashMap<String, Value>;

/// Align `mapping` to `schema`. Names the extractor does not produce resolve
/// to 0. Never fails; output length always equals `schema.len()`.
pub fn assemble(mapping: &FeatureMapping, schema: &FeatureSchema) -> FeatureVector {
    let values = schema
        .names()
        .iter()
        .map(|name| match Feature::from_name(name) {
            Some(feature) => mapping.get(feature),
            None => {
                debug!(feature = %name, "schema feature not extracted; filled with 0");
                0.0
            }
        })
        .collect();
    FeatureVector { values }
}

/// Align a loose bag to `schema`. Missing names and extra keys are handled
/// like [`assemble`]. Numbers pass through, booleans become 0/1, numeric
/// strings are parsed; anything else (or a non-finite number) is 0.
pub fn assemble_bag(bag: &FeatureBag, schema: &FeatureSchema) -> FeatureVector {
    let values = schema
        .names()
        .iter()
        .map(|name| bag.get(name).map(coerce).unwrap_or(0.0))
        .collect();
    FeatureVector { values }
}

fn coerce(value: &Value) -> f32 {
    let v = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        Value::Null | Value::Array(_) | Value::Object(_) => 0.0,
    };
    let v = v as f32;
    if v.is_finite() {
        v
    } else {
        0.0
    }
}
