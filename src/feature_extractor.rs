//! Feature extraction for soil model inference.
//!
//! The model was trained on four named columns. This module pulls them out of a
//! request payload in the exact order the model expects.

use serde_json::Value;

/// Model input columns, in training order
pub const FEATURE_COLUMNS: [&str; 4] = ["potassium", "nitrogen", "phosphorus", "pH"];

/// Single-row model input
pub type FeatureVector = [f32; 4];

/// Why a payload could not be turned into a feature vector
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FeatureError {
    #[error("missing features: {}", .0.join(", "))]
    Missing(Vec<&'static str>),

    #[error("could not convert feature '{0}' to a number")]
    NotNumeric(&'static str),
}

/// Feature extractor that transforms prediction payloads into model input features.
pub struct FeatureExtractor;

impl FeatureExtractor {
    /// Create a new feature extractor.
    pub fn new() -> Self {
        Self
    }

    /// Feature names absent from the payload, in column order.
    ///
    /// Only presence matters here: a key holding `null` counts as present.
    pub fn missing(&self, payload: &Value) -> Vec<&'static str> {
        let object = payload.as_object();
        FEATURE_COLUMNS
            .iter()
            .copied()
            .filter(|name| object.map_or(true, |o| !o.contains_key(*name)))
            .collect()
    }

    /// Extract the feature vector from a payload.
    pub fn extract(&self, payload: &Value) -> Result<FeatureVector, FeatureError> {
        let missing = self.missing(payload);
        if !missing.is_empty() {
            return Err(FeatureError::Missing(missing));
        }

        let mut features = [0.0_f32; 4];
        for (slot, name) in features.iter_mut().zip(FEATURE_COLUMNS) {
            *slot = match &payload[name] {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            }
            .ok_or(FeatureError::NotNumeric(name))? as f32;
        }

        Ok(features)
    }

    /// Get the number of features produced.
    pub fn feature_count(&self) -> usize {
        FEATURE_COLUMNS.len()
    }

    /// Get feature names (matching training order).
    pub fn feature_names(&self) -> &'static [&'static str] {
        &FEATURE_COLUMNS
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}
