//! Shared application state.

use std::sync::Arc;

use crate::models::InferenceEngine;
use crate::repository::SoilSampleRepository;

/// Shared state for the HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// Soil sample persistence
    pub samples: SoilSampleRepository,
    /// Prediction engine; `None` leaves the prediction route unmounted
    pub inference: Option<Arc<InferenceEngine>>,
}

impl AppState {
    /// Create state without a prediction engine.
    pub fn new(samples: SoilSampleRepository) -> Self {
        Self {
            samples,
            inference: None,
        }
    }

    /// Attach a prediction engine. The model itself loads on first use.
    pub fn with_inference(mut self, engine: InferenceEngine) -> Self {
        self.inference = Some(Arc::new(engine));
        self
    }

    /// Check if the prediction endpoint is available.
    pub fn has_inference(&self) -> bool {
        self.inference.is_some()
    }
}
