//! Soil Sample Service Library
//!
//! CRUD storage for soil measurements (potassium, nitrogen, phosphorus, pH)
//! and a single-row prediction endpoint over a pre-trained model.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod feature_extractor;
pub mod health;
pub mod logging;
pub mod models;
pub mod repository;
pub mod server;
pub mod state;
pub mod types;
pub mod validation;

pub use config::AppConfig;
pub use error::ApiError;
pub use feature_extractor::FeatureExtractor;
pub use models::inference::InferenceEngine;
pub use repository::{SoilSampleRepository, StoreError};
pub use state::AppState;
pub use types::{NewSoilSample, Prediction, SoilSample, SoilSamplePatch};
