//! Soil Sample Service - Main Entry Point
//!
//! Serves CRUD endpoints for soil samples over SQLite and, when enabled, a
//! prediction endpoint backed by an ONNX model loaded on first use.

use anyhow::{Context, Result};
use soil_samples::{
    config::{AppConfig, ModelConfig},
    db, logging,
    repository::SoilSampleRepository,
    server,
    state::AppState,
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = AppConfig::load()?;

    // Initialize logging
    logging::init(&config.logging)?;

    info!("Starting Soil Sample Service");
    info!(
        addr = %config.server.addr,
        database = %config.database.url,
        model_enabled = config.model.enabled,
        "Configuration loaded"
    );

    // Connect to the database
    let pool = db::create_pool(&config.database)
        .await
        .context("Failed to connect to database")?;
    db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;

    let samples = SoilSampleRepository::new(pool);
    info!(count = samples.count().await?, "Soil sample store ready");

    let state = attach_inference(AppState::new(samples), &config.model);

    server::serve(&config.server.addr, state).await
}

#[cfg(feature = "inference")]
fn attach_inference(state: AppState, config: &ModelConfig) -> AppState {
    use soil_samples::models::{InferenceEngine, OnnxModelLoader};

    if !config.enabled {
        info!("Prediction endpoint disabled by configuration");
        return state;
    }

    let loader = OnnxModelLoader::from_config(config);
    info!(
        path = %loader.path().display(),
        "Prediction endpoint enabled, model loads on first request"
    );
    state.with_inference(InferenceEngine::new(loader))
}

#[cfg(not(feature = "inference"))]
fn attach_inference(state: AppState, config: &ModelConfig) -> AppState {
    if config.enabled {
        tracing::warn!("Built without the `inference` feature, prediction endpoint disabled");
    }
    state
}
