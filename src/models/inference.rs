//! Lazily loaded single-model inference engine

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use anyhow::{anyhow, Result};
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::{debug, error, info};

use crate::feature_extractor::{FeatureError, FeatureExtractor, FeatureVector};
use crate::types::Prediction;

/// A loaded model that scores one row at a time
pub trait Regressor: Send + Sync {
    fn predict_row(&self, features: &FeatureVector) -> Result<Prediction>;
}

/// Produces the model on first use. Runs on a blocking thread.
pub trait ModelLoader: Send + Sync {
    fn load(&self) -> Result<Arc<dyn Regressor>>;

    /// Human-readable origin of the model, for logs
    fn source(&self) -> String;
}

/// Lifecycle of the cached model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelState {
    Unloaded,
    Loading,
    Loaded,
}

impl ModelState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => ModelState::Loading,
            2 => ModelState::Loaded,
            _ => ModelState::Unloaded,
        }
    }
}

/// Inference failures
#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error(transparent)]
    Features(#[from] FeatureError),

    #[error("{0}")]
    Failure(String),
}

type SharedModel = Arc<Mutex<Option<Arc<dyn Regressor>>>>;

/// Single-model inference engine.
///
/// The model is loaded on the first prediction. Concurrent first callers wait
/// on the same load; afterwards every call clones the cached `Arc`.
///
/// The load itself runs on a blocking thread under `loaded`'s lock, so a caller
/// dropped mid-load leaves that load running and the next caller picks up its
/// result instead of deserializing again.
pub struct InferenceEngine {
    loader: Arc<dyn ModelLoader>,
    model: OnceCell<Arc<dyn Regressor>>,
    loaded: SharedModel,
    state: Arc<AtomicU8>,
    feature_extractor: FeatureExtractor,
}

impl InferenceEngine {
    /// Create an engine that will load its model through `loader`
    pub fn new<L: ModelLoader + 'static>(loader: L) -> Self {
        Self {
            loader: Arc::new(loader),
            model: OnceCell::new(),
            loaded: Arc::new(Mutex::new(None)),
            state: Arc::new(AtomicU8::new(ModelState::Unloaded as u8)),
            feature_extractor: FeatureExtractor::new(),
        }
    }

    /// Current model lifecycle state
    pub fn state(&self) -> ModelState {
        ModelState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Feature extractor used to build model input
    pub fn feature_extractor(&self) -> &FeatureExtractor {
        &self.feature_extractor
    }

    /// Return the cached model, loading it if this is the first call
    pub async fn model(&self) -> Result<Arc<dyn Regressor>, InferenceError> {
        let model = self
            .model
            .get_or_try_init(|| async {
                self.state.store(ModelState::Loading as u8, Ordering::Release);
                let loader = Arc::clone(&self.loader);
                let loaded = Arc::clone(&self.loaded);
                let state = Arc::clone(&self.state);
                let source = loader.source();
                let started = Instant::now();

                info!(source = %source, "Loading model");

                let result =
                    tokio::task::spawn_blocking(move || load_once(&*loader, &loaded, &state))
                        .await
                        .map_err(|e| {
                            InferenceError::Failure(format!("model load task failed: {e}"))
                        })
                        .and_then(|r| r.map_err(|e| InferenceError::Failure(format!("{e:#}"))));

                match &result {
                    Ok(_) => info!(
                        source = %source,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Model loaded"
                    ),
                    Err(e) => error!(source = %source, error = %e, "Model load failed"),
                }

                result
            })
            .await?;

        Ok(Arc::clone(model))
    }

    /// Score a single payload.
    ///
    /// Loads the model if needed, builds the `[potassium, nitrogen, phosphorus, pH]`
    /// row, and runs it. Model errors are reported, never retried.
    pub async fn predict_one(&self, payload: &Value) -> Result<Prediction, InferenceError> {
        let model = self.model().await?;
        let features = self.feature_extractor.extract(payload)?;

        let prediction = tokio::task::spawn_blocking(move || model.predict_row(&features))
            .await
            .map_err(|e| InferenceError::Failure(format!("inference task failed: {e}")))?
            .map_err(|e| InferenceError::Failure(format!("{e:#}")))?;

        debug!(features = ?features, prediction = ?prediction, "Prediction complete");
        Ok(prediction)
    }
}

/// Load the model unless a previous, possibly abandoned, load already did.
///
/// Holds the lock for the whole load so at most one deserialization runs.
fn load_once(
    loader: &dyn ModelLoader,
    loaded: &Mutex<Option<Arc<dyn Regressor>>>,
    state: &AtomicU8,
) -> Result<Arc<dyn Regressor>> {
    let mut slot = loaded
        .lock()
        .map_err(|e| anyhow!("model load lock poisoned: {e}"))?;

    if let Some(model) = slot.as_ref() {
        state.store(ModelState::Loaded as u8, Ordering::Release);
        return Ok(Arc::clone(model));
    }

    match loader.load() {
        Ok(model) => {
            *slot = Some(Arc::clone(&model));
            state.store(ModelState::Loaded as u8, Ordering::Release);
            Ok(model)
        }
        Err(e) => {
            state.store(ModelState::Unloaded as u8, Ordering::Release);
            Err(e)
        }
    }
}
