//! ML model inference components

pub mod inference;
#[cfg(feature = "inference")]
pub mod loader;

pub use inference::{InferenceEngine, InferenceError, ModelLoader, ModelState, Regressor};
#[cfg(feature = "inference")]
pub use loader::OnnxModelLoader;
