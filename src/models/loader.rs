//! ONNX model loader

use anyhow::{Context, Result};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::{DynValue, Tensor};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::info;

use crate::config::ModelConfig;
use crate::feature_extractor::FeatureVector;
use crate::models::inference::{ModelLoader, Regressor};
use crate::types::Prediction;

/// Loaded ONNX model with metadata
pub struct OnnxModel {
    /// ONNX Runtime session (`run` needs exclusive access)
    session: Mutex<Session>,
    /// Input name for the model
    input_name: String,
    /// Output holding the point prediction
    output_name: String,
}

/// Loader for the soil model artifact
pub struct OnnxModelLoader {
    path: PathBuf,
    /// Number of threads for ONNX inference
    onnx_threads: usize,
}

impl OnnxModelLoader {
    /// Create a loader for the artifact at `path`
    pub fn new<P: Into<PathBuf>>(path: P, onnx_threads: usize) -> Self {
        Self {
            path: path.into(),
            onnx_threads: onnx_threads.max(1),
        }
    }

    /// Create a loader from the model section of the configuration
    pub fn from_config(config: &ModelConfig) -> Self {
        Self::new(config.path.clone(), config.onnx_threads)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the ONNX model from file
    pub fn load_model(&self) -> Result<OnnxModel> {
        let path = self.path.as_path();

        if !path.exists() {
            anyhow::bail!("Model artifact not found at {}", path.display());
        }

        info!(path = %path.display(), threads = self.onnx_threads, "Loading ONNX model");

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(self.onnx_threads)?
            .commit_from_file(path)
            .context(format!("Failed to load model from {:?}", path))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "float_input".to_string());

        let output_names: Vec<&str> = session.outputs.iter().map(|o| o.name.as_str()).collect();
        let output_name = choose_output(&output_names)
            .context("Model declares no outputs")?
            .to_string();

        info!(
            input = %input_name,
            output = %output_name,
            "Model loaded successfully"
        );

        Ok(OnnxModel {
            session: Mutex::new(session),
            input_name,
            output_name,
        })
    }
}

impl ModelLoader for OnnxModelLoader {
    fn load(&self) -> Result<Arc<dyn Regressor>> {
        Ok(Arc::new(self.load_model()?))
    }

    fn source(&self) -> String {
        self.path.display().to_string()
    }
}

impl Regressor for OnnxModel {
    fn predict_row(&self, features: &FeatureVector) -> Result<Prediction> {
        // Prepare input tensor - shape [1, num_features]
        let shape = vec![1_i64, features.len() as i64];
        let input_tensor = Tensor::from_array((shape, features.to_vec()))
            .context("Failed to create input tensor")?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;

        let outputs = session.run(ort::inputs![&self.input_name => input_tensor])?;

        let output = outputs
            .get(&self.output_name)
            .with_context(|| format!("Model produced no '{}' output", self.output_name))?;

        extract_prediction(output)
    }
}

/// Pick the output carrying the point prediction.
///
/// sklearn-style exports name it `label` (classifiers) or `variable`
/// (regressors); probability maps are skipped.
fn choose_output<'a>(names: &[&'a str]) -> Option<&'a str> {
    names
        .iter()
        .copied()
        .find(|n| *n == "label" || *n == "variable")
        .or_else(|| names.iter().copied().find(|n| !n.contains("prob")))
        .or_else(|| names.first().copied())
}

/// Read the first element of a tensor output as a prediction
fn extract_prediction(output: &DynValue) -> Result<Prediction> {
    if let Ok((_, data)) = output.try_extract_tensor::<f32>() {
        return first(data).map(|v| Prediction::Scalar(*v as f64));
    }
    if let Ok((_, data)) = output.try_extract_tensor::<f64>() {
        return first(data).map(|v| Prediction::Scalar(*v));
    }
    if let Ok((_, data)) = output.try_extract_tensor::<i64>() {
        return first(data).map(|v| Prediction::Scalar(*v as f64));
    }
    if let Ok((_, data)) = output.try_extract_strings() {
        return first(&data).map(|v| Prediction::from_label(v));
    }

    anyhow::bail!("Unsupported model output type: {:?}", output.dtype())
}

fn first<T>(data: &[T]) -> Result<&T> {
    data.first().context("Model returned an empty output")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_choose_output() {
        assert_eq!(choose_output(&["label", "probabilities"]), Some("label"));
        assert_eq!(choose_output(&["variable"]), Some("variable"));
        assert_eq!(choose_output(&["output_probability", "score"]), Some("score"));
        assert_eq!(choose_output(&["probabilities"]), Some("probabilities"));
        assert_eq!(choose_output(&[]), None);
    }

    #[test]
    fn test_missing_artifact() {
        let loader = OnnxModelLoader::new("artifacts/does-not-exist.onnx", 1);

        let err = loader.load_model().err().unwrap();
        assert!(err.to_string().contains("does-not-exist.onnx"));
        assert_eq!(loader.source(), "artifacts/does-not-exist.onnx");
    }
}
