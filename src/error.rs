//! HTTP error mapping for the API layer.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use crate::feature_extractor::FeatureError;
use crate::models::InferenceError;
use crate::repository::StoreError;
use crate::validation::ValidationErrors;

/// Every failure a handler can report
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error("missing fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("not found")]
    NotFound,

    #[error("inference failed: {0}")]
    Inference(String),

    /// Logged server-side; the client only sees a generic 500
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => ApiError::NotFound,
            StoreError::Database(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<InferenceError> for ApiError {
    fn from(err: InferenceError) -> Self {
        match err {
            InferenceError::Features(FeatureError::Missing(fields)) => {
                ApiError::MissingFields(fields)
            }
            other => ApiError::Inference(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                json!({"error": "Validation failed", "details": errors.errors()}),
            ),
            ApiError::MissingFields(fields) => (
                StatusCode::BAD_REQUEST,
                json!({"error": "Missing fields", "fields": fields}),
            ),
            ApiError::NotFound => (StatusCode::NOT_FOUND, json!({"error": "Not Found"})),
            ApiError::Inference(details) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({"error": "Inference failed", "details": details}),
            ),
            ApiError::Internal(details) => {
                error!(error = %details, "Unhandled error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({"error": "Internal Server Error"}),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
