//! Soil sample and prediction handlers.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::info;

use crate::error::ApiError;
use crate::state::AppState;
use crate::types::{Prediction, SoilSample};
use crate::validation::{parse_body, validate_create, validate_update};

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub prediction: Prediction,
}

/// Path ids are non-negative integers; anything else does not match a sample.
fn parse_id(raw: &str) -> Result<i64, ApiError> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ApiError::NotFound);
    }
    raw.parse().map_err(|_| ApiError::NotFound)
}

pub async fn list_samples(
    State(state): State<AppState>,
) -> Result<Json<Vec<SoilSample>>, ApiError> {
    Ok(Json(state.samples.list().await?))
}

pub async fn create_sample(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<SoilSample>), ApiError> {
    let input = validate_create(&parse_body(&body))?;
    let sample = state.samples.create(input).await?;

    info!(id = sample.id, "Soil sample created");
    Ok((StatusCode::CREATED, Json(sample)))
}

pub async fn get_sample(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SoilSample>, ApiError> {
    let id = parse_id(&id)?;
    Ok(Json(state.samples.get_by_id(id).await?))
}

pub async fn update_sample(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<SoilSample>, ApiError> {
    let id = parse_id(&id)?;
    let patch = validate_update(&parse_body(&body))?;
    let sample = state.samples.update(id, patch).await?;

    info!(id, "Soil sample updated");
    Ok(Json(sample))
}

pub async fn delete_sample(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    state.samples.delete_by_id(id).await?;

    info!(id, "Soil sample deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn predict(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<PredictResponse>, ApiError> {
    let engine = state.inference.as_ref().ok_or(ApiError::NotFound)?;
    let payload = parse_body(&body);

    let missing = engine.feature_extractor().missing(&payload);
    if !missing.is_empty() {
        return Err(ApiError::MissingFields(missing));
    }

    let prediction = engine.predict_one(&payload).await?;
    Ok(Json(PredictResponse { prediction }))
}

/// Fallback for unknown routes
pub async fn not_found() -> ApiError {
    ApiError::NotFound
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("42").unwrap(), 42);
        assert!(matches!(parse_id("-1"), Err(ApiError::NotFound)));
        assert!(matches!(parse_id("+1"), Err(ApiError::NotFound)));
        assert!(matches!(parse_id("abc"), Err(ApiError::NotFound)));
        assert!(matches!(parse_id(""), Err(ApiError::NotFound)));
        assert!(matches!(parse_id("99999999999999999999"), Err(ApiError::NotFound)));
    }
}
