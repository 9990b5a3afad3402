//! Handlers for guideline management endpoints.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use crate::adapters::http::{ApiError, AppState};
use crate::domain::guidelines::Guidelines;

/// Acknowledgement for a guideline replacement.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PutGuidelinesResponse {
    pub version: String,
}

/// `GET /api/guidelines/{version}` - fetch a stored configuration.
pub async fn get_guidelines(
    State(state): State<AppState>,
    Path(version): Path<String>,
) -> Result<Json<Guidelines>, ApiError> {
    Ok(Json(state.guideline_store.get(&version).await?))
}

/// `PUT /api/guidelines/{version}` - validate and atomically replace.
///
/// A failed validation answers 422 with the violated constraint and leaves
/// the stored configuration untouched.
pub async fn put_guidelines(
    State(state): State<AppState>,
    Path(version): Path<String>,
    Json(guidelines): Json<Guidelines>,
) -> Result<Json<PutGuidelinesResponse>, ApiError> {
    state.guideline_store.put(&version, guidelines).await?;
    Ok(Json(PutGuidelinesResponse { version }))
}
