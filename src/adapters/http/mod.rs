//! HTTP adapter - REST API over the run lifecycle and guideline management.
//!
//! - `POST /api/runs`              - start a run
//! - `GET  /api/runs/{id}/stream`  - SSE progress frames
//! - `GET  /api/runs/{id}`         - run snapshot
//! - `POST /api/runs/{id}/cancel`  - cooperative cancellation
//! - `POST /api/runs/cleanup`      - remove terminal/stale runs
//! - `GET  /api/guidelines/{version}` / `PUT` - guideline management
//! - `GET  /health`                - liveness

mod error;
mod guidelines;
mod runs;

pub use error::ApiError;
pub use guidelines::guidelines_router;
pub use runs::runs_router;

use axum::routing::get;
use axum::{Json, Router};
use std::sync::Arc;

use crate::application::RunService;
use crate::ports::GuidelineStore;

/// Shared state for all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub run_service: Arc<RunService>,
    pub guideline_store: Arc<dyn GuidelineStore>,
}

/// Assembles the complete API router.
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/runs", runs_router())
        .nest("/api/guidelines", guidelines_router())
        .route("/health", get(health))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
