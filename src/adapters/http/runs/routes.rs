//! Axum router configuration for run endpoints.

use axum::routing::{get, post};
use axum::Router;

use super::handlers::{cancel_run, cleanup_runs, run_status, start_run, stream_run};
use crate::adapters::http::AppState;

/// Create the runs API router.
///
/// # Routes
///
/// - `POST /` - start a run
/// - `POST /cleanup` - remove terminal/stale runs
/// - `GET  /:run_id` - run snapshot
/// - `GET  /:run_id/stream` - SSE progress frames
/// - `POST /:run_id/cancel` - cooperative cancellation
///
/// Suitable for mounting at `/api/runs`.
pub fn runs_router() -> Router<AppState> {
    Router::new()
        .route("/", post(start_run))
        .route("/cleanup", post(cleanup_runs))
        .route("/:run_id", get(run_status))
        .route("/:run_id/stream", get(stream_run))
        .route("/:run_id/cancel", post(cancel_run))
}
