//! Handlers for run endpoints.

use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use futures::{Stream, StreamExt};
use std::time::Duration;

use super::dto::{
    CancelRunResponse, CleanupRequest, CleanupResponse, StartRunRequest, StartRunResponse,
};
use crate::adapters::http::{ApiError, AppState};
use crate::application::StartRunCommand;
use crate::domain::dialog::DialogRun;
use crate::domain::foundation::RunId;

/// `POST /api/runs` - create a run.
pub async fn start_run(
    State(state): State<AppState>,
    Json(body): Json<StartRunRequest>,
) -> Result<Json<StartRunResponse>, ApiError> {
    let run_id = state
        .run_service
        .start(StartRunCommand {
            scenario: body.scenario,
            facts: body.facts,
            subject_id: body.subject_id,
            guidelines: body.guidelines,
            options: body.options,
        })
        .await?;
    Ok(Json(StartRunResponse { run_id }))
}

/// `GET /api/runs/{id}/stream` - SSE progress frames.
///
/// The frame stream is finite and non-restartable; a second request for the
/// same run answers 409.
pub async fn stream_run(
    State(state): State<AppState>,
    Path(run_id): Path<RunId>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, ApiError> {
    let frames = state.run_service.stream(run_id).await?;
    let events = frames.map(|frame| Event::default().json_data(&frame));
    Ok(Sse::new(events).keep_alive(KeepAlive::new().interval(Duration::from_secs(15))))
}

/// `GET /api/runs/{id}` - full run snapshot (repeatable read).
pub async fn run_status(
    State(state): State<AppState>,
    Path(run_id): Path<RunId>,
) -> Result<Json<DialogRun>, ApiError> {
    Ok(Json(state.run_service.status(run_id).await?))
}

/// `POST /api/runs/{id}/cancel` - cooperative cancellation.
pub async fn cancel_run(
    State(state): State<AppState>,
    Path(run_id): Path<RunId>,
) -> Result<Json<CancelRunResponse>, ApiError> {
    let state_after = state.run_service.cancel(run_id).await?;
    Ok(Json(CancelRunResponse {
        run_id,
        state: state_after,
    }))
}

/// `POST /api/runs/cleanup` - remove terminal and stale runs.
pub async fn cleanup_runs(
    State(state): State<AppState>,
    Json(body): Json<CleanupRequest>,
) -> Json<CleanupResponse> {
    let removed = state
        .run_service
        .cleanup(Duration::from_secs(body.max_age_secs))
        .await;
    Json(CleanupResponse { removed })
}
