//! Axum router configuration for guideline endpoints.

use axum::routing::get;
use axum::Router;

use super::handlers::{get_guidelines, put_guidelines};
use crate::adapters::http::AppState;

/// Create the guidelines API router.
///
/// # Routes
///
/// - `GET /:version` - fetch a stored configuration
/// - `PUT /:version` - validate and atomically replace
///
/// Suitable for mounting at `/api/guidelines`.
pub fn guidelines_router() -> Router<AppState> {
    Router::new().route("/:version", get(get_guidelines).put(put_guidelines))
}
