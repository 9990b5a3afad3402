//! HTTP adapter for guideline management.

pub mod handlers;
pub mod routes;

pub use routes::guidelines_router;
