//! Application layer - use-case services over the domain and ports.

mod run_service;

pub use run_service::{RunService, RunServiceError, StartRunCommand};
