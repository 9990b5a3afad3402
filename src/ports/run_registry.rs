//! RunRegistry port - the injectable store of in-flight and completed runs.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::dialog::{DialogRun, RunHandle};
use crate::domain::foundation::RunId;

/// Registry failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RegistryError {
    #[error("no such run: {0}")]
    NotFound(RunId),
}

/// Keyed store of dialog runs.
///
/// The registry is the only shared mutable structure in the system;
/// implementations must serialize create/get/cancel/cleanup against each
/// other so that no run is read mid-removal.
#[async_trait]
pub trait RunRegistry: Send + Sync {
    /// Stores a new run and returns its shared handle.
    async fn create(&self, run: DialogRun) -> Arc<RunHandle>;

    /// Looks up a run by id.
    async fn get(&self, run_id: RunId) -> Result<Arc<RunHandle>, RegistryError>;

    /// Requests cooperative cancellation of a run.
    async fn cancel(&self, run_id: RunId) -> Result<(), RegistryError>;

    /// Removes terminal runs and runs older than `max_age`.
    ///
    /// Never removes a run whose stream is currently being consumed.
    /// Returns the number of runs removed.
    async fn cleanup(&self, max_age: Duration) -> usize;
}
