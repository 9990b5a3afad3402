//! In-memory run registry.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::dialog::{DialogRun, RunHandle};
use crate::domain::foundation::RunId;
use crate::ports::{RegistryError, RunRegistry};

/// Keyed in-memory store of run handles.
///
/// A single coarse lock serializes create/get/cancel/cleanup, which is the
/// concurrency contract the registry must provide at this scale.
#[derive(Default)]
pub struct InMemoryRunRegistry {
    runs: RwLock<HashMap<RunId, Arc<RunHandle>>>,
}

impl InMemoryRunRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of runs currently held.
    pub async fn len(&self) -> usize {
        self.runs.read().await.len()
    }

    /// True when no runs are held.
    pub async fn is_empty(&self) -> bool {
        self.runs.read().await.is_empty()
    }
}

#[async_trait]
impl RunRegistry for InMemoryRunRegistry {
    async fn create(&self, run: DialogRun) -> Arc<RunHandle> {
        let run_id = run.run_id;
        let handle = RunHandle::new(run);
        self.runs.write().await.insert(run_id, handle.clone());
        debug!(%run_id, "run registered");
        handle
    }

    async fn get(&self, run_id: RunId) -> Result<Arc<RunHandle>, RegistryError> {
        self.runs
            .read()
            .await
            .get(&run_id)
            .cloned()
            .ok_or(RegistryError::NotFound(run_id))
    }

    async fn cancel(&self, run_id: RunId) -> Result<(), RegistryError> {
        let handle = self.get(run_id).await?;
        handle.with_run_mut(|run| {
            run.request_cancel();
        });
        Ok(())
    }

    async fn cleanup(&self, max_age: Duration) -> usize {
        let mut runs = self.runs.write().await;
        let before = runs.len();
        runs.retain(|_, handle| {
            // A run with an active stream consumer is never removed, even
            // when terminal or stale.
            if handle.stream_active() {
                return true;
            }
            let expired = handle.age_seconds() >= max_age.as_secs() as i64;
            let terminal = handle.state().is_terminal();
            !(terminal || expired)
        });
        let removed = before - runs.len();
        if removed > 0 {
            debug!(removed, "registry cleanup");
        }
        removed
    }
}
