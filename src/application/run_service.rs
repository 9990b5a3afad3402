//! Run lifecycle service.
//!
//! Coordinates the registry, guideline store, facts provider, and
//! responders: creates runs, hands out their frame streams, and serves
//! status/cancel/cleanup. The transport layer is a thin shell over this
//! service.

use futures::Stream;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::domain::dialog::{
    DialogOrchestrator, DialogRun, DialogState, RunHandle, RunOptions, StreamFrame,
};
use crate::domain::foundation::RunId;
use crate::domain::guidelines::{GuidelineError, Guidelines};
use crate::domain::subject::Facts;
use crate::ports::{
    FactsError, FactsProvider, GuidelineStore, RegistryError, ResponderSet, RunRegistry,
};

/// Guideline version used when a start request names none.
const DEFAULT_GUIDELINES_VERSION: &str = "default";

/// Request to start a run.
#[derive(Debug, Clone)]
pub struct StartRunCommand {
    /// Scenario label, e.g. `screening-eligibility`.
    pub scenario: String,
    /// Explicit facts for the subject under review; wins over `subject_id`.
    pub facts: Option<Facts>,
    /// External subject identifier to resolve through the facts provider.
    pub subject_id: Option<String>,
    /// Explicit guidelines; when absent the stored default version applies.
    pub guidelines: Option<Guidelines>,
    /// Run options; defaults apply when absent.
    pub options: Option<RunOptions>,
}

impl StartRunCommand {
    /// A command with inline facts and defaults everywhere else.
    pub fn with_facts(scenario: impl Into<String>, facts: Facts) -> Self {
        Self {
            scenario: scenario.into(),
            facts: Some(facts),
            subject_id: None,
            guidelines: None,
            options: None,
        }
    }
}

/// Run lifecycle failures.
#[derive(Debug, Clone, Error)]
pub enum RunServiceError {
    #[error("no such run: {0}")]
    NotFound(RunId),

    #[error("stream already consumed for run {0}")]
    StreamConsumed(RunId),

    #[error("no facts provider is configured; supply facts inline")]
    NoFactsProvider,

    #[error(transparent)]
    Facts(#[from] FactsError),

    #[error(transparent)]
    Guidelines(#[from] GuidelineError),
}

impl From<RegistryError> for RunServiceError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound(run_id) => RunServiceError::NotFound(run_id),
        }
    }
}

/// Releases a run's stream flag when the consumer is done (or gone).
struct StreamGuard {
    handle: Arc<RunHandle>,
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        self.handle.release_stream();
    }
}

/// Use-case service for the run lifecycle API.
pub struct RunService {
    registry: Arc<dyn RunRegistry>,
    guideline_store: Arc<dyn GuidelineStore>,
    facts_provider: Option<Arc<dyn FactsProvider>>,
    /// Responders used for live runs.
    live: ResponderSet,
    /// Responders used when a run asks for `dry_run`.
    dry_run: ResponderSet,
}

impl RunService {
    pub fn new(
        registry: Arc<dyn RunRegistry>,
        guideline_store: Arc<dyn GuidelineStore>,
        facts_provider: Option<Arc<dyn FactsProvider>>,
        live: ResponderSet,
        dry_run: ResponderSet,
    ) -> Self {
        Self {
            registry,
            guideline_store,
            facts_provider,
            live,
            dry_run,
        }
    }

    /// Creates a run and returns its id.
    pub async fn start(&self, command: StartRunCommand) -> Result<RunId, RunServiceError> {
        let facts = self
            .resolve_facts(command.facts, command.subject_id)
            .await?;
        let guidelines = match command.guidelines {
            Some(guidelines) => {
                guidelines.validate()?;
                guidelines
            }
            None => self.guideline_store.get(DEFAULT_GUIDELINES_VERSION).await?,
        };
        let options = command.options.unwrap_or_default();

        let run = DialogRun::new(command.scenario, facts, guidelines, options);
        let run_id = run.run_id;
        self.registry.create(run).await;
        info!(%run_id, dry_run = options.dry_run, "run created");
        Ok(run_id)
    }

    /// Inline facts win; a subject id is resolved through the provider.
    async fn resolve_facts(
        &self,
        facts: Option<Facts>,
        subject_id: Option<String>,
    ) -> Result<Facts, RunServiceError> {
        match (facts, subject_id) {
            (Some(facts), _) => Ok(facts),
            (None, Some(subject_id)) => match &self.facts_provider {
                Some(provider) => Ok(provider.fetch(&subject_id).await?),
                None => Err(RunServiceError::NoFactsProvider),
            },
            // The guideline engine classifies missing facts itself.
            (None, None) => Ok(Facts::empty()),
        }
    }

    /// Claims the run's frame stream.
    ///
    /// The stream is lazy: the dialog advances only as frames are pulled,
    /// and it ends after exactly one terminal frame. Each run's stream can
    /// be taken once.
    pub async fn stream(
        &self,
        run_id: RunId,
    ) -> Result<impl Stream<Item = StreamFrame> + Send + 'static, RunServiceError> {
        let handle = self.registry.get(run_id).await?;
        if !handle.claim_stream() {
            return Err(RunServiceError::StreamConsumed(run_id));
        }

        let dry_run = handle.with_run(|run| run.options.dry_run);
        let responders = if dry_run {
            self.dry_run.clone()
        } else {
            self.live.clone()
        };

        let orchestrator = DialogOrchestrator::new(handle.clone(), responders);
        let guard = StreamGuard { handle };
        Ok(futures::stream::unfold(
            (orchestrator, guard),
            |(mut orchestrator, guard)| async move {
                orchestrator
                    .next_frame()
                    .await
                    .map(|frame| (frame, (orchestrator, guard)))
            },
        ))
    }

    /// Returns a snapshot of the run (repeatable read).
    pub async fn status(&self, run_id: RunId) -> Result<DialogRun, RunServiceError> {
        Ok(self.registry.get(run_id).await?.snapshot())
    }

    /// Requests cooperative cancellation; returns the state afterwards.
    pub async fn cancel(&self, run_id: RunId) -> Result<DialogState, RunServiceError> {
        self.registry.cancel(run_id).await?;
        Ok(self.registry.get(run_id).await?.state())
    }

    /// Removes terminal and stale runs; returns how many were removed.
    pub async fn cleanup(&self, max_age: Duration) -> usize {
        self.registry.cleanup(max_age).await
    }
}
