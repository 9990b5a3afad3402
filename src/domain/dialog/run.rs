//! Dialog runs and the shared handle the registry hands out.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use super::state::DialogState;
use super::turn::DialogTurn;
use crate::domain::arbitration::Outcome;
use crate::domain::foundation::{RunId, Timestamp};
use crate::domain::guidelines::Guidelines;
use crate::domain::subject::Facts;

/// Caller-tunable knobs for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RunOptions {
    /// Turn cap; the run is forced to complete when it is reached.
    pub max_turns: u32,
    /// Per-responder-call timeout in milliseconds.
    pub per_turn_timeout_ms: u64,
    /// Use scripted responders instead of live ones.
    pub dry_run: bool,
}

impl RunOptions {
    /// Per-responder-call timeout as a Duration.
    pub fn per_turn_timeout(&self) -> Duration {
        Duration::from_millis(self.per_turn_timeout_ms)
    }
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            max_turns: 8,
            per_turn_timeout_ms: 8_000,
            dry_run: false,
        }
    }
}

/// One complete execution of the turn-based dialog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogRun {
    pub run_id: RunId,
    /// Scenario label (e.g. `screening-eligibility`), used in personas.
    pub scenario: String,
    /// Guidelines snapshot taken at creation.
    pub guidelines: Guidelines,
    /// Immutable facts supplied at creation.
    pub facts: Facts,
    /// Turn history in order.
    pub turns: Vec<DialogTurn>,
    pub state: DialogState,
    pub options: RunOptions,
    pub started_at: Timestamp,
    /// The arbitrated outcome, attached on completion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_outcome: Option<Outcome>,
}

impl DialogRun {
    /// Creates a run in the `Starting` state.
    pub fn new(
        scenario: impl Into<String>,
        facts: Facts,
        guidelines: Guidelines,
        options: RunOptions,
    ) -> Self {
        Self {
            run_id: RunId::new(),
            scenario: scenario.into(),
            guidelines,
            facts,
            turns: Vec::new(),
            state: DialogState::Starting,
            options,
            started_at: Timestamp::now(),
            final_outcome: None,
        }
    }

    /// Seconds since the run was created.
    pub fn age_seconds(&self) -> i64 {
        self.started_at.elapsed_seconds()
    }

    /// True once the run can no longer advance.
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Requests cooperative cancellation.
    ///
    /// Takes effect at the next turn boundary; an in-flight responder call is
    /// allowed to finish or time out first. Returns false if the run was
    /// already terminal.
    pub fn request_cancel(&mut self) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.state = DialogState::Cancelled;
        true
    }
}

/// Shared handle to a run.
///
/// The registry and the orchestrator both hold the same handle; all access
/// goes through short critical sections that never span an await point.
#[derive(Debug)]
pub struct RunHandle {
    run: Mutex<DialogRun>,
    /// Set once when the stream is first claimed; streams never restart.
    stream_claimed: AtomicBool,
    /// True while a consumer is reading the stream.
    stream_active: AtomicBool,
}

impl RunHandle {
    pub fn new(run: DialogRun) -> Arc<Self> {
        Arc::new(Self {
            run: Mutex::new(run),
            stream_claimed: AtomicBool::new(false),
            stream_active: AtomicBool::new(false),
        })
    }

    /// Runs `f` with shared access to the run.
    pub fn with_run<R>(&self, f: impl FnOnce(&DialogRun) -> R) -> R {
        let guard = self.run.lock().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    /// Runs `f` with exclusive access to the run.
    pub fn with_run_mut<R>(&self, f: impl FnOnce(&mut DialogRun) -> R) -> R {
        let mut guard = self.run.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    /// Copies the run for a repeatable read.
    pub fn snapshot(&self) -> DialogRun {
        self.with_run(DialogRun::clone)
    }

    pub fn run_id(&self) -> RunId {
        self.with_run(|run| run.run_id)
    }

    pub fn state(&self) -> DialogState {
        self.with_run(|run| run.state)
    }

    pub fn age_seconds(&self) -> i64 {
        self.with_run(DialogRun::age_seconds)
    }

    /// Claims the run's frame stream.
    ///
    /// Succeeds at most once per run; the stream is finite and
    /// non-restartable.
    pub fn claim_stream(&self) -> bool {
        let claimed = self
            .stream_claimed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if claimed {
            self.stream_active.store(true, Ordering::Release);
        }
        claimed
    }

    /// Marks stream consumption finished (or abandoned).
    pub fn release_stream(&self) {
        self.stream_active.store(false, Ordering::Release);
    }

    /// True while a consumer holds the stream.
    pub fn stream_active(&self) -> bool {
        self.stream_active.load(Ordering::Acquire)
    }
}
