//! Scripted responder for tests and dry runs.
//!
//! Returns pre-configured replies in order; once the script is exhausted it
//! falls back to a plain working response, which lets bounded-turn behavior
//! be exercised without a script for every turn.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

use crate::domain::dialog::{Action, AgentRole, ResponseState, StructuredResponse};
use crate::domain::foundation::Decision;
use crate::ports::{Responder, ResponderError, ResponderInfo, TurnContext};

/// One scripted reply.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    /// Return this response.
    Respond(StructuredResponse),
    /// Fail with this error.
    Fail(ResponderError),
}

/// Configurable responder that replays a script.
#[derive(Clone)]
pub struct ScriptedResponder {
    role: AgentRole,
    script: Arc<Mutex<VecDeque<ScriptedReply>>>,
    /// Simulated latency per call.
    delay: Duration,
    /// Contexts seen, for verification in tests.
    calls: Arc<Mutex<Vec<TurnContext>>>,
}

impl ScriptedResponder {
    /// Creates an empty script for a role; every call yields a passive
    /// working response.
    pub fn new(role: AgentRole) -> Self {
        Self {
            role,
            script: Arc::new(Mutex::new(VecDeque::new())),
            delay: Duration::ZERO,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Appends a response to the script.
    pub fn with_response(self, response: StructuredResponse) -> Self {
        self.script
            .lock()
            .unwrap()
            .push_back(ScriptedReply::Respond(response));
        self
    }

    /// Appends a failure to the script.
    pub fn with_failure(self, error: ResponderError) -> Self {
        self.script
            .lock()
            .unwrap()
            .push_back(ScriptedReply::Fail(error));
        self
    }

    /// Sets a simulated latency per call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// The dry-run applicant: provides the facts it was given.
    pub fn dry_run_applicant() -> Self {
        Self::new(AgentRole::Applicant).with_response(
            StructuredResponse::new(
                AgentRole::Applicant,
                "Dry run: submitting the recorded facts for review.",
            )
            .with_action(Action::ProvideInfo {
                data: serde_json::json!({ "source": "dry-run" }),
            }),
        )
    }

    /// The dry-run administrator: proposes a neutral decision on its first
    /// turn so a dry run exercises the full pipeline without an LLM.
    pub fn dry_run_administrator() -> Self {
        Self::new(AgentRole::Administrator).with_response(
            StructuredResponse::new(
                AgentRole::Administrator,
                "Dry run: deferring to guideline evaluation.",
            )
            .with_state(ResponseState::Completed)
            .with_action(Action::ProposeDecision {
                decision: Decision::NeedsMoreInfo,
                rationale: "Dry run; guideline evaluation decides.".to_string(),
            }),
        )
    }

    /// Number of calls received so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Personas seen so far, for verification.
    pub fn seen_personas(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|ctx| ctx.persona.clone())
            .collect()
    }
}

#[async_trait]
impl Responder for ScriptedResponder {
    async fn respond(&self, ctx: &TurnContext) -> Result<StructuredResponse, ResponderError> {
        self.calls.lock().unwrap().push(ctx.clone());

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        let reply = self.script.lock().unwrap().pop_front();
        match reply {
            Some(ScriptedReply::Respond(response)) => Ok(response),
            Some(ScriptedReply::Fail(error)) => Err(error),
            None => Ok(StructuredResponse::new(self.role, "Nothing further to add.")),
        }
    }

    fn info(&self) -> ResponderInfo {
        ResponderInfo::new("scripted", "none")
    }
}
