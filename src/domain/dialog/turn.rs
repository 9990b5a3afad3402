//! A single dialog turn and its lifecycle.

use serde::{Deserialize, Serialize};

use super::response::StructuredResponse;
use super::role::AgentRole;
use crate::domain::foundation::Timestamp;
use crate::domain::subject::Facts;

/// How a turn's content came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnSource {
    /// Produced by a responder on request.
    Generated,
    /// Supplied by an outside caller.
    External,
    /// Produced by the orchestrator itself.
    System,
}

/// Terminal state of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TurnState {
    Working,
    InputRequired,
    Completed,
    Error,
}

/// One turn in a dialog run.
///
/// Created before dispatch, completed exactly once with the responder's
/// result, and never deleted. Owned exclusively by the run that created it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogTurn {
    /// Zero-based position in the run.
    pub turn_index: u32,
    /// Role that took this turn.
    pub role: AgentRole,
    /// When the turn was created.
    pub timestamp: Timestamp,
    /// How the turn content was produced.
    pub source: TurnSource,
    /// The context message the responder was given.
    pub request_message: String,
    /// Facts snapshot this turn's context referenced.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facts: Option<Facts>,
    /// The responder's structured reply, once received.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<StructuredResponse>,
    /// Turn lifecycle state.
    pub terminal_state: TurnState,
    /// Failure description when the turn errored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DialogTurn {
    /// Creates a turn about to be dispatched to a responder.
    pub fn dispatched(
        turn_index: u32,
        role: AgentRole,
        request_message: impl Into<String>,
        facts: Option<Facts>,
    ) -> Self {
        Self {
            turn_index,
            role,
            timestamp: Timestamp::now(),
            source: TurnSource::Generated,
            request_message: request_message.into(),
            facts,
            response: None,
            terminal_state: TurnState::Working,
            error: None,
        }
    }

    /// Records the responder's reply; the turn state follows the response.
    pub fn complete(&mut self, response: StructuredResponse) {
        self.terminal_state = match response.state {
            super::response::ResponseState::Working => TurnState::Completed,
            super::response::ResponseState::InputRequired => TurnState::InputRequired,
            super::response::ResponseState::Completed => TurnState::Completed,
        };
        self.response = Some(response);
    }

    /// Marks the turn failed.
    pub fn fail(&mut self, error: impl Into<String>) {
        self.terminal_state = TurnState::Error;
        self.error = Some(error.into());
    }

    /// True if the turn's response proposes or accepts a decision.
    pub fn has_decision_action(&self) -> bool {
        self.response
            .as_ref()
            .is_some_and(StructuredResponse::has_decision_action)
    }
}
