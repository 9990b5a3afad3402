//! Structured turn responses produced by responders.

use serde::{Deserialize, Serialize};

use super::action::Action;
use super::role::AgentRole;

/// Default confidence when a responder omits the field.
pub(crate) const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Progress state a role reports for its own turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResponseState {
    /// Still working toward a decision.
    Working,
    /// Cannot proceed without more input.
    InputRequired,
    /// Finished with its part of the dialog.
    Completed,
}

/// One role's structured reply for a single turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredResponse {
    /// The role that produced this response.
    pub role: AgentRole,
    /// The role's own view of its progress.
    pub state: ResponseState,
    /// Free-text message accompanying the actions.
    pub message: String,
    /// Ordered actions the role wants taken.
    #[serde(default)]
    pub actions: Vec<Action>,
    /// Self-reported confidence in `[0, 1]`.
    #[serde(default = "default_confidence")]
    pub confidence: f64,
}

fn default_confidence() -> f64 {
    DEFAULT_CONFIDENCE
}

impl StructuredResponse {
    /// Creates a working response with no actions.
    pub fn new(role: AgentRole, message: impl Into<String>) -> Self {
        Self {
            role,
            state: ResponseState::Working,
            message: message.into(),
            actions: Vec::new(),
            confidence: DEFAULT_CONFIDENCE,
        }
    }

    /// Appends an action.
    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    /// Sets the progress state.
    pub fn with_state(mut self, state: ResponseState) -> Self {
        self.state = state;
        self
    }

    /// Sets the confidence, clamped into `[0, 1]`.
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    /// The first decision-bearing action, if the response carries one.
    pub fn decision_action(&self) -> Option<&Action> {
        self.actions.iter().find(|a| a.is_decision_bearing())
    }

    /// True if the response proposes or accepts a decision.
    pub fn has_decision_action(&self) -> bool {
        self.decision_action().is_some()
    }
}
