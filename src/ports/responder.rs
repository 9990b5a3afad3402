//! Responder port - produces one role's turn content.
//!
//! A responder receives the shared dialog context and returns a structured
//! response. Implementations connect to an external language-model service
//! (or return scripted content for tests and dry runs); the orchestrator
//! never retries a failed call, so bounded retry on transient failures is
//! the implementation's own concern.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::dialog::{AgentRole, StructuredResponse};
use crate::domain::guidelines::Guidelines;
use crate::domain::subject::Facts;

/// Shared context handed to a responder for one turn.
#[derive(Debug, Clone)]
pub struct TurnContext {
    /// The role being asked to respond.
    pub role: AgentRole,
    /// Persona instructions for that role in the current scenario.
    pub persona: String,
    /// The run's immutable facts.
    pub facts: Facts,
    /// The run's guideline snapshot.
    pub guidelines: Guidelines,
    /// Responses from the most recent turns, oldest first.
    pub recent_turns: Vec<StructuredResponse>,
}

/// Port for producing a role's turn content.
#[async_trait]
pub trait Responder: Send + Sync {
    /// Produces a structured response for the context's role.
    async fn respond(&self, ctx: &TurnContext) -> Result<StructuredResponse, ResponderError>;

    /// Implementation name and model, for logging.
    fn info(&self) -> ResponderInfo;
}

/// Responder identification for logs and diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponderInfo {
    pub name: String,
    pub model: String,
}

impl ResponderInfo {
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
        }
    }
}

/// One responder per role.
#[derive(Clone)]
pub struct ResponderSet {
    pub applicant: Arc<dyn Responder>,
    pub administrator: Arc<dyn Responder>,
}

impl ResponderSet {
    pub fn new(applicant: Arc<dyn Responder>, administrator: Arc<dyn Responder>) -> Self {
        Self {
            applicant,
            administrator,
        }
    }

    /// Both roles served by the same implementation.
    pub fn shared(responder: Arc<dyn Responder>) -> Self {
        Self {
            applicant: responder.clone(),
            administrator: responder,
        }
    }

    pub fn for_role(&self, role: AgentRole) -> &Arc<dyn Responder> {
        match role {
            AgentRole::Applicant => &self.applicant,
            AgentRole::Administrator => &self.administrator,
        }
    }
}

/// Responder failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ResponderError {
    /// The call did not complete within the per-turn timeout.
    #[error("responder timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// Transport-level failure reaching the service.
    #[error("transport error: {0}")]
    Transport(String),

    /// The service replied, but not with a conforming structured response.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The service is temporarily unavailable.
    #[error("responder unavailable: {0}")]
    Unavailable(String),

    /// Rate limited by the service.
    #[error("rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u32 },

    /// API key or authentication failed.
    #[error("authentication failed")]
    AuthenticationFailed,
}

impl ResponderError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse(message.into())
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    /// True if retrying the same call could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ResponderError::Timeout { .. }
                | ResponderError::Transport(_)
                | ResponderError::Unavailable(_)
                | ResponderError::RateLimited { .. }
        )
    }
}
