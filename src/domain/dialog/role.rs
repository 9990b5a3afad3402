//! The two fixed dialog roles.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A participant in the eligibility dialog.
///
/// The dialog supports exactly these two roles, alternating strictly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentRole {
    /// Advocates for the subject using the shared facts.
    Applicant,
    /// Applies the guidelines and drives toward a decision.
    Administrator,
}

impl AgentRole {
    /// The role that takes the next turn.
    pub fn opponent(&self) -> AgentRole {
        match self {
            AgentRole::Applicant => AgentRole::Administrator,
            AgentRole::Administrator => AgentRole::Applicant,
        }
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AgentRole::Applicant => "applicant",
            AgentRole::Administrator => "administrator",
        };
        write!(f, "{}", s)
    }
}
