//! Run lifecycle states.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::role::AgentRole;

/// Lifecycle state of a dialog run.
///
/// `Starting` advances immediately to `ApplicantTurn`; the two turn states
/// alternate until a terminal state is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogState {
    Starting,
    ApplicantTurn,
    AdministratorTurn,
    Completed,
    Cancelled,
    Error,
}

impl DialogState {
    /// True for states a run can never leave.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DialogState::Completed | DialogState::Cancelled | DialogState::Error
        )
    }

    /// The role whose turn it is, if the run is in a turn state.
    pub fn active_role(&self) -> Option<AgentRole> {
        match self {
            DialogState::ApplicantTurn => Some(AgentRole::Applicant),
            DialogState::AdministratorTurn => Some(AgentRole::Administrator),
            DialogState::Starting
            | DialogState::Completed
            | DialogState::Cancelled
            | DialogState::Error => None,
        }
    }

    /// The turn state for a role.
    pub fn for_role(role: AgentRole) -> DialogState {
        match role {
            AgentRole::Applicant => DialogState::ApplicantTurn,
            AgentRole::Administrator => DialogState::AdministratorTurn,
        }
    }
}

impl fmt::Display for DialogState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DialogState::Starting => "starting",
            DialogState::ApplicantTurn => "applicant_turn",
            DialogState::AdministratorTurn => "administrator_turn",
            DialogState::Completed => "completed",
            DialogState::Cancelled => "cancelled",
            DialogState::Error => "error",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states_are_classified() {
        assert!(DialogState::Completed.is_terminal());
        assert!(DialogState::Cancelled.is_terminal());
        assert!(DialogState::Error.is_terminal());
        assert!(!DialogState::Starting.is_terminal());
        assert!(!DialogState::ApplicantTurn.is_terminal());
        assert!(!DialogState::AdministratorTurn.is_terminal());
    }

    #[test]
    fn active_role_only_in_turn_states() {
        assert_eq!(
            DialogState::ApplicantTurn.active_role(),
            Some(AgentRole::Applicant)
        );
        assert_eq!(
            DialogState::AdministratorTurn.active_role(),
            Some(AgentRole::Administrator)
        );
        assert_eq!(DialogState::Completed.active_role(), None);
        assert_eq!(DialogState::Starting.active_role(), None);
    }

    #[test]
    fn for_role_round_trips() {
        for role in [AgentRole::Applicant, AgentRole::Administrator] {
            assert_eq!(DialogState::for_role(role).active_role(), Some(role));
        }
    }
}
