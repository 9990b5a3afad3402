//! Progress frames emitted while a run advances.

use serde::{Deserialize, Serialize};

use super::response::StructuredResponse;
use super::role::AgentRole;
use super::state::DialogState;
use super::turn::TurnSource;
use crate::domain::arbitration::Outcome;
use crate::domain::foundation::{RunId, Timestamp};

/// One frame of a run's progress stream.
///
/// Frames are emitted in strict turn order within a run; the stream ends
/// after exactly one terminal frame (`completion` or `error`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamFrame {
    Start {
        run_id: RunId,
        state: DialogState,
        timestamp: Timestamp,
    },
    TurnStart {
        run_id: RunId,
        turn: u32,
        role: AgentRole,
        source: TurnSource,
        timestamp: Timestamp,
    },
    TurnComplete {
        run_id: RunId,
        turn: u32,
        role: AgentRole,
        response: StructuredResponse,
        timestamp: Timestamp,
    },
    TurnError {
        run_id: RunId,
        turn: u32,
        role: AgentRole,
        error: String,
        timestamp: Timestamp,
    },
    Completion {
        run_id: RunId,
        state: DialogState,
        #[serde(skip_serializing_if = "Option::is_none")]
        outcome: Option<Outcome>,
        total_turns: u32,
        timestamp: Timestamp,
    },
    Error {
        run_id: RunId,
        error: String,
        timestamp: Timestamp,
    },
}

impl StreamFrame {
    pub fn start(run_id: RunId, state: DialogState) -> Self {
        StreamFrame::Start {
            run_id,
            state,
            timestamp: Timestamp::now(),
        }
    }

    pub fn turn_start(run_id: RunId, turn: u32, role: AgentRole, source: TurnSource) -> Self {
        StreamFrame::TurnStart {
            run_id,
            turn,
            role,
            source,
            timestamp: Timestamp::now(),
        }
    }

    pub fn turn_complete(
        run_id: RunId,
        turn: u32,
        role: AgentRole,
        response: StructuredResponse,
    ) -> Self {
        StreamFrame::TurnComplete {
            run_id,
            turn,
            role,
            response,
            timestamp: Timestamp::now(),
        }
    }

    pub fn turn_error(run_id: RunId, turn: u32, role: AgentRole, error: impl Into<String>) -> Self {
        StreamFrame::TurnError {
            run_id,
            turn,
            role,
            error: error.into(),
            timestamp: Timestamp::now(),
        }
    }

    pub fn completion(
        run_id: RunId,
        state: DialogState,
        outcome: Option<Outcome>,
        total_turns: u32,
    ) -> Self {
        StreamFrame::Completion {
            run_id,
            state,
            outcome,
            total_turns,
            timestamp: Timestamp::now(),
        }
    }

    pub fn error(run_id: RunId, error: impl Into<String>) -> Self {
        StreamFrame::Error {
            run_id,
            error: error.into(),
            timestamp: Timestamp::now(),
        }
    }

    /// True for the frame that ends a stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamFrame::Completion { .. } | StreamFrame::Error { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_serialize_with_type_tag() {
        let frame = StreamFrame::start(RunId::new(), DialogState::Starting);
        let value = serde_json::to_value(&frame).unwrap();
        assert_eq!(value["type"], "start");
        assert_eq!(value["state"], "starting");
    }

    #[test]
    fn turn_frames_carry_turn_metadata() {
        let frame = StreamFrame::turn_start(
            RunId::new(),
            2,
            AgentRole::Administrator,
            TurnSource::Generated,
        );
        let value = serde_json::to_value(&frame).unwrap();
        assert_eq!(value["type"], "turn_start");
        assert_eq!(value["turn"], 2);
        assert_eq!(value["role"], "administrator");
        assert_eq!(value["source"], "generated");
    }

    #[test]
    fn only_completion_and_error_are_terminal() {
        let run_id = RunId::new();
        assert!(StreamFrame::completion(run_id, DialogState::Completed, None, 4).is_terminal());
        assert!(StreamFrame::error(run_id, "boom").is_terminal());
        assert!(!StreamFrame::start(run_id, DialogState::Starting).is_terminal());
        assert!(!StreamFrame::turn_error(run_id, 0, AgentRole::Applicant, "x").is_terminal());
    }

    #[test]
    fn cancelled_completion_has_no_outcome() {
        let frame = StreamFrame::completion(RunId::new(), DialogState::Cancelled, None, 1);
        let value = serde_json::to_value(&frame).unwrap();
        assert_eq!(value["type"], "completion");
        assert_eq!(value["state"], "cancelled");
        assert!(value.get("outcome").is_none());
    }
}
