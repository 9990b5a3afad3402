//! The turn-based dialog: roles, actions, turns, runs, and the orchestrator.

mod action;
mod frame;
mod orchestrator;
mod response;
mod role;
mod run;
mod state;
mod turn;

pub use action::Action;
pub use frame::StreamFrame;
pub use orchestrator::DialogOrchestrator;
pub use response::{ResponseState, StructuredResponse};
pub use role::AgentRole;
pub use run::{DialogRun, RunHandle, RunOptions};
pub use state::DialogState;
pub use turn::{DialogTurn, TurnSource, TurnState};
