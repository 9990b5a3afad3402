//! Responder implementations.

mod anthropic_responder;
mod scripted_responder;

pub use anthropic_responder::{AnthropicConfig, AnthropicResponder};
pub use scripted_responder::{ScriptedReply, ScriptedResponder};
