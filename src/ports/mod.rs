//! Ports - capability interfaces at the edges of the domain.
//!
//! Implementations live in `crate::adapters`; the domain and application
//! layers depend only on these traits.

mod facts_provider;
mod guideline_store;
mod responder;
mod run_registry;

pub use facts_provider::{FactsError, FactsProvider};
pub use guideline_store::GuidelineStore;
pub use responder::{Responder, ResponderError, ResponderInfo, ResponderSet, TurnContext};
pub use run_registry::{RegistryError, RunRegistry};
