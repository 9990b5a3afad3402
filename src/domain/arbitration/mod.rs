//! Reconciling role proposals with guideline evaluation.

mod arbiter;
mod extractor;
mod outcome;

pub use arbiter::Arbiter;
pub use extractor::{Proposal, ProposalExtractor};
pub use outcome::{ArbitrationMethod, Outcome, OutcomeDetails};
