//! Foundation value objects shared across the domain.

mod decision;
mod ids;
mod timestamp;

pub use decision::Decision;
pub use ids::RunId;
pub use timestamp::Timestamp;
