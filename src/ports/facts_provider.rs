//! FactsProvider port - fetches facts for an external subject identifier.

use async_trait::async_trait;

use crate::domain::subject::Facts;

/// Facts lookup failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FactsError {
    #[error("no subject found for id '{0}'")]
    NotFound(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed subject record: {0}")]
    Malformed(String),
}

/// Port for resolving a subject identifier to facts.
///
/// The source of clinical data is an external collaborator; this contract is
/// all the system depends on.
#[async_trait]
pub trait FactsProvider: Send + Sync {
    async fn fetch(&self, subject_id: &str) -> Result<Facts, FactsError>;
}
