//! GuidelineStore port - versioned guideline configurations.

use async_trait::async_trait;

use crate::domain::guidelines::{GuidelineError, Guidelines};

/// Versioned store of guideline configurations.
///
/// `put` replaces a whole configuration atomically after validation; a
/// rejected update must leave the stored version untouched.
#[async_trait]
pub trait GuidelineStore: Send + Sync {
    /// Fetches the configuration stored under `version`.
    async fn get(&self, version: &str) -> Result<Guidelines, GuidelineError>;

    /// Validates and atomically replaces the configuration under `version`.
    async fn put(&self, version: &str, guidelines: Guidelines) -> Result<(), GuidelineError>;
}
