//! In-memory versioned guideline store.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::info;

use crate::domain::guidelines::{GuidelineError, Guidelines};
use crate::ports::GuidelineStore;

/// Versioned guideline store backed by a map.
///
/// Seeded with the default screening configuration under version `default`.
pub struct InMemoryGuidelineStore {
    versions: RwLock<HashMap<String, Guidelines>>,
}

impl InMemoryGuidelineStore {
    pub fn new() -> Self {
        let mut versions = HashMap::new();
        let default = Guidelines::default_screening();
        versions.insert(default.version.clone(), default);
        Self {
            versions: RwLock::new(versions),
        }
    }
}

impl Default for InMemoryGuidelineStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GuidelineStore for InMemoryGuidelineStore {
    async fn get(&self, version: &str) -> Result<Guidelines, GuidelineError> {
        self.versions
            .read()
            .await
            .get(version)
            .cloned()
            .ok_or_else(|| GuidelineError::VersionNotFound(version.to_string()))
    }

    async fn put(&self, version: &str, mut guidelines: Guidelines) -> Result<(), GuidelineError> {
        guidelines.version = version.to_string();
        // Validation happens before any mutation; a rejected update leaves
        // the stored configuration untouched.
        guidelines.validate()?;
        self.versions
            .write()
            .await
            .insert(version.to_string(), guidelines);
        info!(version, "guidelines replaced");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::guidelines::AgeRange;

    #[tokio::test]
    async fn seeded_with_default_version() {
        let store = InMemoryGuidelineStore::new();
        let guidelines = store.get("default").await.unwrap();
        assert_eq!(guidelines.version, "default");
    }

    #[tokio::test]
    async fn unknown_version_is_not_found() {
        let store = InMemoryGuidelineStore::new();
        assert_eq!(
            store.get("2026-draft").await,
            Err(GuidelineError::VersionNotFound("2026-draft".to_string()))
        );
    }

    #[tokio::test]
    async fn put_replaces_atomically_under_the_version_key() {
        let store = InMemoryGuidelineStore::new();
        let mut updated = Guidelines::default_screening();
        updated.age_range = AgeRange::new(40, 74);

        store.put("2026-update", updated).await.unwrap();

        let stored = store.get("2026-update").await.unwrap();
        assert_eq!(stored.version, "2026-update");
        assert_eq!(stored.age_range, AgeRange::new(40, 74));
        // The default version is untouched.
        let default = store.get("default").await.unwrap();
        assert_eq!(default.age_range, AgeRange::new(50, 74));
    }

    #[tokio::test]
    async fn invalid_update_is_rejected_without_mutation() {
        let store = InMemoryGuidelineStore::new();
        let mut broken = Guidelines::default_screening();
        broken.interval_months = 0;

        let result = store.put("default", broken).await;
        assert_eq!(result, Err(GuidelineError::NonPositiveInterval));

        // The previous configuration is still in place.
        let stored = store.get("default").await.unwrap();
        assert_eq!(stored.interval_months, 24);
    }
}
