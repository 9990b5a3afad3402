//! Clinical data source configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Clinical data source configuration
///
/// Without a base URL, runs must supply facts inline; `subjectId` lookups
/// are rejected.
#[derive(Debug, Clone, Deserialize)]
pub struct ClinicalConfig {
    /// FHIR-style base URL for subject record bundles
    pub fhir_base_url: Option<String>,

    /// Fetch timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl ClinicalConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check if a FHIR source is configured
    pub fn has_fhir(&self) -> bool {
        self.fhir_base_url.as_ref().is_some_and(|u| !u.is_empty())
    }

    /// Validate clinical configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidResponderTimeout);
        }
        Ok(())
    }
}

impl Default for ClinicalConfig {
    fn default() -> Self {
        Self {
            fhir_base_url: None,
            timeout_secs: default_timeout(),
        }
    }
}

fn default_timeout() -> u64 {
    10
}
