//! Responder configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Responder configuration
///
/// Without an API key the service falls back to scripted responders, which
/// keeps local development and tests free of network calls.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponderConfig {
    /// Anthropic API key
    pub anthropic_api_key: Option<String>,

    /// Model to use for both roles
    #[serde(default = "default_model")]
    pub model: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Maximum retries on transient failures
    #[serde(default = "default_retries")]
    pub max_retries: u32,
}

impl ResponderConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check if Anthropic is configured
    pub fn has_anthropic(&self) -> bool {
        self.anthropic_api_key
            .as_ref()
            .is_some_and(|k| !k.is_empty())
    }

    /// Validate responder configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidResponderTimeout);
        }
        Ok(())
    }
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self {
            anthropic_api_key: None,
            model: default_model(),
            timeout_secs: default_timeout(),
            max_retries: default_retries(),
        }
    }
}

fn default_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_retries() -> u32 {
    2
}
