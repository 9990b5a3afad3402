//! Application configuration module
//!
//! Type-safe configuration loading from environment variables using the
//! `config` and `dotenvy` crates. Configuration is loaded with the
//! `ARBITER` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use eligibility_arbiter::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {}", config.server.socket_addr());
//! ```

mod clinical;
mod error;
mod responder;
mod server;

pub use clinical::ClinicalConfig;
pub use error::{ConfigError, ValidationError};
pub use responder::ResponderConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment).
    #[serde(default)]
    pub server: ServerConfig,

    /// Responder configuration (Anthropic API).
    #[serde(default)]
    pub responder: ResponderConfig,

    /// Clinical data source configuration (FHIR).
    #[serde(default)]
    pub clinical: ClinicalConfig,
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Reads variables with the `ARBITER` prefix, `__` separating nested
    /// values: `ARBITER__SERVER__PORT=8080` -> `server.port = 8080`.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development).
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::Environment::default().prefix("ARBITER").separator("__"))
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.responder.validate()?;
        self.clinical.validate()?;
        Ok(())
    }

    /// Check if running in production environment.
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
