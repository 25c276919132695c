//! Engine configuration module
//!
//! This module provides type-safe configuration loading from environment
//! variables using the `config` and `dotenvy` crates. Configuration is loaded
//! with the `PROXYGATE` prefix and nested values use double underscores as
//! separators.
//!
//! There is no process-wide mutable settings object: the loaded
//! [`EngineConfig`] is passed into the engine at construction.
//!
//! # Example
//!
//! ```no_run
//! use proxygate::config::EngineConfig;
//!
//! let config = EngineConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod billing;
mod database;
mod endpoints;
mod error;

pub use billing::BillingConfig;
pub use database::DatabaseConfig;
pub use endpoints::{Endpoint, EndpointsConfig};
pub use error::{ConfigError, ValidationError};

use serde::Deserialize;

/// Root engine configuration
///
/// Contains all configuration sections for the lifecycle engine.
/// Load using [`EngineConfig::load()`] which reads from environment
/// variables.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Billing configuration (price, durations)
    #[serde(default)]
    pub billing: BillingConfig,

    /// Proxy endpoint list (ordered host:port entries)
    #[serde(default)]
    pub endpoints: EndpointsConfig,

    /// Database configuration (PostgreSQL connection)
    pub database: DatabaseConfig,
}

impl EngineConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `PROXYGATE` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `PROXYGATE__DATABASE__URL=...` -> `database.url = ...`
    /// - `PROXYGATE__ENDPOINTS__SERVERS=a:443,b:443` -> `endpoints.servers`
    /// - `PROXYGATE__BILLING__SUBSCRIPTION_PRICE_MINOR=500`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required environment variables are missing
    /// or values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("PROXYGATE")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.billing.validate()?;
        self.endpoints.validate()?;
        self.database.validate()?;
        Ok(())
    }
}
