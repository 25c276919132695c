//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Pool size must be between 1 and 100")]
    InvalidPoolSize,

    #[error("Subscription price must be positive")]
    InvalidPrice,

    #[error("Currency must be a three-letter code")]
    InvalidCurrency,

    #[error("Durations must be positive")]
    InvalidDuration,

    #[error("At least one proxy endpoint must be configured")]
    NoEndpointsConfigured,

    #[error("Invalid endpoint '{0}': expected host:port")]
    InvalidEndpoint(String),
}
