//! Database configuration

use serde::Deserialize;

use super::error::ValidationError;

fn default_max_connections() -> u32 {
    10
}

/// Database configuration (PostgreSQL connection)
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum pool connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl DatabaseConfig {
    /// Validate database configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.url.is_empty() {
            return Err(ValidationError::MissingRequired("PROXYGATE__DATABASE__URL"));
        }
        if !self.url.starts_with("postgres://") && !self.url.starts_with("postgresql://") {
            return Err(ValidationError::InvalidDatabaseUrl);
        }
        if self.max_connections == 0 || self.max_connections > 100 {
            return Err(ValidationError::InvalidPoolSize);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> DatabaseConfig {
        DatabaseConfig {
            url: "postgresql://test@localhost/proxygate".to_string(),
            max_connections: 10,
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn validation_rejects_empty_url() {
        let config = DatabaseConfig {
            url: String::new(),
            ..valid_config()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validation_rejects_non_postgres_url() {
        let config = DatabaseConfig {
            url: "mysql://localhost/db".to_string(),
            ..valid_config()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidDatabaseUrl));
    }

    #[test]
    fn validation_rejects_zero_pool() {
        let config = DatabaseConfig {
            max_connections: 0,
            ..valid_config()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidPoolSize));
    }

    #[test]
    fn validation_rejects_oversized_pool() {
        let config = DatabaseConfig {
            max_connections: 101,
            ..valid_config()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidPoolSize));
    }
}
