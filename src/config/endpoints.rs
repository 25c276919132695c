//! Proxy endpoint configuration
//!
//! The endpoint list is static configuration owned outside this engine; the
//! engine only needs a stable identifier per endpoint to key credentials.
//! Endpoints are supplied as a comma-separated `host:port` list and their
//! order is preserved: the config view renders servers in this order.

use serde::Deserialize;

use crate::domain::foundation::EndpointId;

use super::error::ValidationError;

/// One configured proxy server instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    /// Parses a `host:port` entry.
    pub fn parse(entry: &str) -> Result<Self, ValidationError> {
        let entry = entry.trim();
        let (host, port) = entry
            .rsplit_once(':')
            .ok_or_else(|| ValidationError::InvalidEndpoint(entry.to_string()))?;
        if host.is_empty() {
            return Err(ValidationError::InvalidEndpoint(entry.to_string()));
        }
        let port: u16 = port
            .parse()
            .map_err(|_| ValidationError::InvalidEndpoint(entry.to_string()))?;
        Ok(Self {
            host: host.to_string(),
            port,
        })
    }

    /// The stable identifier credentials are keyed on.
    pub fn id(&self) -> EndpointId {
        // host is validated non-empty, so the id cannot be empty
        EndpointId::new(format!("{}:{}", self.host, self.port))
            .expect("endpoint id built from non-empty host")
    }
}

/// Endpoint configuration section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EndpointsConfig {
    /// Comma-separated `host:port` entries, in render order.
    pub servers: String,
}

impl EndpointsConfig {
    /// Parses the configured entries, preserving order.
    pub fn endpoints(&self) -> Result<Vec<Endpoint>, ValidationError> {
        self.servers
            .split(',')
            .filter(|entry| !entry.trim().is_empty())
            .map(Endpoint::parse)
            .collect()
    }

    /// Validate endpoint configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        let endpoints = self.endpoints()?;
        if endpoints.is_empty() {
            return Err(ValidationError::NoEndpointsConfigured);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_host_port() {
        let endpoint = Endpoint::parse("proxy1.example.com:443").unwrap();
        assert_eq!(endpoint.host, "proxy1.example.com");
        assert_eq!(endpoint.port, 443);
        assert_eq!(endpoint.id().as_str(), "proxy1.example.com:443");
    }

    #[test]
    fn parse_trims_whitespace() {
        let endpoint = Endpoint::parse("  proxy1.example.com:443 ").unwrap();
        assert_eq!(endpoint.host, "proxy1.example.com");
    }

    #[test]
    fn parse_rejects_missing_port() {
        assert!(matches!(
            Endpoint::parse("proxy1.example.com"),
            Err(ValidationError::InvalidEndpoint(_))
        ));
    }

    #[test]
    fn parse_rejects_non_numeric_port() {
        assert!(Endpoint::parse("proxy1.example.com:https").is_err());
    }

    #[test]
    fn parse_rejects_empty_host() {
        assert!(Endpoint::parse(":443").is_err());
    }

    #[test]
    fn endpoints_preserve_configured_order() {
        let config = EndpointsConfig {
            servers: "b.example.com:443,a.example.com:8443".to_string(),
        };
        let endpoints = config.endpoints().unwrap();
        assert_eq!(endpoints.len(), 2);
        assert_eq!(endpoints[0].host, "b.example.com");
        assert_eq!(endpoints[1].host, "a.example.com");
    }

    #[test]
    fn endpoints_skip_empty_entries() {
        let config = EndpointsConfig {
            servers: "a.example.com:443,,".to_string(),
        };
        assert_eq!(config.endpoints().unwrap().len(), 1);
    }

    #[test]
    fn validation_requires_at_least_one_endpoint() {
        let config = EndpointsConfig {
            servers: "".to_string(),
        };
        assert_eq!(config.validate(), Err(ValidationError::NoEndpointsConfigured));
    }

    #[test]
    fn validation_surfaces_malformed_entry() {
        let config = EndpointsConfig {
            servers: "a.example.com:443,broken".to_string(),
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidEndpoint(_))
        ));
    }
}
