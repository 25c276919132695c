//! Credential view - the shape the front-end renders.
//!
//! This is the rendering boundary: the secret leaves its redacted wrapper
//! here, paired with the endpoint address the user connects to.

use serde::Serialize;

use crate::config::Endpoint;
use crate::domain::credential::ProxyCredential;
use crate::domain::foundation::{EndpointId, Timestamp};

/// One endpoint's connection details for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CredentialView {
    pub endpoint_id: EndpointId,
    pub host: String,
    pub port: u16,
    pub secret: String,
    pub issued_at: Timestamp,
    pub rotated_at: Option<Timestamp>,
}

impl CredentialView {
    /// Builds a view from a configured endpoint and its credential.
    pub fn new(endpoint: &Endpoint, credential: &ProxyCredential) -> Self {
        Self {
            endpoint_id: credential.endpoint_id.clone(),
            host: endpoint.host.clone(),
            port: endpoint.port,
            secret: credential.secret.expose().to_string(),
            issued_at: credential.issued_at,
            rotated_at: credential.rotated_at,
        }
    }

    /// Builds a view from a credential alone, recovering the address from
    /// the stable `host:port` endpoint id.
    ///
    /// Returns `None` for an id that does not parse; ids written by this
    /// engine always do.
    pub fn from_credential(credential: &ProxyCredential) -> Option<Self> {
        let endpoint = Endpoint::parse(credential.endpoint_id.as_str()).ok()?;
        Some(Self::new(&endpoint, credential))
    }

    /// Deep link understood by the messenger client.
    pub fn connection_url(&self) -> String {
        format!(
            "tg://proxy?server={}&port={}&secret={}",
            self.host, self.port, self.secret
        )
    }
}
