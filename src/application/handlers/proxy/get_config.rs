//! GetConfigHandler - Query handler for the proxy configuration view.

use std::sync::Arc;

use crate::application::access_gate::{AccessDecision, AccessGate, DenyReason};
use crate::application::credential_issuer::CredentialIssuer;
use crate::config::Endpoint;
use crate::domain::credential::CredentialError;
use crate::domain::foundation::{EndpointId, Timestamp, UserId};
use crate::ports::UserRepository;

use super::CredentialView;

/// Query for a user's proxy configuration.
#[derive(Debug, Clone)]
pub struct GetConfigCommand {
    pub user_id: UserId,
    /// Configured endpoints, in render order.
    pub endpoints: Vec<Endpoint>,
    pub now: Timestamp,
}

/// Result of a config request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GetConfigResult {
    /// One view per configured endpoint, in the requested order.
    Allowed(Vec<CredentialView>),
    /// Access denied; the reason drives the front-end's call to action.
    Denied(DenyReason),
}

/// Handler for config requests.
///
/// Gate first, issuer second - privileged operations never reach the issuer
/// on a denied check.
pub struct GetConfigHandler {
    users: Arc<dyn UserRepository>,
    issuer: CredentialIssuer,
}

impl GetConfigHandler {
    pub fn new(users: Arc<dyn UserRepository>, issuer: CredentialIssuer) -> Self {
        Self { users, issuer }
    }

    pub async fn handle(&self, cmd: GetConfigCommand) -> Result<GetConfigResult, CredentialError> {
        let user = self
            .users
            .find_by_id(&cmd.user_id)
            .await
            .map_err(|e| CredentialError::infrastructure(e.to_string()))?;

        let decision = match &user {
            Some(user) => AccessGate::check(user, cmd.now),
            None => AccessGate::check_absent(),
        };
        if let AccessDecision::Deny(reason) = decision {
            return Ok(GetConfigResult::Denied(reason));
        }

        let endpoint_ids: Vec<EndpointId> = cmd.endpoints.iter().map(Endpoint::id).collect();
        let credentials = self
            .issuer
            .get_or_create_all(&cmd.user_id, &endpoint_ids, cmd.now)
            .await?;

        let views = cmd
            .endpoints
            .iter()
            .zip(credentials.iter())
            .map(|(endpoint, credential)| CredentialView::new(endpoint, credential))
            .collect();

        Ok(GetConfigResult::Allowed(views))
    }
}
