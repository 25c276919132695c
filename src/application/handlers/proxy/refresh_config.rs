//! RefreshConfigHandler - Command handler for credential rotation.

use std::sync::Arc;

use crate::application::access_gate::{AccessDecision, AccessGate, DenyReason};
use crate::application::credential_issuer::CredentialIssuer;
use crate::domain::credential::CredentialError;
use crate::domain::foundation::{Timestamp, UserId};
use crate::ports::UserRepository;

use super::CredentialView;

/// Command to rotate all of a user's credentials.
#[derive(Debug, Clone)]
pub struct RefreshConfigCommand {
    pub user_id: UserId,
    pub now: Timestamp,
}

/// Result of a refresh request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshConfigResult {
    /// Rotated views, oldest credential first. Empty when the user had no
    /// credentials yet - a no-op success, not an error.
    Allowed(Vec<CredentialView>),
    /// Access denied; the reason drives the front-end's call to action.
    Denied(DenyReason),
}

/// Handler for refresh requests.
///
/// Rotation never creates: endpoints added to configuration after the user's
/// credential set was created are picked up by the next config request, not
/// here.
pub struct RefreshConfigHandler {
    users: Arc<dyn UserRepository>,
    issuer: CredentialIssuer,
}

impl RefreshConfigHandler {
    pub fn new(users: Arc<dyn UserRepository>, issuer: CredentialIssuer) -> Self {
        Self { users, issuer }
    }

    pub async fn handle(
        &self,
        cmd: RefreshConfigCommand,
    ) -> Result<RefreshConfigResult, CredentialError> {
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
            return Ok(RefreshConfigResult::Denied(reason));
        }

        let rotated = match self.issuer.rotate_all(&cmd.user_id, cmd.now).await {
            Ok(rotated) => rotated,
            // Nothing to rotate is a no-op success for the caller.
            Err(CredentialError::NoCredentialsToRotate(_)) => Vec::new(),
            Err(e) => return Err(e),
        };

        let views = rotated
            .iter()
            .filter_map(CredentialView::from_credential)
            .collect();

        Ok(RefreshConfigResult::Allowed(views))
    }
}
