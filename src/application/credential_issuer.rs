//! Credential issuer - mints and rotates per-user, per-endpoint secrets.
//!
//! The issuer performs no access check of its own; callers must pass the
//! access gate first (see `access_gate`). Secret uniqueness is a storage
//! constraint, so the issuer's job on a collision is to retry with a fresh
//! secret, never to fail the caller or accept the collision.

use std::sync::Arc;

use crate::domain::credential::{CredentialError, ProxyCredential, ProxySecret};
use crate::domain::foundation::{CredentialId, EndpointId, Timestamp, UserId};
use crate::ports::{
    CredentialInsertOutcome, CredentialRepository, CredentialRotateOutcome, SecretReplacement,
};

/// How many fresh secrets to try before declaring the request failed.
/// A single collision is already a 1-in-2^190 event.
const MAX_SECRET_ATTEMPTS: u32 = 3;

/// Issues and rotates proxy credentials.
pub struct CredentialIssuer {
    credentials: Arc<dyn CredentialRepository>,
}

impl CredentialIssuer {
    pub fn new(credentials: Arc<dyn CredentialRepository>) -> Self {
        Self { credentials }
    }

    /// Returns the credential for a (user, endpoint) pair, creating it on
    /// first request.
    ///
    /// Idempotent: repeated calls without a rotation in between return the
    /// same secret, including when two requests race on first creation.
    pub async fn get_or_create(
        &self,
        user_id: &UserId,
        endpoint_id: &EndpointId,
        now: Timestamp,
    ) -> Result<ProxyCredential, CredentialError> {
        if let Some(existing) = self.credentials.find(user_id, endpoint_id).await? {
            return Ok(existing);
        }

        for attempt in 1..=MAX_SECRET_ATTEMPTS {
            let credential = ProxyCredential::issue(
                CredentialId::new(),
                *user_id,
                endpoint_id.clone(),
                ProxySecret::generate(),
                now,
            );
            match self.credentials.insert(&credential).await? {
                CredentialInsertOutcome::Inserted => {
                    tracing::info!(user_id = %user_id, endpoint_id = %endpoint_id, "issued proxy credential");
                    return Ok(credential);
                }
                CredentialInsertOutcome::PairExists(existing) => {
                    // A concurrent request created the pair first; theirs wins.
                    return Ok(existing);
                }
                CredentialInsertOutcome::SecretCollision => {
                    tracing::warn!(attempt, "generated secret collided, retrying");
                }
            }
        }
        Err(CredentialError::SecretCollisionRetriesExhausted)
    }

    /// Returns one credential per endpoint, in the caller-supplied order,
    /// creating any missing ones.
    pub async fn get_or_create_all(
        &self,
        user_id: &UserId,
        endpoint_ids: &[EndpointId],
        now: Timestamp,
    ) -> Result<Vec<ProxyCredential>, CredentialError> {
        let mut credentials = Vec::with_capacity(endpoint_ids.len());
        for endpoint_id in endpoint_ids {
            credentials.push(self.get_or_create(user_id, endpoint_id, now).await?);
        }
        Ok(credentials)
    }

    /// Replaces the secret of every credential the user holds, atomically.
    ///
    /// Rotation never creates: endpoints the user has not touched stay
    /// unprovisioned until the next `get_or_create_all`. The old secrets are
    /// dead the moment the rotation commits.
    ///
    /// # Errors
    ///
    /// Returns `NoCredentialsToRotate` when the user holds none yet; callers
    /// treat this as a no-op success in the UI layer.
    pub async fn rotate_all(
        &self,
        user_id: &UserId,
        now: Timestamp,
    ) -> Result<Vec<ProxyCredential>, CredentialError> {
        let existing = self.credentials.list_for_user(user_id).await?;
        if existing.is_empty() {
            return Err(CredentialError::no_credentials_to_rotate(*user_id));
        }

        for attempt in 1..=MAX_SECRET_ATTEMPTS {
            let replacements: Vec<SecretReplacement> = existing
                .iter()
                .map(|credential| SecretReplacement {
                    credential_id: credential.id,
                    secret: ProxySecret::generate(),
                })
                .collect();

            match self
                .credentials
                .rotate_all(user_id, &replacements, now)
                .await?
            {
                CredentialRotateOutcome::Rotated(updated) => {
                    tracing::info!(user_id = %user_id, count = updated.len(), "rotated proxy credentials");
                    return Ok(updated);
                }
                CredentialRotateOutcome::SecretCollision => {
                    tracing::warn!(attempt, "rotation batch collided, retrying");
                }
            }
        }
        Err(CredentialError::SecretCollisionRetriesExhausted)
    }
}
