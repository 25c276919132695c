//! Credential repository port.
//!
//! Secrets double as bearer credentials, so the store enforces a uniqueness
//! constraint on `secret` globally, not just per endpoint. Generation
//! collisions surface as typed outcomes so the issuer can retry with a fresh
//! secret instead of failing the caller.

use async_trait::async_trait;

use crate::domain::credential::{ProxyCredential, ProxySecret};
use crate::domain::foundation::{CredentialId, DomainError, EndpointId, Timestamp, UserId};

/// Result of attempting to insert a new credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialInsertOutcome {
    /// Credential stored.
    Inserted,
    /// A credential for this (user, endpoint) pair already exists; the
    /// existing row is returned so lazy creation stays idempotent under
    /// concurrent requests.
    PairExists(ProxyCredential),
    /// The generated secret collided with an existing one. Retry with a
    /// fresh secret.
    SecretCollision,
}

/// One secret replacement inside a rotation batch.
#[derive(Debug, Clone)]
pub struct SecretReplacement {
    pub credential_id: CredentialId,
    pub secret: ProxySecret,
}

/// Result of a batched rotation.
#[derive(Debug, Clone)]
pub enum CredentialRotateOutcome {
    /// All replacements applied atomically; updated rows returned in the
    /// same order as the replacements.
    Rotated(Vec<ProxyCredential>),
    /// At least one new secret collided with an existing one; nothing was
    /// changed. Retry the whole batch with fresh secrets.
    SecretCollision,
}

/// Repository port for proxy credential persistence.
///
/// Implementations must enforce:
/// - Unique `(user_id, endpoint_id)` pair
/// - Globally unique `secret`
/// - Atomic application of a rotation batch (all rows or none)
#[async_trait]
pub trait CredentialRepository: Send + Sync {
    /// Find the credential for a (user, endpoint) pair.
    async fn find(
        &self,
        user_id: &UserId,
        endpoint_id: &EndpointId,
    ) -> Result<Option<ProxyCredential>, DomainError>;

    /// List all credentials a user holds, oldest first.
    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<ProxyCredential>, DomainError>;

    /// Attempt to insert a new credential.
    async fn insert(
        &self,
        credential: &ProxyCredential,
    ) -> Result<CredentialInsertOutcome, DomainError>;

    /// Replace the secrets of a user's credentials in one atomic batch,
    /// stamping `rotated_at`.
    async fn rotate_all(
        &self,
        user_id: &UserId,
        replacements: &[SecretReplacement],
        rotated_at: Timestamp,
    ) -> Result<CredentialRotateOutcome, DomainError>;

    /// Look up a credential by its current secret.
    ///
    /// Rotated-out values resolve to `None`: the old secret is dead the
    /// moment the rotation commits.
    async fn find_by_secret(
        &self,
        secret: &ProxySecret,
    ) -> Result<Option<ProxyCredential>, DomainError>;
}
