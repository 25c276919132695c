//! Proxy credential entity.
//!
//! One credential per (user, endpoint) pair, created lazily on first config
//! request. Rotation replaces the secret in place; the old value becomes
//! permanently invalid with no grace period.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{CredentialId, EndpointId, Timestamp, UserId};

use super::ProxySecret;

/// A user's bearer credential for one configured proxy endpoint.
///
/// # Invariants
///
/// - `(user_id, endpoint_id)` is unique
/// - `secret` is unique across the whole credential set, enforced at the
///   storage layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyCredential {
    /// Internal identifier.
    pub id: CredentialId,

    /// Owning user.
    pub user_id: UserId,

    /// The endpoint this secret is valid for.
    pub endpoint_id: EndpointId,

    /// The bearer token presented to the endpoint.
    pub secret: ProxySecret,

    /// When the credential was first created.
    pub issued_at: Timestamp,

    /// When the secret was last rotated, if ever.
    pub rotated_at: Option<Timestamp>,
}

impl ProxyCredential {
    /// Issues a fresh credential for a (user, endpoint) pair.
    pub fn issue(
        id: CredentialId,
        user_id: UserId,
        endpoint_id: EndpointId,
        secret: ProxySecret,
        now: Timestamp,
    ) -> Self {
        Self {
            id,
            user_id,
            endpoint_id,
            secret,
            issued_at: now,
            rotated_at: None,
        }
    }

    /// Replaces the secret, invalidating the previous value immediately.
    pub fn rotate(&mut self, secret: ProxySecret, now: Timestamp) {
        self.secret = secret;
        self.rotated_at = Some(now);
    }
}
