//! Opaque proxy secret value object.
//!
//! A secret is the bearer token a user presents to a proxy endpoint. The
//! format is opaque to this engine; downstream proxy-config rendering owns
//! any link formatting.
//!
//! # Security
//!
//! - 32 random base62 characters drawn from the OS RNG (62^32, about 2^190
//!   combinations), so an accidental collision is astronomically unlikely -
//!   the store still enforces global uniqueness as a hard constraint
//! - `Debug` output is redacted; secrets only leave the engine through
//!   `expose` at the rendering boundary

use rand::rngs::OsRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::ValidationError;

/// Number of characters in a generated secret.
pub const SECRET_LENGTH: usize = 32;

const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Fixed-length random bearer token, unique across all credentials.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProxySecret(String);

impl ProxySecret {
    /// Generates a fresh secret from the OS random source.
    pub fn generate() -> Self {
        let mut rng = OsRng;
        let value: String = (0..SECRET_LENGTH)
            .map(|_| {
                let idx = rng.gen_range(0..CHARSET.len());
                CHARSET[idx] as char
            })
            .collect();
        Self(value)
    }

    /// Reconstructs a secret from storage.
    ///
    /// # Errors
    ///
    /// Rejects values that are not exactly `SECRET_LENGTH` base62 characters.
    pub fn from_stored(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.len() != SECRET_LENGTH {
            return Err(ValidationError::invalid_format(
                "secret",
                format!("expected {} characters, got {}", SECRET_LENGTH, value.len()),
            ));
        }
        if !value.bytes().all(|b| CHARSET.contains(&b)) {
            return Err(ValidationError::invalid_format(
                "secret",
                "expected base62 characters only",
            ));
        }
        Ok(Self(value))
    }

    /// Exposes the secret value for storage or rendering.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ProxySecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ProxySecret(REDACTED)")
    }
}
