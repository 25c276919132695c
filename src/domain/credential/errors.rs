//! Credential-specific error types.

use crate::domain::foundation::{DomainError, ErrorCode, UserId};

/// Credential-specific errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// Rotation was requested but the user holds no credentials yet.
    /// Callers should treat this as a no-op success in the UI layer.
    NoCredentialsToRotate(UserId),

    /// Secret generation kept colliding with existing values.
    /// Practically unreachable; fatal to the single request if it happens.
    SecretCollisionRetriesExhausted,

    /// Infrastructure error.
    Infrastructure(String),
}

impl CredentialError {
    pub fn no_credentials_to_rotate(user_id: UserId) -> Self {
        CredentialError::NoCredentialsToRotate(user_id)
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        CredentialError::Infrastructure(message.into())
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            CredentialError::NoCredentialsToRotate(_) => ErrorCode::NoCredentialsToRotate,
            CredentialError::SecretCollisionRetriesExhausted => ErrorCode::SecretCollision,
            CredentialError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }

    /// Returns a user-friendly error message.
    pub fn message(&self) -> String {
        match self {
            CredentialError::NoCredentialsToRotate(user_id) => {
                format!("User {} has no credentials to rotate", user_id)
            }
            CredentialError::SecretCollisionRetriesExhausted => {
                "Could not generate a unique secret".to_string()
            }
            CredentialError::Infrastructure(msg) => format!("Error: {}", msg),
        }
    }
}

impl std::fmt::Display for CredentialError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for CredentialError {}

impl From<DomainError> for CredentialError {
    fn from(err: DomainError) -> Self {
        CredentialError::Infrastructure(err.to_string())
    }
}

impl From<CredentialError> for DomainError {
    fn from(err: CredentialError) -> Self {
        DomainError::new(err.code(), err.message())
    }
}
