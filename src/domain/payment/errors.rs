//! Payment-specific error types.

use crate::domain::foundation::{DomainError, ErrorCode, ProviderPaymentId};

use super::PaymentStatus;

/// Payment-specific errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentError {
    /// No ledger entry exists for this provider payment id.
    NotFound(ProviderPaymentId),

    /// Operation not allowed in the payment's current state.
    InvalidState {
        current: PaymentStatus,
        attempted: String,
    },

    /// Infrastructure error.
    Infrastructure(String),
}

impl PaymentError {
    pub fn not_found(id: ProviderPaymentId) -> Self {
        PaymentError::NotFound(id)
    }

    pub fn invalid_state(current: PaymentStatus, attempted: impl Into<String>) -> Self {
        PaymentError::InvalidState {
            current,
            attempted: attempted.into(),
        }
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        PaymentError::Infrastructure(message.into())
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            PaymentError::NotFound(_) => ErrorCode::PaymentNotFound,
            PaymentError::InvalidState { .. } => ErrorCode::InvalidStateTransition,
            PaymentError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }

    /// Returns a user-friendly error message.
    pub fn message(&self) -> String {
        match self {
            PaymentError::NotFound(id) => format!("Payment not found: {}", id),
            PaymentError::InvalidState { current, attempted } => {
                format!("Cannot {} payment in {:?} state", attempted, current)
            }
            PaymentError::Infrastructure(msg) => format!("Error: {}", msg),
        }
    }
}

impl std::fmt::Display for PaymentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for PaymentError {}

impl From<DomainError> for PaymentError {
    fn from(err: DomainError) -> Self {
        PaymentError::Infrastructure(err.to_string())
    }
}

impl From<PaymentError> for DomainError {
    fn from(err: PaymentError) -> Self {
        DomainError::new(err.code(), err.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_has_correct_code() {
        let err = PaymentError::not_found(ProviderPaymentId::new("charge_1").unwrap());
        assert_eq!(err.code(), ErrorCode::PaymentNotFound);
        assert!(err.message().contains("charge_1"));
    }

    #[test]
    fn invalid_state_names_attempted_operation() {
        let err = PaymentError::invalid_state(PaymentStatus::Completed, "fail");
        assert_eq!(err.code(), ErrorCode::InvalidStateTransition);
        assert!(err.message().contains("fail"));
        assert!(err.message().contains("Completed"));
    }

    #[test]
    fn converts_to_domain_error() {
        let err = PaymentError::infrastructure("timeout");
        let domain_err: DomainError = err.clone().into();
        assert_eq!(domain_err.code, err.code());
    }
}
