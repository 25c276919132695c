//! Account-specific error types.

use crate::domain::foundation::{DomainError, ErrorCode, UserId};

/// Account-specific errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountError {
    /// The one-time trial was already consumed.
    AlreadyUsedTrial(UserId),

    /// No account row exists for this user.
    NotFound(UserId),

    /// Infrastructure error.
    Infrastructure(String),
}

impl AccountError {
    pub fn not_found(user_id: UserId) -> Self {
        AccountError::NotFound(user_id)
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        AccountError::Infrastructure(message.into())
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            AccountError::AlreadyUsedTrial(_) => ErrorCode::TrialAlreadyUsed,
            AccountError::NotFound(_) => ErrorCode::UserNotFound,
            AccountError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }

    /// Returns a user-friendly error message.
    pub fn message(&self) -> String {
        match self {
            AccountError::AlreadyUsedTrial(user_id) => {
                format!("User {} has already used the free trial", user_id)
            }
            AccountError::NotFound(user_id) => format!("No account found for user {}", user_id),
            AccountError::Infrastructure(msg) => format!("Error: {}", msg),
        }
    }
}

impl std::fmt::Display for AccountError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for AccountError {}

impl From<DomainError> for AccountError {
    fn from(err: DomainError) -> Self {
        AccountError::Infrastructure(err.to_string())
    }
}

impl From<AccountError> for DomainError {
    fn from(err: AccountError) -> Self {
        DomainError::new(err.code(), err.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user_id() -> UserId {
        UserId::new(42).unwrap()
    }

    #[test]
    fn already_used_trial_has_correct_code() {
        let err = AccountError::AlreadyUsedTrial(test_user_id());
        assert_eq!(err.code(), ErrorCode::TrialAlreadyUsed);
        assert!(err.message().contains("42"));
    }

    #[test]
    fn not_found_has_correct_code() {
        let err = AccountError::not_found(test_user_id());
        assert_eq!(err.code(), ErrorCode::UserNotFound);
    }

    #[test]
    fn infrastructure_has_database_code() {
        let err = AccountError::infrastructure("connection lost");
        assert_eq!(err.code(), ErrorCode::DatabaseError);
    }

    #[test]
    fn display_matches_message() {
        let err = AccountError::AlreadyUsedTrial(test_user_id());
        assert_eq!(format!("{}", err), err.message());
    }

    #[test]
    fn converts_to_domain_error() {
        let err = AccountError::not_found(test_user_id());
        let domain_err: DomainError = err.clone().into();
        assert_eq!(domain_err.code, err.code());
    }
}
