//! User repository port (the Account Store).
//!
//! Defines the contract for persisting User aggregates. The store owns the
//! `trial_used` set-once guard: granting a trial is a compare-and-set so that
//! two concurrent trial requests can never both succeed, even across worker
//! instances with no shared in-memory lock.

use async_trait::async_trait;

use crate::domain::account::User;
use crate::domain::foundation::{DomainError, Timestamp, UserId};

/// Result of attempting to insert a new user row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertUserOutcome {
    /// Row was created (first contact).
    Inserted,
    /// A row for this external identity already exists.
    AlreadyExists,
}

/// Result of the trial compare-and-set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrialGrantOutcome {
    /// Trial flag was set and the access window opened.
    Granted,
    /// The flag was already set; nothing changed.
    AlreadyUsed,
}

/// Repository port for User aggregate persistence.
///
/// Implementations must enforce:
/// - Unique external identity (`id`)
/// - Set-once semantics for `trial_used` at the storage layer
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user row.
    ///
    /// Returns `AlreadyExists` instead of failing when another request
    /// created the row concurrently; callers re-read in that case.
    async fn insert(&self, user: &User) -> Result<InsertUserOutcome, DomainError>;

    /// Find a user by external identity.
    ///
    /// Returns `None` if the user has never contacted the service.
    async fn find_by_id(&self, user_id: &UserId) -> Result<Option<User>, DomainError>;

    /// Update the informational display name.
    async fn update_display_name(
        &self,
        user_id: &UserId,
        display_name: Option<String>,
    ) -> Result<(), DomainError>;

    /// Atomically consume the one-time trial.
    ///
    /// Compare-and-set on `trial_used = false`: sets the flag and the access
    /// window in one statement, returning `AlreadyUsed` when the flag was
    /// already consumed (including by a concurrent request).
    ///
    /// # Errors
    ///
    /// - `UserNotFound` if no row exists for this user
    /// - `DatabaseError` on persistence failure
    async fn grant_trial(
        &self,
        user_id: &UserId,
        expires_at: Timestamp,
    ) -> Result<TrialGrantOutcome, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Trait object safety test
    #[test]
    fn user_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn UserRepository) {}
    }
}
