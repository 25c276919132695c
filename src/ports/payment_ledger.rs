//! Payment ledger port.
//!
//! The ledger turns an external payment notification into at most one
//! subscription extension, regardless of duplicate delivery.
//!
//! ## Why the constraint lives in the store
//!
//! The provider may deliver the same confirmation multiple times (network
//! timeouts, retries after a missed acknowledgement), and two deliveries may
//! land on two worker instances with no shared in-memory lock. The uniqueness
//! constraint on `provider_payment_id` is therefore enforced at the storage
//! layer; `record_pending` surfaces it as a typed outcome rather than racing
//! a check-then-insert.

use async_trait::async_trait;
use chrono::Duration;

use crate::domain::foundation::{DomainError, PaymentId, ProviderPaymentId, Timestamp, UserId};
use crate::domain::payment::{Payment, PaymentStatus};

/// Result of attempting to record a payment attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// First time seeing this provider payment id; pending row created.
    Recorded,
    /// A row for this provider payment id already exists.
    Duplicate(Payment),
}

/// Result of attempting to settle a payment and extend the window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettleOutcome {
    /// Payment completed and the window extended; new expiry returned.
    Applied { new_expiry: Timestamp },
    /// The payment had already settled (a concurrent delivery won the
    /// race); nothing was changed.
    AlreadySettled { status: PaymentStatus },
}

/// Port for the payment ledger.
///
/// Implementations must enforce the unique constraint on
/// `provider_payment_id` and provide cross-entity atomicity for
/// `complete_and_extend` (one transaction, or a single store lock).
#[async_trait]
pub trait PaymentLedger: Send + Sync {
    /// Attempt to insert a pending payment row.
    ///
    /// Uses insert-first semantics: on conflict the existing row is returned
    /// unchanged so the caller can decide between `AlreadyApplied` (row
    /// completed), resumption (row still pending), and rejection (row
    /// failed).
    async fn record_pending(&self, payment: &Payment) -> Result<RecordOutcome, DomainError>;

    /// Mark a pending payment as failed.
    ///
    /// Conditional on the row still being pending: a row that already
    /// settled (either way) is left untouched, preserving the terminal-state
    /// invariant.
    ///
    /// # Errors
    ///
    /// - `PaymentNotFound` if no row exists
    async fn mark_failed(&self, payment_id: &PaymentId) -> Result<(), DomainError>;

    /// Atomically settle a payment and extend the user's access window.
    ///
    /// Marks the payment completed and applies the extension rule
    /// (`max(expiry, now) + duration`) to the user row in one transaction,
    /// holding a lock on the user row so concurrent extensions for the same
    /// user serialize instead of losing updates. Both writes land or neither
    /// is observable.
    ///
    /// The completion is conditional on the row still being pending, so two
    /// workers racing on the same delivery produce exactly one `Applied`.
    ///
    /// # Errors
    ///
    /// - `PaymentNotFound` / `UserNotFound` if either row is missing
    async fn complete_and_extend(
        &self,
        payment_id: &PaymentId,
        user_id: &UserId,
        duration: Duration,
        now: Timestamp,
    ) -> Result<SettleOutcome, DomainError>;

    /// Find a ledger entry by the provider's payment id.
    async fn find_by_provider_id(
        &self,
        provider_payment_id: &ProviderPaymentId,
    ) -> Result<Option<Payment>, DomainError>;

    /// Whether the ledger holds any completed payment for this user.
    ///
    /// Feeds the display-status derivation (trial vs. paid); never used for
    /// access decisions.
    async fn has_completed_payment(&self, user_id: &UserId) -> Result<bool, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Trait object safety test
    #[test]
    fn payment_ledger_is_object_safe() {
        fn _accepts_dyn(_ledger: &dyn PaymentLedger) {}
    }
}
