//! Payment ledger entry.
//!
//! One row per provider transaction attempt. The provider's payment id is the
//! idempotency key: it is unique at the schema level, so duplicate webhook
//! deliveries collapse onto the same row and can never credit a user twice.
//!
//! Monetary amounts are stored in minor units (cents) as i64, never floats.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{PaymentId, ProviderPaymentId, StateMachine, Timestamp, UserId};

use super::{PaymentError, PaymentStatus};

/// A single payment attempt as recorded in the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    /// Internal identifier.
    pub id: PaymentId,

    /// The user this payment credits.
    pub user_id: UserId,

    /// Provider transaction id - the idempotency key, unique in the ledger.
    pub provider_payment_id: ProviderPaymentId,

    /// Amount in minor units (cents).
    pub amount_minor: i64,

    /// ISO currency code, e.g. "USD".
    pub currency: String,

    /// Settlement state.
    pub status: PaymentStatus,

    /// When the attempt was first recorded.
    pub created_at: Timestamp,

    /// When the payment settled as completed, if it did.
    pub completed_at: Option<Timestamp>,
}

impl Payment {
    /// Records a new pending payment attempt.
    pub fn record(
        id: PaymentId,
        user_id: UserId,
        provider_payment_id: ProviderPaymentId,
        amount_minor: i64,
        currency: impl Into<String>,
        now: Timestamp,
    ) -> Self {
        Self {
            id,
            user_id,
            provider_payment_id,
            amount_minor,
            currency: currency.into(),
            status: PaymentStatus::Pending,
            created_at: now,
            completed_at: None,
        }
    }

    /// Settles the payment as completed.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` if the payment is not pending.
    pub fn complete(&mut self, now: Timestamp) -> Result<(), PaymentError> {
        self.status = self
            .status
            .transition_to(PaymentStatus::Completed)
            .map_err(|_| PaymentError::invalid_state(self.status, "complete"))?;
        self.completed_at = Some(now);
        Ok(())
    }

    /// Settles the payment as failed.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` if the payment is not pending.
    pub fn fail(&mut self) -> Result<(), PaymentError> {
        self.status = self
            .status
            .transition_to(PaymentStatus::Failed)
            .map_err(|_| PaymentError::invalid_state(self.status, "fail"))?;
        Ok(())
    }

    /// Checks the attempt against the expected price.
    ///
    /// Exact match on both amount and currency; there is a single configured
    /// price, not a catalogue.
    pub fn matches_price(&self, expected_amount_minor: i64, expected_currency: &str) -> bool {
        self.amount_minor == expected_amount_minor
            && self.currency.eq_ignore_ascii_case(expected_currency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t0() -> Timestamp {
        Timestamp::parse_rfc3339("2026-03-01T12:00:00Z").unwrap()
    }

    fn test_payment() -> Payment {
        Payment::record(
            PaymentId::new(),
            UserId::new(7).unwrap(),
            ProviderPaymentId::new("charge_123").unwrap(),
            500,
            "USD",
            t0(),
        )
    }

    #[test]
    fn record_starts_pending() {
        let payment = test_payment();
        assert_eq!(payment.status, PaymentStatus::Pending);
        assert!(payment.completed_at.is_none());
        assert_eq!(payment.amount_minor, 500);
    }

    #[test]
    fn complete_settles_once() {
        let mut payment = test_payment();
        payment.complete(t0().add_hours(1)).unwrap();

        assert_eq!(payment.status, PaymentStatus::Completed);
        assert_eq!(payment.completed_at, Some(t0().add_hours(1)));

        // Terminal: a second settlement attempt is rejected.
        assert!(payment.complete(t0().add_hours(2)).is_err());
        assert!(payment.fail().is_err());
    }

    #[test]
    fn fail_settles_once() {
        let mut payment = test_payment();
        payment.fail().unwrap();

        assert_eq!(payment.status, PaymentStatus::Failed);
        assert!(payment.completed_at.is_none());
        assert!(payment.complete(t0()).is_err());
    }

    #[test]
    fn matches_price_requires_exact_amount() {
        let payment = test_payment();
        assert!(payment.matches_price(500, "USD"));
        assert!(!payment.matches_price(499, "USD"));
        assert!(!payment.matches_price(50000, "USD"));
    }

    #[test]
    fn matches_price_compares_currency_case_insensitively() {
        let payment = test_payment();
        assert!(payment.matches_price(500, "usd"));
        assert!(!payment.matches_price(500, "EUR"));
    }
}
