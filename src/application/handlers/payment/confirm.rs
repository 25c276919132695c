//! ConfirmPaymentHandler - Command handler for provider payment confirmations.
//!
//! Turns an asynchronous payment notification into at most one subscription
//! extension. The idempotency key is the provider payment id; duplicate
//! deliveries are expected and benign, and come back as `AlreadyApplied`.

use std::sync::Arc;

use crate::config::BillingConfig;
use crate::domain::account::User;
use crate::domain::foundation::{PaymentId, ProviderPaymentId, Timestamp, UserId};
use crate::domain::payment::{Payment, PaymentError, PaymentStatus};
use crate::ports::{PaymentLedger, RecordOutcome, SettleOutcome, UserRepository};

/// Command carrying a confirmed charge.
#[derive(Debug, Clone)]
pub struct ConfirmPaymentCommand {
    pub provider_payment_id: ProviderPaymentId,
    pub user_id: UserId,
    pub amount_minor: i64,
    pub currency: String,
    pub now: Timestamp,
}

/// Outcome of reconciling one confirmation delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmPaymentResult {
    /// First-time success: payment settled, window extended.
    Applied { subscription_expires_at: Timestamp },
    /// This provider payment id already credited the user. No-op.
    AlreadyApplied,
    /// The charge was refused and recorded as failed.
    Rejected(RejectReason),
}

/// Why a confirmation was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    PriceMismatch {
        expected_minor: i64,
        actual_minor: i64,
    },
    CurrencyMismatch {
        expected: String,
        actual: String,
    },
    /// The same provider payment id already settled as failed.
    PreviouslyFailed,
}

/// Handler for payment confirmations.
pub struct ConfirmPaymentHandler {
    users: Arc<dyn UserRepository>,
    ledger: Arc<dyn PaymentLedger>,
    billing: BillingConfig,
}

impl ConfirmPaymentHandler {
    pub fn new(
        users: Arc<dyn UserRepository>,
        ledger: Arc<dyn PaymentLedger>,
        billing: BillingConfig,
    ) -> Self {
        Self {
            users,
            ledger,
            billing,
        }
    }

    pub async fn handle(
        &self,
        cmd: ConfirmPaymentCommand,
    ) -> Result<ConfirmPaymentResult, PaymentError> {
        self.ensure_user_exists(&cmd).await?;

        let payment = Payment::record(
            PaymentId::new(),
            cmd.user_id,
            cmd.provider_payment_id.clone(),
            cmd.amount_minor,
            cmd.currency.clone(),
            cmd.now,
        );

        let payment = match self.ledger.record_pending(&payment).await? {
            RecordOutcome::Recorded => payment,
            RecordOutcome::Duplicate(existing) => match existing.status {
                PaymentStatus::Completed => {
                    // Duplicate webhook delivery: expected, benign.
                    tracing::info!(
                        provider_payment_id = %cmd.provider_payment_id,
                        "duplicate confirmation for settled payment"
                    );
                    return Ok(ConfirmPaymentResult::AlreadyApplied);
                }
                PaymentStatus::Failed => {
                    return Ok(ConfirmPaymentResult::Rejected(RejectReason::PreviouslyFailed));
                }
                // A pending row means a prior delivery crashed between
                // insert and settlement, or is racing us right now; resume
                // it. The conditional settlement below keeps this safe.
                PaymentStatus::Pending => existing,
            },
        };

        if let Some(reason) = self.validate_price(&payment) {
            self.ledger.mark_failed(&payment.id).await?;
            tracing::warn!(
                provider_payment_id = %cmd.provider_payment_id,
                "payment rejected: {:?}", reason
            );
            return Ok(ConfirmPaymentResult::Rejected(reason));
        }

        match self
            .ledger
            .complete_and_extend(
                &payment.id,
                &cmd.user_id,
                self.billing.subscription_duration(),
                cmd.now,
            )
            .await?
        {
            SettleOutcome::Applied { new_expiry } => {
                tracing::info!(
                    user_id = %cmd.user_id,
                    provider_payment_id = %cmd.provider_payment_id,
                    expires_at = %new_expiry,
                    "payment applied"
                );
                Ok(ConfirmPaymentResult::Applied {
                    subscription_expires_at: new_expiry,
                })
            }
            SettleOutcome::AlreadySettled { status } => match status {
                PaymentStatus::Completed => Ok(ConfirmPaymentResult::AlreadyApplied),
                _ => Ok(ConfirmPaymentResult::Rejected(RejectReason::PreviouslyFailed)),
            },
        }
    }

    fn validate_price(&self, payment: &Payment) -> Option<RejectReason> {
        if payment.amount_minor != self.billing.subscription_price_minor {
            return Some(RejectReason::PriceMismatch {
                expected_minor: self.billing.subscription_price_minor,
                actual_minor: payment.amount_minor,
            });
        }
        if !payment.currency.eq_ignore_ascii_case(&self.billing.currency) {
            return Some(RejectReason::CurrencyMismatch {
                expected: self.billing.currency.clone(),
                actual: payment.currency.clone(),
            });
        }
        None
    }

    async fn ensure_user_exists(&self, cmd: &ConfirmPaymentCommand) -> Result<(), PaymentError> {
        if self
            .users
            .find_by_id(&cmd.user_id)
            .await
            .map_err(|e| PaymentError::infrastructure(e.to_string()))?
            .is_none()
        {
            // A payment can land before any start command; create the row so
            // the credit has somewhere to go. Races are resolved by the
            // store's identity constraint.
            let user = User::register(cmd.user_id, None, cmd.now);
            self.users
                .insert(&user)
                .await
                .map_err(|e| PaymentError::infrastructure(e.to_string()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStore;

    fn t0() -> Timestamp {
        Timestamp::parse_rfc3339("2026-03-01T12:00:00Z").unwrap()
    }

    fn user_id() -> UserId {
        UserId::new(42).unwrap()
    }

    fn handler(store: &Arc<InMemoryStore>) -> ConfirmPaymentHandler {
        ConfirmPaymentHandler::new(store.clone(), store.clone(), BillingConfig::default())
    }

    fn confirm_cmd(provider_id: &str, amount: i64, currency: &str, now: Timestamp) -> ConfirmPaymentCommand {
        ConfirmPaymentCommand {
            provider_payment_id: ProviderPaymentId::new(provider_id).unwrap(),
            user_id: user_id(),
            amount_minor: amount,
            currency: currency.to_string(),
            now,
        }
    }

    #[tokio::test]
    async fn first_confirmation_applies_and_extends() {
        let store = Arc::new(InMemoryStore::new());
        let handler = handler(&store);

        let result = handler
            .handle(confirm_cmd("pay-1", 500, "USD", t0()))
            .await
            .unwrap();

        assert_eq!(
            result,
            ConfirmPaymentResult::Applied {
                subscription_expires_at: t0().add_days(30)
            }
        );

        let user = store.find_by_id(&user_id()).await.unwrap().unwrap();
        assert_eq!(user.subscription_expires_at, Some(t0().add_days(30)));
        assert!(store.has_completed_payment(&user_id()).await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_confirmation_is_already_applied() {
        let store = Arc::new(InMemoryStore::new());
        let handler = handler(&store);

        handler
            .handle(confirm_cmd("pay-1", 500, "USD", t0()))
            .await
            .unwrap();

        // Same id redelivered an hour later.
        let result = handler
            .handle(confirm_cmd("pay-1", 500, "USD", t0().add_hours(1)))
            .await
            .unwrap();

        assert_eq!(result, ConfirmPaymentResult::AlreadyApplied);

        // Expiry advanced exactly once.
        let user = store.find_by_id(&user_id()).await.unwrap().unwrap();
        assert_eq!(user.subscription_expires_at, Some(t0().add_days(30)));
    }

    #[tokio::test]
    async fn replay_any_number_of_times_applies_once() {
        let store = Arc::new(InMemoryStore::new());
        let handler = handler(&store);

        let mut applied = 0;
        for i in 0..5 {
            let result = handler
                .handle(confirm_cmd("pay-1", 500, "USD", t0().add_hours(i)))
                .await
                .unwrap();
            if matches!(result, ConfirmPaymentResult::Applied { .. }) {
                applied += 1;
            }
        }

        assert_eq!(applied, 1);
        let user = store.find_by_id(&user_id()).await.unwrap().unwrap();
        assert_eq!(user.subscription_expires_at, Some(t0().add_days(30)));
    }

    #[tokio::test]
    async fn second_payment_stacks_on_remaining_time() {
        let store = Arc::new(InMemoryStore::new());
        let handler = handler(&store);

        // First payment at t0 buys 30 days.
        handler
            .handle(confirm_cmd("pay-1", 500, "USD", t0()))
            .await
            .unwrap();

        // Second payment five days in stacks on the remaining window.
        let result = handler
            .handle(confirm_cmd("pay-2", 500, "USD", t0().add_days(5)))
            .await
            .unwrap();

        assert_eq!(
            result,
            ConfirmPaymentResult::Applied {
                subscription_expires_at: t0().add_days(60)
            }
        );
    }

    #[tokio::test]
    async fn price_mismatch_is_rejected_and_recorded_failed() {
        let store = Arc::new(InMemoryStore::new());
        let handler = handler(&store);

        let result = handler
            .handle(confirm_cmd("pay-1", 100, "USD", t0()))
            .await
            .unwrap();

        assert_eq!(
            result,
            ConfirmPaymentResult::Rejected(RejectReason::PriceMismatch {
                expected_minor: 500,
                actual_minor: 100,
            })
        );

        // No access was granted; the row settled as failed.
        let user = store.find_by_id(&user_id()).await.unwrap().unwrap();
        assert!(user.subscription_expires_at.is_none());
        let stored = store
            .find_by_provider_id(&ProviderPaymentId::new("pay-1").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, PaymentStatus::Failed);
    }

    #[tokio::test]
    async fn currency_mismatch_is_rejected() {
        let store = Arc::new(InMemoryStore::new());
        let handler = handler(&store);

        let result = handler
            .handle(confirm_cmd("pay-1", 500, "EUR", t0()))
            .await
            .unwrap();

        assert!(matches!(
            result,
            ConfirmPaymentResult::Rejected(RejectReason::CurrencyMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn redelivery_of_failed_payment_stays_rejected() {
        let store = Arc::new(InMemoryStore::new());
        let handler = handler(&store);

        handler
            .handle(confirm_cmd("pay-1", 100, "USD", t0()))
            .await
            .unwrap();

        // Redelivery with the corrected amount must not resurrect the row.
        let result = handler
            .handle(confirm_cmd("pay-1", 500, "USD", t0().add_hours(1)))
            .await
            .unwrap();

        assert_eq!(
            result,
            ConfirmPaymentResult::Rejected(RejectReason::PreviouslyFailed)
        );
        let user = store.find_by_id(&user_id()).await.unwrap().unwrap();
        assert!(user.subscription_expires_at.is_none());
    }

    #[tokio::test]
    async fn confirmation_for_unknown_user_creates_the_account() {
        let store = Arc::new(InMemoryStore::new());
        let handler = handler(&store);

        assert!(store.find_by_id(&user_id()).await.unwrap().is_none());

        let result = handler
            .handle(confirm_cmd("pay-1", 500, "USD", t0()))
            .await
            .unwrap();

        assert!(matches!(result, ConfirmPaymentResult::Applied { .. }));
        assert!(store.find_by_id(&user_id()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn concurrent_duplicate_deliveries_apply_once() {
        let store = Arc::new(InMemoryStore::new());
        let handler = Arc::new(handler(&store));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let handler = handler.clone();
                tokio::spawn(async move {
                    handler
                        .handle(confirm_cmd("pay-1", 500, "USD", t0()))
                        .await
                        .unwrap()
                })
            })
            .collect();

        let results = futures::future::join_all(tasks).await;
        let applied = results
            .into_iter()
            .map(|r| r.unwrap())
            .filter(|r| matches!(r, ConfirmPaymentResult::Applied { .. }))
            .count();

        assert_eq!(applied, 1, "exactly one delivery may extend the window");

        let user = store.find_by_id(&user_id()).await.unwrap().unwrap();
        assert_eq!(user.subscription_expires_at, Some(t0().add_days(30)));
    }
}
