//! PrecheckHandler - Query handler for the provider's pre-charge check.
//!
//! The provider calls this synchronously before finalizing the charge, under
//! a tight timeout. It validates shape and price only and mutates nothing;
//! the durable work happens later in `ConfirmPaymentHandler`.

use crate::config::BillingConfig;
use crate::domain::foundation::ProviderPaymentId;

/// Query carrying the charge the provider is about to finalize.
#[derive(Debug, Clone)]
pub struct PrecheckCommand {
    /// Raw provider payment id; validated here, so it arrives as a string.
    pub provider_payment_id: String,
    pub amount_minor: i64,
    pub currency: String,
}

/// Answer returned to the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrecheckResult {
    /// Charge may proceed.
    Accept,
    /// Charge must be failed by the provider.
    Reject(PrecheckRejectReason),
}

/// Why the charge was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrecheckRejectReason {
    MalformedPaymentId,
    PriceMismatch {
        expected_minor: i64,
        actual_minor: i64,
    },
    CurrencyMismatch {
        expected: String,
        actual: String,
    },
}

/// Handler for payment prechecks. Pure: holds configuration only.
pub struct PrecheckHandler {
    billing: BillingConfig,
}

impl PrecheckHandler {
    pub fn new(billing: BillingConfig) -> Self {
        Self { billing }
    }

    pub fn handle(&self, cmd: PrecheckCommand) -> PrecheckResult {
        if ProviderPaymentId::new(cmd.provider_payment_id.clone()).is_err() {
            return PrecheckResult::Reject(PrecheckRejectReason::MalformedPaymentId);
        }
        if cmd.amount_minor != self.billing.subscription_price_minor {
            tracing::warn!(
                expected = self.billing.subscription_price_minor,
                actual = cmd.amount_minor,
                "precheck rejected: price mismatch"
            );
            return PrecheckResult::Reject(PrecheckRejectReason::PriceMismatch {
                expected_minor: self.billing.subscription_price_minor,
                actual_minor: cmd.amount_minor,
            });
        }
        if !cmd.currency.eq_ignore_ascii_case(&self.billing.currency) {
            tracing::warn!(
                expected = %self.billing.currency,
                actual = %cmd.currency,
                "precheck rejected: currency mismatch"
            );
            return PrecheckResult::Reject(PrecheckRejectReason::CurrencyMismatch {
                expected: self.billing.currency.clone(),
                actual: cmd.currency,
            });
        }
        PrecheckResult::Accept
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handler() -> PrecheckHandler {
        PrecheckHandler::new(BillingConfig::default())
    }

    fn cmd(id: &str, amount: i64, currency: &str) -> PrecheckCommand {
        PrecheckCommand {
            provider_payment_id: id.to_string(),
            amount_minor: amount,
            currency: currency.to_string(),
        }
    }

    #[test]
    fn accepts_expected_price_and_currency() {
        let result = handler().handle(cmd("charge_1", 500, "USD"));
        assert_eq!(result, PrecheckResult::Accept);
    }

    #[test]
    fn accepts_lowercase_currency() {
        let result = handler().handle(cmd("charge_1", 500, "usd"));
        assert_eq!(result, PrecheckResult::Accept);
    }

    #[test]
    fn rejects_empty_payment_id() {
        let result = handler().handle(cmd("", 500, "USD"));
        assert_eq!(
            result,
            PrecheckResult::Reject(PrecheckRejectReason::MalformedPaymentId)
        );
    }

    #[test]
    fn rejects_wrong_amount_with_both_values() {
        let result = handler().handle(cmd("charge_1", 499, "USD"));
        assert_eq!(
            result,
            PrecheckResult::Reject(PrecheckRejectReason::PriceMismatch {
                expected_minor: 500,
                actual_minor: 499,
            })
        );
    }

    #[test]
    fn rejects_wrong_currency() {
        let result = handler().handle(cmd("charge_1", 500, "EUR"));
        assert!(matches!(
            result,
            PrecheckResult::Reject(PrecheckRejectReason::CurrencyMismatch { .. })
        ));
    }
}
