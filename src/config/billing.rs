//! Billing configuration

use chrono::Duration;
use serde::Deserialize;

use super::error::ValidationError;

fn default_price_minor() -> i64 {
    500
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_subscription_days() -> i64 {
    30
}

fn default_trial_hours() -> i64 {
    24
}

/// Billing configuration: the single subscription price and the two
/// access-window durations.
#[derive(Debug, Clone, Deserialize)]
pub struct BillingConfig {
    /// Subscription price in minor units (cents).
    #[serde(default = "default_price_minor")]
    pub subscription_price_minor: i64,

    /// ISO currency code the provider charges in.
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Days of access one completed payment buys.
    #[serde(default = "default_subscription_days")]
    pub subscription_duration_days: i64,

    /// Hours of access the one-time trial grants.
    #[serde(default = "default_trial_hours")]
    pub trial_duration_hours: i64,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            subscription_price_minor: default_price_minor(),
            currency: default_currency(),
            subscription_duration_days: default_subscription_days(),
            trial_duration_hours: default_trial_hours(),
        }
    }
}

impl BillingConfig {
    /// Access window bought by one completed payment.
    pub fn subscription_duration(&self) -> Duration {
        Duration::days(self.subscription_duration_days)
    }

    /// Access window granted by the one-time trial.
    pub fn trial_duration(&self) -> Duration {
        Duration::hours(self.trial_duration_hours)
    }

    /// Validate billing configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.subscription_price_minor <= 0 {
            return Err(ValidationError::InvalidPrice);
        }
        if self.currency.len() != 3 || !self.currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ValidationError::InvalidCurrency);
        }
        if self.subscription_duration_days <= 0 || self.trial_duration_hours <= 0 {
            return Err(ValidationError::InvalidDuration);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_service_pricing() {
        let config = BillingConfig::default();
        assert_eq!(config.subscription_price_minor, 500);
        assert_eq!(config.currency, "USD");
        assert_eq!(config.subscription_duration(), Duration::days(30));
        assert_eq!(config.trial_duration(), Duration::hours(24));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validation_rejects_non_positive_price() {
        let config = BillingConfig {
            subscription_price_minor: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidPrice));
    }

    #[test]
    fn validation_rejects_malformed_currency() {
        let config = BillingConfig {
            currency: "US".to_string(),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidCurrency));

        let config = BillingConfig {
            currency: "U5D".to_string(),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidCurrency));
    }

    #[test]
    fn validation_rejects_non_positive_durations() {
        let config = BillingConfig {
            subscription_duration_days: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidDuration));

        let config = BillingConfig {
            trial_duration_hours: -1,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidDuration));
    }
}
