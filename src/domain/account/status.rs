//! Derived subscription status.
//!
//! The status is computed from stored fields at read time, never persisted.
//! It exists for display only: access decisions go through `User::is_active`
//! directly so the gate cannot drift from the labels shown to users.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::Timestamp;

use super::User;

/// Display status of a user's subscription lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Never held access: trial unconsumed, no expiry set.
    New,

    /// Inside an access window opened by the one-time trial.
    TrialActive,

    /// Inside an access window reached via a completed payment.
    Subscribed,

    /// An access window was set and has lapsed.
    Expired,
}

impl SubscriptionStatus {
    /// Derives the display status from the user row and the ledger.
    ///
    /// `has_paid` reports whether the ledger holds any completed payment for
    /// this user; trial and paid access share one expiry clock, so the
    /// distinction cannot be read off the user row alone.
    pub fn derive(user: &User, has_paid: bool, now: Timestamp) -> Self {
        match user.subscription_expires_at {
            None => SubscriptionStatus::New,
            Some(expiry) if !expiry.is_after(&now) => SubscriptionStatus::Expired,
            Some(_) if has_paid => SubscriptionStatus::Subscribed,
            Some(_) if user.trial_used => SubscriptionStatus::TrialActive,
            // Active window without trial or payment cannot be produced by
            // this engine; label it as paid rather than inventing a state.
            Some(_) => SubscriptionStatus::Subscribed,
        }
    }

    /// Human-readable label for the front-end.
    pub fn display_name(&self) -> &'static str {
        match self {
            SubscriptionStatus::New => "new",
            SubscriptionStatus::TrialActive => "trial active",
            SubscriptionStatus::Subscribed => "subscribed",
            SubscriptionStatus::Expired => "expired",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::UserId;
    use chrono::Duration;

    fn t0() -> Timestamp {
        Timestamp::parse_rfc3339("2026-03-01T12:00:00Z").unwrap()
    }

    fn new_user() -> User {
        User::register(UserId::new(1).unwrap(), None, t0())
    }

    #[test]
    fn fresh_user_is_new() {
        let user = new_user();
        assert_eq!(
            SubscriptionStatus::derive(&user, false, t0()),
            SubscriptionStatus::New
        );
    }

    #[test]
    fn trial_window_shows_trial_active() {
        let mut user = new_user();
        user.grant_trial(Duration::days(1), t0()).unwrap();

        assert_eq!(
            SubscriptionStatus::derive(&user, false, t0().add_hours(1)),
            SubscriptionStatus::TrialActive
        );
    }

    #[test]
    fn paid_window_shows_subscribed() {
        let mut user = new_user();
        user.extend(Duration::days(30), t0());

        assert_eq!(
            SubscriptionStatus::derive(&user, true, t0().add_days(1)),
            SubscriptionStatus::Subscribed
        );
    }

    #[test]
    fn payment_after_trial_shows_subscribed() {
        let mut user = new_user();
        user.grant_trial(Duration::days(1), t0()).unwrap();
        user.extend(Duration::days(30), t0());

        assert_eq!(
            SubscriptionStatus::derive(&user, true, t0().add_days(1)),
            SubscriptionStatus::Subscribed
        );
    }

    #[test]
    fn lapsed_window_shows_expired() {
        let mut user = new_user();
        user.grant_trial(Duration::days(1), t0()).unwrap();

        assert_eq!(
            SubscriptionStatus::derive(&user, false, t0().add_days(2)),
            SubscriptionStatus::Expired
        );
    }

    #[test]
    fn boundary_instant_is_already_expired() {
        let mut user = new_user();
        user.extend(Duration::days(30), t0());
        let expiry = user.subscription_expires_at.unwrap();

        assert_eq!(
            SubscriptionStatus::derive(&user, true, expiry),
            SubscriptionStatus::Expired
        );
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&SubscriptionStatus::TrialActive).unwrap();
        assert_eq!(json, "\"trial_active\"");
    }
}
