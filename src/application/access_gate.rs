//! Access gate - the single authorization chokepoint.
//!
//! Every privileged operation (config retrieval, refresh) calls the gate
//! before touching the credential issuer. The issuer performs no access check
//! of its own; composing through the gate is a hard contract, not a
//! convenience.
//!
//! # Design
//!
//! The gate follows a **fail-secure** design: a user with no account row and
//! a user whose window has lapsed are both denied, with distinct reasons so
//! the front-end can render the right call to action. The decision is
//! computed from `User::is_active` directly - never from the display status,
//! which could drift from the access rule.

use serde::{Deserialize, Serialize};

use crate::domain::account::User;
use crate::domain::foundation::Timestamp;

/// The gate itself. Stateless: the decision is a pure function of the user
/// row and the clock.
pub struct AccessGate;

/// Result of an access check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    /// Access is granted.
    Allow,
    /// Access is denied with a specific reason.
    Deny(DenyReason),
}

impl AccessDecision {
    /// Returns true if access is allowed.
    pub fn is_allowed(&self) -> bool {
        matches!(self, AccessDecision::Allow)
    }

    /// Converts the decision to a Result type, with denial becoming an error.
    pub fn into_result(self) -> Result<(), DenyReason> {
        match self {
            AccessDecision::Allow => Ok(()),
            AccessDecision::Deny(reason) => Err(reason),
        }
    }
}

/// Reason why access was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// No access window was ever set for this user.
    NoSubscription,

    /// An access window was set and has lapsed.
    Expired,
}

impl DenyReason {
    /// Get a user-facing message for the denial reason.
    pub fn user_message(&self) -> &'static str {
        match self {
            DenyReason::NoSubscription => {
                "You don't have an active subscription. Subscribe or start a free trial to get access."
            }
            DenyReason::Expired => {
                "Your subscription has expired. Renew to restore access."
            }
        }
    }
}

impl std::fmt::Display for DenyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.user_message())
    }
}

impl AccessGate {
    /// Checks whether the user may reach privileged operations at `now`.
    pub fn check(user: &User, now: Timestamp) -> AccessDecision {
        if user.is_active(now) {
            return AccessDecision::Allow;
        }
        match user.subscription_expires_at {
            Some(_) => AccessDecision::Deny(DenyReason::Expired),
            None => AccessDecision::Deny(DenyReason::NoSubscription),
        }
    }

    /// Decision for a user with no account row at all.
    ///
    /// Fail-secure: an unknown identity is treated exactly like a known user
    /// who never subscribed.
    pub fn check_absent() -> AccessDecision {
        AccessDecision::Deny(DenyReason::NoSubscription)
    }
}
