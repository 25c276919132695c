//! User aggregate entity.
//!
//! The User aggregate holds one user's identity and access window. Trial and
//! paid access share a single expiry clock (`subscription_expires_at`); the
//! trial/paid distinction is reconstructed for display from `trial_used` and
//! the payment ledger, never from a second expiry field.
//!
//! # Invariants
//!
//! - `id` is the external identity, immutable and unique
//! - `trial_used` transitions false -> true exactly once, coincident with the
//!   only trial grant
//! - `subscription_expires_at` only ever increases, and only via `extend` or
//!   the trial grant

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Timestamp, UserId};

use super::AccountError;

/// User aggregate - one row per distinct external identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// External identity, immutable.
    pub id: UserId,

    /// Display name reported by the front-end; informational only.
    pub display_name: Option<String>,

    /// When the user first contacted the service.
    pub created_at: Timestamp,

    /// Whether the one-time trial has been consumed. Never reverts.
    pub trial_used: bool,

    /// End of the current access window. Absent or past value means no
    /// active access.
    pub subscription_expires_at: Option<Timestamp>,
}

impl User {
    /// Creates a new user record at first contact.
    pub fn register(id: UserId, display_name: Option<String>, now: Timestamp) -> Self {
        Self {
            id,
            display_name,
            created_at: now,
            trial_used: false,
            subscription_expires_at: None,
        }
    }

    /// Grants the one-time trial window.
    ///
    /// Sets `trial_used` and starts the access window at `now + duration`.
    /// A second call is rejected, not silently repeated.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyUsedTrial` if the trial was already consumed.
    pub fn grant_trial(&mut self, duration: Duration, now: Timestamp) -> Result<(), AccountError> {
        if self.trial_used {
            return Err(AccountError::AlreadyUsedTrial(self.id));
        }
        self.trial_used = true;
        self.subscription_expires_at = Some(now.plus(duration));
        Ok(())
    }

    /// Extends the access window by `duration`.
    ///
    /// Renewal stacks on remaining time: the new expiry is
    /// `max(current_expiry, now) + duration`, so an extension never shortens
    /// access. This is the only path that increases the window; at-most-once
    /// application per payment is enforced by the payment ledger, not here.
    pub fn extend(&mut self, duration: Duration, now: Timestamp) -> Timestamp {
        let base = match self.subscription_expires_at {
            Some(expiry) if expiry.is_after(&now) => expiry,
            _ => now,
        };
        let new_expiry = base.plus(duration);
        self.subscription_expires_at = Some(new_expiry);
        new_expiry
    }

    /// Whether the user holds an active access window at `now`.
    ///
    /// Strict comparison: access has already lapsed when
    /// `now == subscription_expires_at`.
    pub fn is_active(&self, now: Timestamp) -> bool {
        match self.subscription_expires_at {
            Some(expiry) => expiry.is_after(&now),
            None => false,
        }
    }

    /// Updates the informational display name.
    pub fn rename(&mut self, display_name: Option<String>) {
        self.display_name = display_name;
    }
}
