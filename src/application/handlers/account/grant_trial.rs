//! GrantTrialHandler - Command handler for the one-time trial grant.

use std::sync::Arc;

use chrono::Duration;

use crate::domain::account::{AccountError, User};
use crate::domain::foundation::{Timestamp, UserId};
use crate::ports::{InsertUserOutcome, TrialGrantOutcome, UserRepository};

/// Command to consume the one-time trial.
#[derive(Debug, Clone)]
pub struct GrantTrialCommand {
    pub user_id: UserId,
    pub now: Timestamp,
}

/// Result of a trial request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrantTrialResult {
    /// Trial granted; the access window is open until `expires_at`.
    Applied { expires_at: Timestamp },
    /// The trial was already consumed. Repeated clicks land here.
    AlreadyUsedTrial,
}

/// Handler for trial requests.
///
/// The set-once guard lives in the store (compare-and-set on `trial_used`),
/// so two concurrent requests produce exactly one `Applied` even across
/// worker instances.
pub struct GrantTrialHandler {
    users: Arc<dyn UserRepository>,
    trial_duration: Duration,
}

impl GrantTrialHandler {
    pub fn new(users: Arc<dyn UserRepository>, trial_duration: Duration) -> Self {
        Self {
            users,
            trial_duration,
        }
    }

    pub async fn handle(&self, cmd: GrantTrialCommand) -> Result<GrantTrialResult, AccountError> {
        let mut user = match self.users.find_by_id(&cmd.user_id).await? {
            Some(user) => user,
            None => {
                // Trial tapped before any start command: create the row.
                let user = User::register(cmd.user_id, None, cmd.now);
                if let InsertUserOutcome::AlreadyExists = self.users.insert(&user).await? {
                    self.users
                        .find_by_id(&cmd.user_id)
                        .await?
                        .ok_or_else(|| AccountError::not_found(cmd.user_id))?
                } else {
                    user
                }
            }
        };

        // Compute the window through the aggregate, then persist through the
        // store's compare-and-set so a concurrent grant cannot double-apply.
        if user.grant_trial(self.trial_duration, cmd.now).is_err() {
            return Ok(GrantTrialResult::AlreadyUsedTrial);
        }
        let expires_at = user
            .subscription_expires_at
            .expect("trial grant always sets the window");

        match self.users.grant_trial(&cmd.user_id, expires_at).await? {
            TrialGrantOutcome::Granted => {
                tracing::info!(user_id = %cmd.user_id, %expires_at, "trial granted");
                Ok(GrantTrialResult::Applied { expires_at })
            }
            TrialGrantOutcome::AlreadyUsed => Ok(GrantTrialResult::AlreadyUsedTrial),
        }
    }
}
