//! StartHandler - Command handler for first contact / returning users.

use std::sync::Arc;

use crate::domain::account::{AccountError, SubscriptionStatus, User};
use crate::domain::foundation::{Timestamp, UserId};
use crate::ports::{InsertUserOutcome, PaymentLedger, UserRepository};

/// Command for a user opening a session with the service.
#[derive(Debug, Clone)]
pub struct StartCommand {
    pub user_id: UserId,
    /// Display name as reported by the front-end on this contact.
    pub display_name: Option<String>,
    pub now: Timestamp,
}

/// Status summary returned to the front-end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartResult {
    pub status: SubscriptionStatus,
    pub subscription_expires_at: Option<Timestamp>,
    pub trial_used: bool,
}

/// Handler for the start operation.
///
/// Creates the account row on first contact, refreshes the display name on
/// every contact, and reports the derived subscription status.
pub struct StartHandler {
    users: Arc<dyn UserRepository>,
    ledger: Arc<dyn PaymentLedger>,
}

impl StartHandler {
    pub fn new(users: Arc<dyn UserRepository>, ledger: Arc<dyn PaymentLedger>) -> Self {
        Self { users, ledger }
    }

    pub async fn handle(&self, cmd: StartCommand) -> Result<StartResult, AccountError> {
        let user = self.load_or_register(&cmd).await?;

        let has_paid = self.ledger.has_completed_payment(&cmd.user_id).await?;
        let status = SubscriptionStatus::derive(&user, has_paid, cmd.now);

        Ok(StartResult {
            status,
            subscription_expires_at: user.subscription_expires_at,
            trial_used: user.trial_used,
        })
    }

    async fn load_or_register(&self, cmd: &StartCommand) -> Result<User, AccountError> {
        if let Some(mut user) = self.users.find_by_id(&cmd.user_id).await? {
            if user.display_name != cmd.display_name {
                self.users
                    .update_display_name(&cmd.user_id, cmd.display_name.clone())
                    .await?;
                user.rename(cmd.display_name.clone());
            }
            return Ok(user);
        }

        let user = User::register(cmd.user_id, cmd.display_name.clone(), cmd.now);
        match self.users.insert(&user).await? {
            InsertUserOutcome::Inserted => {
                tracing::info!(user_id = %cmd.user_id, "registered new user");
                Ok(user)
            }
            InsertUserOutcome::AlreadyExists => {
                // Concurrent first contact: the other request's row wins.
                self.users
                    .find_by_id(&cmd.user_id)
                    .await?
                    .ok_or_else(|| AccountError::not_found(cmd.user_id))
            }
        }
    }
}
