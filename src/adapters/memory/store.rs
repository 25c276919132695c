//! In-memory implementation of all three storage ports.
//!
//! One store, one lock: every port method takes the same `RwLock`, which
//! gives the cross-entity atomicity `complete_and_extend` requires for free
//! and serializes same-user mutations exactly like a row lock would.
//! Uniqueness constraints are checked inside the lock, mirroring the schema
//! constraints the PostgreSQL adapter relies on.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Duration;
use tokio::sync::RwLock;

use crate::domain::account::User;
use crate::domain::credential::{ProxyCredential, ProxySecret};
use crate::domain::foundation::{
    DomainError, EndpointId, ErrorCode, PaymentId, ProviderPaymentId, Timestamp, UserId,
};
use crate::domain::payment::{Payment, PaymentStatus};
use crate::ports::{
    CredentialInsertOutcome, CredentialRepository, CredentialRotateOutcome, InsertUserOutcome,
    PaymentLedger, RecordOutcome, SecretReplacement, SettleOutcome, TrialGrantOutcome,
    UserRepository,
};

#[derive(Default)]
struct State {
    users: HashMap<UserId, User>,
    payments: Vec<Payment>,
    credentials: Vec<ProxyCredential>,
}

/// Shared in-memory store implementing all storage ports.
#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn insert(&self, user: &User) -> Result<InsertUserOutcome, DomainError> {
        let mut state = self.state.write().await;
        if state.users.contains_key(&user.id) {
            return Ok(InsertUserOutcome::AlreadyExists);
        }
        state.users.insert(user.id, user.clone());
        Ok(InsertUserOutcome::Inserted)
    }

    async fn find_by_id(&self, user_id: &UserId) -> Result<Option<User>, DomainError> {
        let state = self.state.read().await;
        Ok(state.users.get(user_id).cloned())
    }

    async fn update_display_name(
        &self,
        user_id: &UserId,
        display_name: Option<String>,
    ) -> Result<(), DomainError> {
        let mut state = self.state.write().await;
        let user = state
            .users
            .get_mut(user_id)
            .ok_or_else(|| DomainError::new(ErrorCode::UserNotFound, "User not found"))?;
        user.rename(display_name);
        Ok(())
    }

    async fn grant_trial(
        &self,
        user_id: &UserId,
        expires_at: Timestamp,
    ) -> Result<TrialGrantOutcome, DomainError> {
        let mut state = self.state.write().await;
        let user = state
            .users
            .get_mut(user_id)
            .ok_or_else(|| DomainError::new(ErrorCode::UserNotFound, "User not found"))?;
        if user.trial_used {
            return Ok(TrialGrantOutcome::AlreadyUsed);
        }
        user.trial_used = true;
        user.subscription_expires_at = Some(expires_at);
        Ok(TrialGrantOutcome::Granted)
    }
}

#[async_trait]
impl PaymentLedger for InMemoryStore {
    async fn record_pending(&self, payment: &Payment) -> Result<RecordOutcome, DomainError> {
        let mut state = self.state.write().await;
        if let Some(existing) = state
            .payments
            .iter()
            .find(|p| p.provider_payment_id == payment.provider_payment_id)
        {
            return Ok(RecordOutcome::Duplicate(existing.clone()));
        }
        state.payments.push(payment.clone());
        Ok(RecordOutcome::Recorded)
    }

    async fn mark_failed(&self, payment_id: &PaymentId) -> Result<(), DomainError> {
        let mut state = self.state.write().await;
        let payment = state
            .payments
            .iter_mut()
            .find(|p| &p.id == payment_id)
            .ok_or_else(|| DomainError::new(ErrorCode::PaymentNotFound, "Payment not found"))?;
        if payment.status == PaymentStatus::Pending {
            payment
                .fail()
                .map_err(|e| DomainError::new(ErrorCode::InternalError, e.to_string()))?;
        }
        // Settled rows are left untouched.
        Ok(())
    }

    async fn complete_and_extend(
        &self,
        payment_id: &PaymentId,
        user_id: &UserId,
        duration: Duration,
        now: Timestamp,
    ) -> Result<SettleOutcome, DomainError> {
        // Single write lock covers both entities: the settlement and the
        // extension land together or not at all.
        let mut state = self.state.write().await;

        let status = state
            .payments
            .iter()
            .find(|p| &p.id == payment_id)
            .map(|p| p.status)
            .ok_or_else(|| DomainError::new(ErrorCode::PaymentNotFound, "Payment not found"))?;
        if status != PaymentStatus::Pending {
            return Ok(SettleOutcome::AlreadySettled { status });
        }

        if !state.users.contains_key(user_id) {
            return Err(DomainError::new(ErrorCode::UserNotFound, "User not found"));
        }

        let payment = state
            .payments
            .iter_mut()
            .find(|p| &p.id == payment_id)
            .expect("payment row checked above");
        payment
            .complete(now)
            .map_err(|e| DomainError::new(ErrorCode::InternalError, e.to_string()))?;

        let user = state.users.get_mut(user_id).expect("user row checked above");
        let new_expiry = user.extend(duration, now);

        Ok(SettleOutcome::Applied { new_expiry })
    }

    async fn find_by_provider_id(
        &self,
        provider_payment_id: &ProviderPaymentId,
    ) -> Result<Option<Payment>, DomainError> {
        let state = self.state.read().await;
        Ok(state
            .payments
            .iter()
            .find(|p| &p.provider_payment_id == provider_payment_id)
            .cloned())
    }

    async fn has_completed_payment(&self, user_id: &UserId) -> Result<bool, DomainError> {
        let state = self.state.read().await;
        Ok(state
            .payments
            .iter()
            .any(|p| &p.user_id == user_id && p.status == PaymentStatus::Completed))
    }
}

#[async_trait]
impl CredentialRepository for InMemoryStore {
    async fn find(
        &self,
        user_id: &UserId,
        endpoint_id: &EndpointId,
    ) -> Result<Option<ProxyCredential>, DomainError> {
        let state = self.state.read().await;
        Ok(state
            .credentials
            .iter()
            .find(|c| &c.user_id == user_id && &c.endpoint_id == endpoint_id)
            .cloned())
    }

    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<ProxyCredential>, DomainError> {
        let state = self.state.read().await;
        // Insertion order doubles as issued-at order here.
        Ok(state
            .credentials
            .iter()
            .filter(|c| &c.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn insert(
        &self,
        credential: &ProxyCredential,
    ) -> Result<CredentialInsertOutcome, DomainError> {
        let mut state = self.state.write().await;
        if let Some(existing) = state
            .credentials
            .iter()
            .find(|c| c.user_id == credential.user_id && c.endpoint_id == credential.endpoint_id)
        {
            return Ok(CredentialInsertOutcome::PairExists(existing.clone()));
        }
        if state.credentials.iter().any(|c| c.secret == credential.secret) {
            return Ok(CredentialInsertOutcome::SecretCollision);
        }
        state.credentials.push(credential.clone());
        Ok(CredentialInsertOutcome::Inserted)
    }

    async fn rotate_all(
        &self,
        user_id: &UserId,
        replacements: &[SecretReplacement],
        rotated_at: Timestamp,
    ) -> Result<CredentialRotateOutcome, DomainError> {
        let mut state = self.state.write().await;

        let replaced_ids: Vec<_> = replacements.iter().map(|r| r.credential_id).collect();

        // Global uniqueness check against rows outside the batch, plus
        // within the batch itself - all before any mutation.
        for (i, replacement) in replacements.iter().enumerate() {
            let collides_outside = state
                .credentials
                .iter()
                .any(|c| !replaced_ids.contains(&c.id) && c.secret == replacement.secret);
            let collides_inside = replacements[..i]
                .iter()
                .any(|other| other.secret == replacement.secret);
            if collides_outside || collides_inside {
                return Ok(CredentialRotateOutcome::SecretCollision);
            }
        }

        let mut updated = Vec::with_capacity(replacements.len());
        for replacement in replacements {
            let row = state
                .credentials
                .iter_mut()
                .find(|c| &c.user_id == user_id && c.id == replacement.credential_id)
                .ok_or_else(|| {
                    DomainError::new(ErrorCode::CredentialNotFound, "Credential not found")
                })?;
            row.rotate(replacement.secret.clone(), rotated_at);
            updated.push(row.clone());
        }
        Ok(CredentialRotateOutcome::Rotated(updated))
    }

    async fn find_by_secret(
        &self,
        secret: &ProxySecret,
    ) -> Result<Option<ProxyCredential>, DomainError> {
        let state = self.state.read().await;
        Ok(state.credentials.iter().find(|c| &c.secret == secret).cloned())
    }
}
