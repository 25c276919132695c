//! LifecycleEngine - the narrow interface the transport collaborator calls.
//!
//! The engine exposes a closed set of outcome-typed operations; the bot or
//! webhook transport maps its own event types onto this fixed set, keeping
//! the engine free of any transport-specific type. Configuration is injected
//! at construction - there are no process-wide settings.

use std::sync::Arc;

use crate::config::{BillingConfig, Endpoint};
use crate::domain::foundation::{DomainError, ProviderPaymentId, Timestamp, UserId};
use crate::ports::{CredentialRepository, PaymentLedger, UserRepository};

use super::credential_issuer::CredentialIssuer;
use super::handlers::account::{
    GrantTrialCommand, GrantTrialHandler, GrantTrialResult, StartCommand, StartHandler, StartResult,
};
use super::handlers::payment::{
    ConfirmPaymentCommand, ConfirmPaymentHandler, ConfirmPaymentResult, PrecheckCommand,
    PrecheckHandler, PrecheckResult,
};
use super::handlers::proxy::{
    GetConfigCommand, GetConfigHandler, GetConfigResult, RefreshConfigCommand,
    RefreshConfigHandler, RefreshConfigResult,
};

/// Facade composing every lifecycle operation.
pub struct LifecycleEngine {
    endpoints: Vec<Endpoint>,
    start: StartHandler,
    grant_trial: GrantTrialHandler,
    precheck: PrecheckHandler,
    confirm: ConfirmPaymentHandler,
    get_config: GetConfigHandler,
    refresh_config: RefreshConfigHandler,
}

impl LifecycleEngine {
    /// Wires the handlers over the given ports and configuration.
    pub fn new(
        billing: BillingConfig,
        endpoints: Vec<Endpoint>,
        users: Arc<dyn UserRepository>,
        ledger: Arc<dyn PaymentLedger>,
        credentials: Arc<dyn CredentialRepository>,
    ) -> Self {
        Self {
            endpoints,
            start: StartHandler::new(users.clone(), ledger.clone()),
            grant_trial: GrantTrialHandler::new(users.clone(), billing.trial_duration()),
            precheck: PrecheckHandler::new(billing.clone()),
            confirm: ConfirmPaymentHandler::new(users.clone(), ledger, billing),
            get_config: GetConfigHandler::new(
                users.clone(),
                CredentialIssuer::new(credentials.clone()),
            ),
            refresh_config: RefreshConfigHandler::new(users, CredentialIssuer::new(credentials)),
        }
    }

    /// First contact / returning user: upserts the account row and reports a
    /// status summary.
    pub async fn on_start(
        &self,
        user_identity: i64,
        display_name: Option<String>,
        now: Timestamp,
    ) -> Result<StartResult, DomainError> {
        let user_id = UserId::new(user_identity)?;
        self.start
            .handle(StartCommand {
                user_id,
                display_name,
                now,
            })
            .await
            .map_err(Into::into)
    }

    /// One-time trial request.
    pub async fn on_trial_request(
        &self,
        user_identity: i64,
        now: Timestamp,
    ) -> Result<GrantTrialResult, DomainError> {
        let user_id = UserId::new(user_identity)?;
        self.grant_trial
            .handle(GrantTrialCommand { user_id, now })
            .await
            .map_err(Into::into)
    }

    /// Privileged: returns the proxy configuration view for the configured
    /// endpoints, creating missing credentials lazily.
    pub async fn on_config_request(
        &self,
        user_identity: i64,
        now: Timestamp,
    ) -> Result<GetConfigResult, DomainError> {
        let user_id = UserId::new(user_identity)?;
        self.get_config
            .handle(GetConfigCommand {
                user_id,
                endpoints: self.endpoints.clone(),
                now,
            })
            .await
            .map_err(Into::into)
    }

    /// Privileged: rotates every credential the user holds.
    pub async fn on_refresh_request(
        &self,
        user_identity: i64,
        now: Timestamp,
    ) -> Result<RefreshConfigResult, DomainError> {
        let user_id = UserId::new(user_identity)?;
        self.refresh_config
            .handle(RefreshConfigCommand { user_id, now })
            .await
            .map_err(Into::into)
    }

    /// Synchronous pre-charge validation; mutates nothing.
    pub fn on_payment_precheck(
        &self,
        provider_payment_id: impl Into<String>,
        amount_minor: i64,
        currency: impl Into<String>,
    ) -> PrecheckResult {
        self.precheck.handle(PrecheckCommand {
            provider_payment_id: provider_payment_id.into(),
            amount_minor,
            currency: currency.into(),
        })
    }

    /// Asynchronous payment confirmation; applies at most once per provider
    /// payment id.
    pub async fn on_payment_confirmed(
        &self,
        provider_payment_id: impl Into<String>,
        user_identity: i64,
        amount_minor: i64,
        currency: impl Into<String>,
        now: Timestamp,
    ) -> Result<ConfirmPaymentResult, DomainError> {
        let user_id = UserId::new(user_identity)?;
        let provider_payment_id = ProviderPaymentId::new(provider_payment_id)?;
        self.confirm
            .handle(ConfirmPaymentCommand {
                provider_payment_id,
                user_id,
                amount_minor,
                currency: currency.into(),
                now,
            })
            .await
            .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStore;

    fn t0() -> Timestamp {
        Timestamp::parse_rfc3339("2026-03-01T12:00:00Z").unwrap()
    }

    fn engine() -> LifecycleEngine {
        let store = Arc::new(InMemoryStore::new());
        LifecycleEngine::new(
            BillingConfig::default(),
            vec![
                Endpoint::parse("proxy1.example.com:443").unwrap(),
                Endpoint::parse("proxy2.example.com:443").unwrap(),
            ],
            store.clone(),
            store.clone(),
            store,
        )
    }

    #[tokio::test]
    async fn rejects_non_positive_identity() {
        let engine = engine();
        assert!(engine.on_start(0, None, t0()).await.is_err());
        assert!(engine.on_trial_request(-3, t0()).await.is_err());
    }

    #[tokio::test]
    async fn precheck_needs_no_account() {
        let engine = engine();
        assert_eq!(
            engine.on_payment_precheck("charge_1", 500, "USD"),
            PrecheckResult::Accept
        );
    }

    #[tokio::test]
    async fn config_request_uses_configured_endpoints() {
        let engine = engine();
        engine.on_start(1, None, t0()).await.unwrap();
        engine.on_trial_request(1, t0()).await.unwrap();

        let result = engine.on_config_request(1, t0()).await.unwrap();
        match result {
            GetConfigResult::Allowed(views) => {
                assert_eq!(views.len(), 2);
                assert_eq!(views[0].host, "proxy1.example.com");
            }
            other => panic!("expected Allowed, got {:?}", other),
        }
    }
}
