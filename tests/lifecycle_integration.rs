//! End-to-end lifecycle scenarios driven through the engine facade.

use std::sync::Arc;

use proxygate::adapters::memory::InMemoryStore;
use proxygate::application::handlers::account::GrantTrialResult;
use proxygate::application::handlers::payment::{ConfirmPaymentResult, PrecheckResult};
use proxygate::application::handlers::proxy::{GetConfigResult, RefreshConfigResult};
use proxygate::application::LifecycleEngine;
use proxygate::config::{BillingConfig, Endpoint};
use proxygate::domain::account::SubscriptionStatus;
use proxygate::domain::credential::ProxySecret;
use proxygate::domain::foundation::Timestamp;
use proxygate::ports::CredentialRepository;

fn t0() -> Timestamp {
    Timestamp::parse_rfc3339("2026-03-01T12:00:00Z").unwrap()
}

fn endpoints() -> Vec<Endpoint> {
    vec![
        Endpoint::parse("proxy1.example.com:443").unwrap(),
        Endpoint::parse("proxy2.example.com:8443").unwrap(),
    ]
}

fn build_engine() -> (LifecycleEngine, Arc<InMemoryStore>) {
    let store = Arc::new(InMemoryStore::new());
    let engine = LifecycleEngine::new(
        BillingConfig::default(),
        endpoints(),
        store.clone(),
        store.clone(),
        store.clone(),
    );
    (engine, store)
}

fn allowed_views(result: GetConfigResult) -> Vec<proxygate::application::handlers::proxy::CredentialView> {
    match result {
        GetConfigResult::Allowed(views) => views,
        other => panic!("expected Allowed, got {:?}", other),
    }
}

#[tokio::test]
async fn new_user_trial_lifecycle() {
    let (engine, _store) = build_engine();

    // Start: status NEW.
    let summary = engine
        .on_start(1001, Some("u1".to_string()), t0())
        .await
        .unwrap();
    assert_eq!(summary.status, SubscriptionStatus::New);

    // Trial: applied, active now, lapsed after 25h (1-day trial).
    let result = engine.on_trial_request(1001, t0()).await.unwrap();
    let expires_at = match result {
        GrantTrialResult::Applied { expires_at } => expires_at,
        other => panic!("expected Applied, got {:?}", other),
    };
    assert_eq!(expires_at, t0().add_hours(24));

    let active = engine.on_start(1001, None, t0().add_hours(1)).await.unwrap();
    assert_eq!(active.status, SubscriptionStatus::TrialActive);

    let lapsed = engine.on_start(1001, None, t0().add_hours(25)).await.unwrap();
    assert_eq!(lapsed.status, SubscriptionStatus::Expired);

    // Second trial call is rejected.
    let second = engine.on_trial_request(1001, t0().add_hours(2)).await.unwrap();
    assert_eq!(second, GrantTrialResult::AlreadyUsedTrial);
}

#[tokio::test]
async fn payment_confirmation_is_idempotent() {
    let (engine, _store) = build_engine();
    engine.on_start(1002, None, t0()).await.unwrap();

    // First confirmation of pay-1 applies and sets t0 + 30d.
    let applied = engine
        .on_payment_confirmed("pay-1", 1002, 500, "USD", t0())
        .await
        .unwrap();
    assert_eq!(
        applied,
        ConfirmPaymentResult::Applied {
            subscription_expires_at: t0().add_days(30)
        }
    );

    // Duplicate webhook an hour later: no-op, expiry unchanged.
    let duplicate = engine
        .on_payment_confirmed("pay-1", 1002, 500, "USD", t0().add_hours(1))
        .await
        .unwrap();
    assert_eq!(duplicate, ConfirmPaymentResult::AlreadyApplied);

    let summary = engine.on_start(1002, None, t0().add_hours(2)).await.unwrap();
    assert_eq!(summary.status, SubscriptionStatus::Subscribed);
    assert_eq!(summary.subscription_expires_at, Some(t0().add_days(30)));
}

#[tokio::test]
async fn renewal_stacks_on_remaining_time() {
    // Billing config with a 10-day window, so the arithmetic is visible.
    let store = Arc::new(InMemoryStore::new());
    let short_engine = LifecycleEngine::new(
        BillingConfig {
            subscription_duration_days: 10,
            ..Default::default()
        },
        endpoints(),
        store.clone(),
        store.clone(),
        store,
    );
    short_engine.on_start(1003, None, t0()).await.unwrap();
    short_engine
        .on_payment_confirmed("pay-1", 1003, 500, "USD", t0())
        .await
        .unwrap();

    // Second payment five days in stacks on the remaining window:
    // (t0 + 10d) + 10d, not (t0 + 5d) + 10d.
    let renewed = short_engine
        .on_payment_confirmed("pay-2", 1003, 500, "USD", t0().add_days(5))
        .await
        .unwrap();
    assert_eq!(
        renewed,
        ConfirmPaymentResult::Applied {
            subscription_expires_at: t0().add_days(20)
        }
    );
}

#[tokio::test]
async fn precheck_accepts_expected_charge_and_rejects_others() {
    let (engine, _store) = build_engine();

    assert_eq!(
        engine.on_payment_precheck("pay-1", 500, "USD"),
        PrecheckResult::Accept
    );
    assert!(matches!(
        engine.on_payment_precheck("pay-1", 9900, "USD"),
        PrecheckResult::Reject(_)
    ));
    assert!(matches!(
        engine.on_payment_precheck("", 500, "USD"),
        PrecheckResult::Reject(_)
    ));
}

#[tokio::test]
async fn rejected_payment_grants_no_access() {
    let (engine, _store) = build_engine();
    engine.on_start(1004, None, t0()).await.unwrap();

    let rejected = engine
        .on_payment_confirmed("pay-bad", 1004, 100, "USD", t0())
        .await
        .unwrap();
    assert!(matches!(rejected, ConfirmPaymentResult::Rejected(_)));

    let config = engine.on_config_request(1004, t0()).await.unwrap();
    assert!(matches!(config, GetConfigResult::Denied(_)));
}

#[tokio::test]
async fn config_and_rotation_lifecycle() {
    let (engine, store) = build_engine();

    engine.on_start(1005, None, t0()).await.unwrap();
    engine.on_trial_request(1005, t0()).await.unwrap();

    // Two endpoints configured: two credentials, distinct secrets.
    let views = allowed_views(engine.on_config_request(1005, t0()).await.unwrap());
    assert_eq!(views.len(), 2);
    assert_ne!(views[0].secret, views[1].secret);
    assert!(views[0].connection_url().contains("proxy1.example.com"));

    // Same request again: same secrets.
    let again = allowed_views(engine.on_config_request(1005, t0().add_hours(1)).await.unwrap());
    assert_eq!(
        views.iter().map(|v| v.secret.clone()).collect::<Vec<_>>(),
        again.iter().map(|v| v.secret.clone()).collect::<Vec<_>>()
    );

    // Refresh: both secrets change, previous values permanently rejected
    // by lookup-by-secret.
    let rotated = match engine
        .on_refresh_request(1005, t0().add_hours(2))
        .await
        .unwrap()
    {
        RefreshConfigResult::Allowed(views) => views,
        other => panic!("expected Allowed, got {:?}", other),
    };
    assert_eq!(rotated.len(), 2);

    for old in &views {
        assert!(!rotated.iter().any(|new| new.secret == old.secret));
        let dead = ProxySecret::from_stored(old.secret.clone()).unwrap();
        assert!(store.find_by_secret(&dead).await.unwrap().is_none());
    }
    for new in &rotated {
        let live = ProxySecret::from_stored(new.secret.clone()).unwrap();
        assert!(store.find_by_secret(&live).await.unwrap().is_some());
    }
}

#[tokio::test]
async fn refresh_before_any_config_is_noop_success() {
    let (engine, _store) = build_engine();

    engine.on_start(1006, None, t0()).await.unwrap();
    engine.on_trial_request(1006, t0()).await.unwrap();

    let result = engine.on_refresh_request(1006, t0()).await.unwrap();
    assert_eq!(result, RefreshConfigResult::Allowed(Vec::new()));
}

#[tokio::test]
async fn access_is_denied_at_the_expiry_instant() {
    let (engine, _store) = build_engine();

    engine.on_start(1007, None, t0()).await.unwrap();
    engine
        .on_payment_confirmed("pay-1", 1007, 500, "USD", t0())
        .await
        .unwrap();

    let expiry = t0().add_days(30);

    // Strictly before the boundary: allowed.
    let before = engine
        .on_config_request(1007, expiry.plus(chrono::Duration::seconds(-1)))
        .await
        .unwrap();
    assert!(matches!(before, GetConfigResult::Allowed(_)));

    // At the boundary: already denied.
    let at = engine.on_config_request(1007, expiry).await.unwrap();
    assert!(matches!(at, GetConfigResult::Denied(_)));
}

#[tokio::test]
async fn secrets_never_collide_across_users() {
    let (engine, _store) = build_engine();

    let mut secrets = std::collections::HashSet::new();
    for identity in 1..=10 {
        engine.on_start(identity, None, t0()).await.unwrap();
        engine.on_trial_request(identity, t0()).await.unwrap();
        let views = allowed_views(engine.on_config_request(identity, t0()).await.unwrap());
        for view in views {
            assert!(
                secrets.insert(view.secret.clone()),
                "secret issued twice across users"
            );
        }
    }
    assert_eq!(secrets.len(), 20);
}

#[tokio::test]
async fn endpoint_added_after_rotation_is_provisioned_on_next_config() {
    let store = Arc::new(InMemoryStore::new());
    let one_endpoint = LifecycleEngine::new(
        BillingConfig::default(),
        vec![Endpoint::parse("proxy1.example.com:443").unwrap()],
        store.clone(),
        store.clone(),
        store.clone(),
    );

    one_endpoint.on_start(1008, None, t0()).await.unwrap();
    one_endpoint.on_trial_request(1008, t0()).await.unwrap();
    let first = allowed_views(one_endpoint.on_config_request(1008, t0()).await.unwrap());
    assert_eq!(first.len(), 1);

    // Rotation only touches the existing credential.
    let rotated = match one_endpoint
        .on_refresh_request(1008, t0().add_hours(1))
        .await
        .unwrap()
    {
        RefreshConfigResult::Allowed(views) => views,
        other => panic!("expected Allowed, got {:?}", other),
    };
    assert_eq!(rotated.len(), 1);

    // A second endpoint appears in configuration: the next config request
    // provisions it without disturbing the rotated credential.
    let two_endpoints = LifecycleEngine::new(
        BillingConfig::default(),
        endpoints(),
        store.clone(),
        store.clone(),
        store,
    );
    let views = allowed_views(
        two_endpoints
            .on_config_request(1008, t0().add_hours(2))
            .await
            .unwrap(),
    );
    assert_eq!(views.len(), 2);
    assert_eq!(views[0].secret, rotated[0].secret);
}
