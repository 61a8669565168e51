//! Integration tests for idempotent app registration.

mod common;

use common::OrchestratorHarness;
use serde_json::json;
use tessera_orchestrator::{AppName, StartOptions};
use tessera_test::test_app;

fn names(raw: &[&str]) -> Vec<AppName> {
    raw.iter().map(|n| AppName::from_static(n)).collect()
}

#[tokio::test]
async fn test_registration_is_idempotent_by_name() {
    let h = OrchestratorHarness::new();

    let first = h
        .orchestrator
        .register_micro_apps(vec![test_app("a"), test_app("b")], None)
        .await;
    let second = h
        .orchestrator
        .register_micro_apps(vec![test_app("a"), test_app("c")], None)
        .await;

    assert_eq!(first, names(&["a", "b"]));
    assert_eq!(second, names(&["c"]));
    assert_eq!(h.engine.registered_names(), names(&["a", "b", "c"]));
    assert_eq!(h.orchestrator.registered_apps().await, names(&["a", "b", "c"]));
}

#[tokio::test]
async fn test_duplicate_suppressed_first_registration_wins() {
    let h = OrchestratorHarness::new();
    let mut replacement = test_app("a");
    replacement.entry = "//elsewhere/a".to_owned();

    h.orchestrator
        .register_micro_apps(vec![test_app("a")], None)
        .await;
    h.orchestrator
        .register_micro_apps(vec![replacement], None)
        .await;
    h.orchestrator.start(StartOptions::new()).await.unwrap();
    h.engine.activate("a").await.unwrap();

    assert_eq!(h.events.count("register:a"), 1);
    let calls = h.loader.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].app.entry, "//localhost/a");
}

#[tokio::test]
async fn test_duplicate_keeps_first_props() {
    let h = OrchestratorHarness::new();

    h.orchestrator
        .register_micro_apps(vec![test_app("c").with_props(json!({ "v": 1 }))], None)
        .await;
    let admitted = h
        .orchestrator
        .register_micro_apps(vec![test_app("c").with_props(json!({ "v": 2 }))], None)
        .await;
    h.orchestrator.start(StartOptions::new()).await.unwrap();
    h.engine.activate("c").await.unwrap();

    assert!(admitted.is_empty());
    assert_eq!(
        h.engine.registration("c").unwrap().custom_props,
        json!({ "v": 1 })
    );
    let calls = h.loader.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].app.props, json!({ "v": 1 }));
}

#[tokio::test]
async fn test_duplicates_within_one_batch() {
    let h = OrchestratorHarness::new();
    let admitted = h
        .orchestrator
        .register_micro_apps(vec![test_app("x"), test_app("x")], None)
        .await;

    assert_eq!(admitted, names(&["x"]));
    assert_eq!(h.engine.registered_names(), names(&["x"]));
}

#[tokio::test]
async fn test_empty_registration_is_noop() {
    let h = OrchestratorHarness::new();
    let admitted = h.orchestrator.register_micro_apps(Vec::new(), None).await;

    assert!(admitted.is_empty());
    assert!(h.engine.registered_names().is_empty());
    assert!(h.events.events().is_empty());
}

#[tokio::test]
async fn test_registration_forwards_rule_and_props() {
    let h = OrchestratorHarness::new();
    let app = test_app("shop").with_props(json!({"currency": "EUR"}));

    h.orchestrator.register_micro_apps(vec![app], None).await;

    let registration = h.engine.registration("shop").unwrap();
    assert_eq!(registration.custom_props["currency"], "EUR");
    assert!(registration.active_when.matches("/shop/cart"));
    assert!(!registration.active_when.matches("/shopping"));
    assert_eq!(registration.app.app_name(), &AppName::from_static("shop"));
}

#[tokio::test]
async fn test_registration_does_not_load() {
    let h = OrchestratorHarness::new();
    h.orchestrator
        .register_micro_apps(vec![test_app("a")], None)
        .await;

    assert_eq!(h.loader.call_count(), 0);
}

#[tokio::test]
async fn test_registration_after_start_loads_without_waiting() {
    let h = OrchestratorHarness::new();
    h.orchestrator.start(StartOptions::new()).await.unwrap();

    h.orchestrator
        .register_micro_apps(vec![test_app("late")], None)
        .await;
    h.engine.activate("late").await.unwrap();

    assert!(h.events.contains("mount:late"));
}
