//! Integration tests for the start gate and configuration publication.

mod common;

use common::{OrchestratorHarness, settle};
use tessera_orchestrator::{
    FrameworkConfiguration, IsolationStrategy, OrchestratorError, PrefetchStrategy, StartOptions,
};
use tessera_test::{recording_indicator, test_app};

#[tokio::test]
async fn test_activation_before_start_is_deferred() {
    let h = OrchestratorHarness::new();
    h.orchestrator
        .register_micro_apps(vec![test_app("a")], None)
        .await;

    let pending = h.engine.spawn_activation("a");
    settle().await;

    assert!(!pending.is_finished());
    assert_eq!(h.loader.call_count(), 0);

    h.orchestrator.start(StartOptions::new()).await.unwrap();
    pending.await.unwrap().unwrap();

    assert_eq!(h.loader.calls_for("a"), 1);
    assert!(h.events.contains("mount:a"));
}

#[tokio::test]
async fn test_waiting_loads_observe_final_configuration() {
    let h = OrchestratorHarness::new();
    h.orchestrator
        .register_micro_apps(vec![test_app("a"), test_app("b")], None)
        .await;

    let first = h.engine.spawn_activation("a");
    let second = h.engine.spawn_activation("b");
    settle().await;

    h.orchestrator
        .start(
            StartOptions::new()
                .with_singular(false)
                .with_prefetch(false)
                .with_import_entry("credentials", "include"),
        )
        .await
        .unwrap();
    first.await.unwrap().unwrap();
    second.await.unwrap().unwrap();

    let calls = h.loader.calls();
    assert_eq!(calls.len(), 2);
    for call in calls {
        assert!(!call.configuration.singular);
        assert_eq!(call.configuration.prefetch, PrefetchStrategy::Disabled);
        assert_eq!(call.configuration.isolation, IsolationStrategy::Proxy);
        assert_eq!(call.configuration.import_entry["credentials"], "include");
    }
}

#[tokio::test]
async fn test_loading_signal_raised_before_start() {
    let h = OrchestratorHarness::new();
    let app = test_app("a").with_loader(recording_indicator(&h.events, "a"));
    h.orchestrator.register_micro_apps(vec![app], None).await;

    let pending = h.engine.spawn_activation("a");
    settle().await;

    assert!(h.events.contains("loading:a:true"));
    assert!(!h.events.contains("load:a"));

    h.orchestrator.start(StartOptions::new()).await.unwrap();
    pending.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_start_ordering() {
    let h = OrchestratorHarness::new();
    h.orchestrator
        .register_micro_apps(vec![test_app("a")], None)
        .await;
    let pending = h.engine.spawn_activation("a");
    settle().await;

    h.orchestrator.start(StartOptions::new()).await.unwrap();
    pending.await.unwrap().unwrap();

    let prefetch = h.events.position("prefetch").unwrap();
    let engine_start = h.events.position("engine:start").unwrap();
    let load = h.events.position("load:a").unwrap();
    assert!(prefetch < engine_start);
    assert!(engine_start < load);
}

#[tokio::test]
async fn test_configuration_defaults_before_start() {
    let h = OrchestratorHarness::new();
    assert!(!h.orchestrator.is_started());
    assert_eq!(
        *h.orchestrator.configuration().await,
        FrameworkConfiguration::default()
    );
}

#[tokio::test]
async fn test_start_merges_over_defaults() {
    let h = OrchestratorHarness::new();
    h.orchestrator
        .start(StartOptions::new().with_url_reroute_only(true))
        .await
        .unwrap();

    let config = h.orchestrator.configuration().await;
    assert!(config.singular);
    assert!(config.sandbox.is_enabled());
    assert_eq!(config.prefetch, PrefetchStrategy::Enabled);
    assert!(config.url_reroute_only);
    assert!(h.orchestrator.is_started());
    assert!(h.engine.start_options().unwrap().url_reroute_only);
}

#[tokio::test]
async fn test_second_start_rejected() {
    let h = OrchestratorHarness::new();
    h.orchestrator
        .start(StartOptions::new().with_singular(false))
        .await
        .unwrap();

    let again = h
        .orchestrator
        .start(StartOptions::new().with_singular(true))
        .await;

    assert!(matches!(again, Err(OrchestratorError::AlreadyStarted)));
    assert!(!h.orchestrator.configuration().await.singular);
    assert_eq!(h.events.count("engine:start"), 1);
}

#[tokio::test]
async fn test_prefetch_receives_registered_apps() {
    let h = OrchestratorHarness::new();
    h.orchestrator
        .register_micro_apps(vec![test_app("a"), test_app("b")], None)
        .await;

    h.orchestrator
        .start(
            StartOptions::new()
                .with_prefetch(PrefetchStrategy::All)
                .with_import_entry("retries", 3),
        )
        .await
        .unwrap();

    let calls = h.prefetcher.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].apps.len(), 2);
    assert_eq!(calls[0].strategy, PrefetchStrategy::All);
    assert_eq!(calls[0].import_entry["retries"], 3);
}

#[tokio::test]
async fn test_prefetch_disabled() {
    let h = OrchestratorHarness::new();
    h.orchestrator
        .register_micro_apps(vec![test_app("a")], None)
        .await;

    h.orchestrator
        .start(StartOptions::new().with_prefetch(false))
        .await
        .unwrap();

    assert!(h.prefetcher.calls().is_empty());
}
