//! Integration tests for activation: loading signals around mount.

mod common;

use common::OrchestratorHarness;
use serde_json::Value;
use tessera_orchestrator::{
    FrameworkLifeCycles, HookPhase, OrchestratorError, StartOptions, StaticProbe,
};
use tessera_test::{EventLog, recording_indicator, test_app};

fn no_prefetch() -> StartOptions {
    StartOptions::new().with_prefetch(false)
}

async fn register_with_indicator(h: &OrchestratorHarness, name: &str) {
    let app = test_app(name).with_loader(recording_indicator(&h.events, name));
    h.orchestrator.register_micro_apps(vec![app], None).await;
}

#[tokio::test]
async fn test_basic_activation() {
    let h = OrchestratorHarness::new();
    register_with_indicator(&h, "a").await;
    h.orchestrator.start(no_prefetch()).await.unwrap();

    let outcomes = h.engine.navigate("/a/home").await;

    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].1.is_ok());
    assert_eq!(
        h.events.events(),
        vec![
            "register:a",
            "engine:start",
            "loading:a:true",
            "load:a",
            "bootstrap:a",
            "loading:a:true",
            "mount:a",
            "loading:a:false",
        ]
    );
}

#[tokio::test]
async fn test_navigate_only_activates_matching_apps() {
    let h = OrchestratorHarness::new();
    h.orchestrator
        .register_micro_apps(vec![test_app("a"), test_app("b")], None)
        .await;
    h.orchestrator.start(no_prefetch()).await.unwrap();

    h.engine.navigate("/b").await;

    assert_eq!(h.loader.calls_for("a"), 0);
    assert_eq!(h.loader.calls_for("b"), 1);
}

#[tokio::test]
async fn test_multi_step_mount_is_bracketed() {
    let h = OrchestratorHarness::with(|l| l.with_mount_steps(2), StaticProbe::supported());
    register_with_indicator(&h, "a").await;
    h.orchestrator.start(no_prefetch()).await.unwrap();

    let bundle = h.engine.activate("a").await.unwrap();

    assert_eq!(bundle.mount.len(), 4);
    let events = h.events.events();
    let tail: Vec<&str> = events.iter().rev().take(4).rev().map(String::as_str).collect();
    assert_eq!(
        tail,
        vec!["loading:a:true", "mount:a:0", "mount:a:1", "loading:a:false"]
    );
}

#[tokio::test]
async fn test_mount_failure_leaves_indicator_loading() {
    let h = OrchestratorHarness::with(|l| l.with_failing_mount("a"), StaticProbe::supported());
    register_with_indicator(&h, "a").await;
    h.orchestrator.start(no_prefetch()).await.unwrap();

    let result = h.engine.activate("a").await;

    assert!(matches!(result, Err(OrchestratorError::LifecycleFailed { .. })));
    assert!(h.events.contains("mount:a"));
    assert!(!h.events.contains("loading:a:false"));
    assert_eq!(h.events.events().last().map(String::as_str), Some("mount:a"));
}

#[tokio::test]
async fn test_load_failure_propagates() {
    let h = OrchestratorHarness::with(|l| l.with_failing_load("a"), StaticProbe::supported());
    register_with_indicator(&h, "a").await;
    h.orchestrator.start(no_prefetch()).await.unwrap();

    let result = h.engine.activate("a").await;

    assert!(matches!(result, Err(OrchestratorError::LoadFailed { .. })));
    assert!(!h.events.contains("bootstrap:a"));
    assert!(!h.events.contains("loading:a:false"));
}

#[tokio::test]
async fn test_unmount_and_bootstrap_not_bracketed() {
    let h = OrchestratorHarness::new();
    register_with_indicator(&h, "a").await;
    h.orchestrator.start(no_prefetch()).await.unwrap();

    let bundle = h.engine.activate("a").await.unwrap();
    assert_eq!(bundle.bootstrap.len(), 1);
    assert_eq!(bundle.unmount.len(), 1);

    h.events.clear();
    bundle.unmount.run(&Value::Null).await.unwrap();
    assert_eq!(h.events.events(), vec!["unmount:a"]);
}

#[tokio::test]
async fn test_framework_hooks_forwarded_to_loader() {
    let h = OrchestratorHarness::new();
    let hook_events = EventLog::new();
    let sink = hook_events.clone();
    let hooks = FrameworkLifeCycles::new().with_hook(HookPhase::BeforeLoad, move |app| {
        let sink = sink.clone();
        async move {
            sink.push(format!("before_load:{}", app.name));
            Ok(())
        }
    });

    h.orchestrator
        .register_micro_apps(vec![test_app("a")], Some(hooks))
        .await;
    h.orchestrator
        .register_micro_apps(vec![test_app("b")], None)
        .await;
    h.orchestrator.start(no_prefetch()).await.unwrap();
    h.engine.activate("a").await.unwrap();
    h.engine.activate("b").await.unwrap();

    let calls = h.loader.calls();
    assert!(calls[0].with_life_cycles);
    assert!(!calls[1].with_life_cycles);
    assert_eq!(hook_events.events(), vec!["before_load:a"]);
}

#[tokio::test]
async fn test_each_activation_reloads() {
    let h = OrchestratorHarness::new();
    h.orchestrator
        .register_micro_apps(vec![test_app("a")], None)
        .await;
    h.orchestrator.start(no_prefetch()).await.unwrap();

    h.engine.activate("a").await.unwrap();
    h.engine.activate("a").await.unwrap();

    // Caching loaded bundles is the engine's concern.
    assert_eq!(h.loader.calls_for("a"), 2);
}
