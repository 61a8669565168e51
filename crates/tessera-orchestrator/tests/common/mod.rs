//! Shared test harness for orchestrator integration tests.

use std::sync::Arc;

use tessera_orchestrator::{Orchestrator, StaticProbe};
use tessera_test::{EventLog, MockEntryLoader, MockLifecycleEngine, MockPrefetchScheduler};

/// An orchestrator wired to mock collaborators sharing one event log.
#[allow(dead_code)]
pub struct OrchestratorHarness {
    /// The orchestrator under test.
    pub orchestrator: Orchestrator,
    /// Shared event log.
    pub events: EventLog,
    /// The mock engine.
    pub engine: Arc<MockLifecycleEngine>,
    /// The mock entry loader.
    pub loader: MockEntryLoader,
    /// The mock prefetch scheduler.
    pub prefetcher: MockPrefetchScheduler,
}

#[allow(dead_code)]
impl OrchestratorHarness {
    /// Harness with a proxy-capable host and a default entry loader.
    pub fn new() -> Self {
        Self::with(|loader| loader, StaticProbe::supported())
    }

    /// Harness on a host without proxy sandbox support.
    pub fn without_proxy() -> Self {
        Self::with(|loader| loader, StaticProbe::unsupported())
    }

    /// Harness with a customized entry loader and probe.
    pub fn with(
        configure: impl FnOnce(MockEntryLoader) -> MockEntryLoader,
        probe: StaticProbe,
    ) -> Self {
        let events = EventLog::new();
        let engine = Arc::new(MockLifecycleEngine::new(events.clone()));
        let loader = configure(MockEntryLoader::new(events.clone()));
        let prefetcher = MockPrefetchScheduler::new(events.clone());

        let orchestrator = Orchestrator::builder()
            .engine(engine.clone())
            .entry_loader(Arc::new(loader.clone()))
            .prefetch_scheduler(Arc::new(prefetcher.clone()))
            .capability_probe(Arc::new(probe))
            .build()
            .expect("all collaborators supplied");

        Self {
            orchestrator,
            events,
            engine,
            loader,
            prefetcher,
        }
    }
}

/// Let spawned tasks run until they block.
#[allow(dead_code)]
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}
