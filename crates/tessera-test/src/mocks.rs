//! Mock collaborators for testing the orchestrator.
//!
//! All mocks share an [`EventLog`] so tests can assert on the relative
//! order of loads, mounts, prefetch and engine start.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use tessera_config::{FrameworkConfiguration, ImportEntryOpts, PrefetchStrategy};
use tessera_orchestrator::{
    AppName, ApplicationRegistration, BundleLoader, ContainerId, EngineStartOptions,
    FrameworkLifeCycles, HookPhase, LifecycleBundle, LifecycleEngine, LifecycleFn, LifecyclePhase,
    LoadableApp, MicroApp, MicroAppStatus, OrchestratorError, OrchestratorResult, ParcelOptions,
    PrefetchScheduler, RegistrableApp, RemoteEntryLoader,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Ordered, shared record of everything the mocks observed.
#[derive(Debug, Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event.
    pub fn push(&self, event: impl Into<String>) {
        lock(&self.0).push(event.into());
    }

    /// All events so far.
    #[must_use]
    pub fn events(&self) -> Vec<String> {
        lock(&self.0).clone()
    }

    /// Whether an event was recorded.
    #[must_use]
    pub fn contains(&self, event: &str) -> bool {
        lock(&self.0).iter().any(|e| e == event)
    }

    /// Index of the first occurrence of an event.
    #[must_use]
    pub fn position(&self, event: &str) -> Option<usize> {
        lock(&self.0).iter().position(|e| e == event)
    }

    /// Number of occurrences of an event.
    #[must_use]
    pub fn count(&self, event: &str) -> usize {
        lock(&self.0).iter().filter(|e| *e == event).count()
    }

    /// Forget all events.
    pub fn clear(&self) {
        lock(&self.0).clear();
    }
}

// ---------------------------------------------------------------------------
// Entry loader
// ---------------------------------------------------------------------------

/// One recorded [`RemoteEntryLoader::load_app`] call.
#[derive(Debug, Clone)]
pub struct LoadCall {
    /// The app descriptor passed in.
    pub app: LoadableApp,
    /// The configuration the load observed.
    pub configuration: FrameworkConfiguration,
    /// Whether framework hooks were supplied.
    pub with_life_cycles: bool,
}

/// Entry loader that fabricates lifecycle bundles.
///
/// Events recorded, for an app named `x`:
/// `load:x`, `bootstrap:x`, `mount:x` (or `mount:x:<i>` with several mount
/// steps), `unmount:x`.
#[derive(Debug, Clone, Default)]
pub struct MockEntryLoader {
    events: EventLog,
    calls: Arc<Mutex<Vec<LoadCall>>>,
    failing_loads: Arc<Mutex<HashSet<String>>>,
    failing_mounts: Arc<Mutex<HashSet<String>>>,
    mount_steps: usize,
}

impl MockEntryLoader {
    /// Create a loader recording into `events`.
    #[must_use]
    pub fn new(events: EventLog) -> Self {
        Self {
            events,
            mount_steps: 1,
            ..Self::default()
        }
    }

    /// Make loading `name` fail.
    #[must_use]
    pub fn with_failing_load(self, name: &str) -> Self {
        lock(&self.failing_loads).insert(name.to_owned());
        self
    }

    /// Make the mount phase of `name` fail after its first step.
    #[must_use]
    pub fn with_failing_mount(self, name: &str) -> Self {
        lock(&self.failing_mounts).insert(name.to_owned());
        self
    }

    /// Number of steps in each fabricated mount phase.
    #[must_use]
    pub fn with_mount_steps(mut self, steps: usize) -> Self {
        self.mount_steps = steps;
        self
    }

    /// All recorded calls.
    #[must_use]
    pub fn calls(&self) -> Vec<LoadCall> {
        lock(&self.calls).clone()
    }

    /// Total number of calls.
    #[must_use]
    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Number of calls for one app.
    #[must_use]
    pub fn calls_for(&self, name: &str) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|call| call.app.name == name)
            .count()
    }

    fn step(&self, label: String) -> LifecycleFn {
        let events = self.events.clone();
        LifecycleFn::new(move |_| {
            let events = events.clone();
            let label = label.clone();
            async move {
                events.push(label);
                Ok(())
            }
        })
    }

    fn failing_step(app: &AppName) -> LifecycleFn {
        let app = app.clone();
        LifecycleFn::new(move |_| {
            let app = app.clone();
            async move {
                Err(OrchestratorError::LifecycleFailed {
                    app,
                    phase: LifecyclePhase::Mount,
                    message: "mock mount failure".into(),
                })
            }
        })
    }

    fn bundle_for(&self, app: &AppName) -> LifecycleBundle {
        let mut mount = Vec::new();
        if self.mount_steps == 1 {
            mount.push(self.step(format!("mount:{app}")));
        } else {
            for i in 0..self.mount_steps {
                mount.push(self.step(format!("mount:{app}:{i}")));
            }
        }
        if lock(&self.failing_mounts).contains(app.as_str()) {
            mount.push(Self::failing_step(app));
        }

        LifecycleBundle::new(mount, self.step(format!("unmount:{app}")))
            .with_bootstrap(self.step(format!("bootstrap:{app}")))
    }
}

#[async_trait]
impl RemoteEntryLoader for MockEntryLoader {
    async fn load_app(
        &self,
        app: &LoadableApp,
        configuration: &FrameworkConfiguration,
        life_cycles: Option<&FrameworkLifeCycles>,
    ) -> OrchestratorResult<LifecycleBundle> {
        self.events.push(format!("load:{}", app.name));
        lock(&self.calls).push(LoadCall {
            app: app.clone(),
            configuration: configuration.clone(),
            with_life_cycles: life_cycles.is_some(),
        });

        if let Some(hooks) = life_cycles {
            hooks.run(HookPhase::BeforeLoad, app).await?;
        }

        if lock(&self.failing_loads).contains(app.name.as_str()) {
            return Err(OrchestratorError::LoadFailed {
                app: app.name.clone(),
                message: "mock load failure".into(),
            });
        }

        Ok(self.bundle_for(&app.name))
    }
}

// ---------------------------------------------------------------------------
// Lifecycle engine
// ---------------------------------------------------------------------------

async fn drive(
    loader: Arc<dyn BundleLoader>,
    props: Value,
) -> OrchestratorResult<LifecycleBundle> {
    let bundle = loader.load().await?;
    bundle.bootstrap.run(&props).await?;
    bundle.mount.run(&props).await?;
    Ok(bundle)
}

/// Lifecycle engine that activates apps on demand.
///
/// Records `register:<name>` and `engine:start` events. Nothing is activated
/// automatically; tests call [`activate`](Self::activate),
/// [`spawn_activation`](Self::spawn_activation) or
/// [`navigate`](Self::navigate).
#[derive(Debug, Default)]
pub struct MockLifecycleEngine {
    events: EventLog,
    registrations: Mutex<Vec<ApplicationRegistration>>,
    start_options: Mutex<Option<EngineStartOptions>>,
    parcels: Mutex<Vec<Arc<MockMicroApp>>>,
}

impl MockLifecycleEngine {
    /// Create an engine recording into `events`.
    #[must_use]
    pub fn new(events: EventLog) -> Self {
        Self {
            events,
            ..Self::default()
        }
    }

    /// Names handed to `register_application`, in order.
    #[must_use]
    pub fn registered_names(&self) -> Vec<AppName> {
        lock(&self.registrations)
            .iter()
            .map(|r| r.name.clone())
            .collect()
    }

    /// The registration for an app.
    #[must_use]
    pub fn registration(&self, name: &str) -> Option<ApplicationRegistration> {
        lock(&self.registrations)
            .iter()
            .find(|r| r.name == name)
            .cloned()
    }

    /// Whether `start` was called.
    #[must_use]
    pub fn is_started(&self) -> bool {
        lock(&self.start_options).is_some()
    }

    /// Options passed to `start`.
    #[must_use]
    pub fn start_options(&self) -> Option<EngineStartOptions> {
        *lock(&self.start_options)
    }

    /// Parcels mounted so far.
    #[must_use]
    pub fn parcels(&self) -> Vec<Arc<MockMicroApp>> {
        lock(&self.parcels).clone()
    }

    fn not_registered(name: &str) -> OrchestratorError {
        OrchestratorError::LoadFailed {
            app: AppName::from_static(name),
            message: "not registered with the engine".into(),
        }
    }

    /// Load, bootstrap and mount a registered app.
    ///
    /// # Errors
    ///
    /// Returns the first load or lifecycle error.
    pub async fn activate(&self, name: &str) -> OrchestratorResult<LifecycleBundle> {
        let registration = self
            .registration(name)
            .ok_or_else(|| Self::not_registered(name))?;
        drive(registration.app, registration.custom_props).await
    }

    /// Run [`activate`](Self::activate) on a spawned task.
    ///
    /// Must be called inside a tokio runtime.
    #[must_use]
    pub fn spawn_activation(&self, name: &str) -> JoinHandle<OrchestratorResult<LifecycleBundle>> {
        let registration = self.registration(name);
        let name = name.to_owned();
        tokio::spawn(async move {
            let registration = registration.ok_or_else(|| Self::not_registered(&name))?;
            drive(registration.app, registration.custom_props).await
        })
    }

    /// Activate every app whose rule matches `location`, in registration
    /// order.
    pub async fn navigate(&self, location: &str) -> Vec<(AppName, OrchestratorResult<()>)> {
        let matching: Vec<ApplicationRegistration> = lock(&self.registrations)
            .iter()
            .filter(|r| r.active_when.matches(location))
            .cloned()
            .collect();

        let mut outcomes = Vec::new();
        for registration in matching {
            let outcome = drive(registration.app, registration.custom_props)
                .await
                .map(|_| ());
            outcomes.push((registration.name, outcome));
        }
        outcomes
    }
}

impl LifecycleEngine for MockLifecycleEngine {
    fn register_application(&self, registration: ApplicationRegistration) {
        self.events.push(format!("register:{}", registration.name));
        lock(&self.registrations).push(registration);
    }

    fn start(&self, options: EngineStartOptions) {
        self.events.push("engine:start");
        *lock(&self.start_options) = Some(options);
    }

    fn mount_root_parcel(
        &self,
        loader: Arc<dyn BundleLoader>,
        options: ParcelOptions,
    ) -> Arc<dyn MicroApp> {
        let parcel = MockMicroApp::spawn(loader, options);
        lock(&self.parcels).push(Arc::clone(&parcel));
        parcel
    }
}

/// A root parcel driven on a spawned task.
#[derive(Debug)]
pub struct MockMicroApp {
    name: AppName,
    container: ContainerId,
    props: Value,
    status: watch::Sender<MicroAppStatus>,
    bundle: tokio::sync::Mutex<Option<LifecycleBundle>>,
}

impl MockMicroApp {
    fn spawn(loader: Arc<dyn BundleLoader>, options: ParcelOptions) -> Arc<Self> {
        let (status, _rx) = watch::channel(MicroAppStatus::Loading);
        let parcel = Arc::new(Self {
            name: loader.app_name().clone(),
            container: options.container,
            props: options.props,
            status,
            bundle: tokio::sync::Mutex::new(None),
        });

        let task = Arc::clone(&parcel);
        tokio::spawn(async move { task.run(loader).await });
        parcel
    }

    async fn run(&self, loader: Arc<dyn BundleLoader>) {
        let bundle = match loader.load().await {
            Ok(bundle) => bundle,
            Err(e) => {
                self.status.send_replace(MicroAppStatus::LoadError(e.to_string()));
                return;
            },
        };

        self.status.send_replace(MicroAppStatus::Bootstrapping);
        if let Err(e) = bundle.bootstrap.run(&self.props).await {
            self.status.send_replace(MicroAppStatus::Failed(e.to_string()));
            return;
        }

        self.status.send_replace(MicroAppStatus::Mounting);
        if let Err(e) = bundle.mount.run(&self.props).await {
            self.status.send_replace(MicroAppStatus::Failed(e.to_string()));
            return;
        }

        *self.bundle.lock().await = Some(bundle);
        self.status.send_replace(MicroAppStatus::Mounted);
    }

    /// Props the parcel was mounted with.
    #[must_use]
    pub fn props(&self) -> &Value {
        &self.props
    }
}

#[async_trait]
impl MicroApp for MockMicroApp {
    fn name(&self) -> &AppName {
        &self.name
    }

    fn container(&self) -> ContainerId {
        self.container
    }

    fn status(&self) -> MicroAppStatus {
        self.status.borrow().clone()
    }

    async fn mounted(&self) -> OrchestratorResult<()> {
        let mut rx = self.status.subscribe();
        let status = match rx.wait_for(MicroAppStatus::is_settled).await {
            Ok(status) => status.clone(),
            Err(_) => self.status(),
        };

        match status {
            MicroAppStatus::LoadError(message) => Err(OrchestratorError::LoadFailed {
                app: self.name.clone(),
                message,
            }),
            MicroAppStatus::Failed(message) => Err(OrchestratorError::LifecycleFailed {
                app: self.name.clone(),
                phase: LifecyclePhase::Mount,
                message,
            }),
            MicroAppStatus::Loading
            | MicroAppStatus::Bootstrapping
            | MicroAppStatus::Mounting
            | MicroAppStatus::Mounted
            | MicroAppStatus::Unmounting
            | MicroAppStatus::Unmounted => Ok(()),
        }
    }

    async fn unmount(&self) -> OrchestratorResult<()> {
        self.mounted().await?;
        let Some(bundle) = self.bundle.lock().await.take() else {
            return Ok(());
        };

        self.status.send_replace(MicroAppStatus::Unmounting);
        bundle.unmount.run(&self.props).await?;
        self.status.send_replace(MicroAppStatus::Unmounted);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Prefetch scheduler
// ---------------------------------------------------------------------------

/// One recorded prefetch request.
#[derive(Debug, Clone)]
pub struct PrefetchCall {
    /// Names of the apps handed over.
    pub apps: Vec<AppName>,
    /// The strategy.
    pub strategy: PrefetchStrategy,
    /// Passthrough options.
    pub import_entry: ImportEntryOpts,
}

/// Scheduler that records requests and a `prefetch` event.
#[derive(Debug, Clone, Default)]
pub struct MockPrefetchScheduler {
    events: EventLog,
    calls: Arc<Mutex<Vec<PrefetchCall>>>,
}

impl MockPrefetchScheduler {
    /// Create a scheduler recording into `events`.
    #[must_use]
    pub fn new(events: EventLog) -> Self {
        Self {
            events,
            calls: Arc::default(),
        }
    }

    /// All recorded requests.
    #[must_use]
    pub fn calls(&self) -> Vec<PrefetchCall> {
        lock(&self.calls).clone()
    }
}

impl PrefetchScheduler for MockPrefetchScheduler {
    fn do_prefetch_strategy(
        &self,
        apps: &[Arc<RegistrableApp>],
        strategy: &PrefetchStrategy,
        import_entry: &ImportEntryOpts,
    ) {
        self.events.push("prefetch");
        lock(&self.calls).push(PrefetchCall {
            apps: apps.iter().map(|app| app.name.clone()).collect(),
            strategy: strategy.clone(),
            import_entry: import_entry.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_log_order() {
        let log = EventLog::new();
        log.push("a");
        log.push("b");
        log.push("a");

        assert_eq!(log.position("b"), Some(1));
        assert_eq!(log.count("a"), 2);
        assert!(!log.contains("c"));

        log.clear();
        assert!(log.events().is_empty());
    }

    #[tokio::test]
    async fn test_entry_loader_fabricates_bundle() {
        let events = EventLog::new();
        let loader = MockEntryLoader::new(events.clone()).with_mount_steps(2);
        let app = LoadableApp::new(AppName::from_static("x"), "//x");

        let bundle = loader
            .load_app(&app, &FrameworkConfiguration::default(), None)
            .await
            .unwrap();
        bundle.mount.run(&Value::Null).await.unwrap();

        assert_eq!(events.events(), vec!["load:x", "mount:x:0", "mount:x:1"]);
        assert_eq!(loader.calls_for("x"), 1);
    }

    #[tokio::test]
    async fn test_entry_loader_failing_load() {
        let loader = MockEntryLoader::new(EventLog::new()).with_failing_load("x");
        let app = LoadableApp::new(AppName::from_static("x"), "//x");

        let result = loader
            .load_app(&app, &FrameworkConfiguration::default(), None)
            .await;
        assert!(matches!(result, Err(OrchestratorError::LoadFailed { .. })));
    }
}
