//! The public orchestrator: registration, start and manual loading.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use tessera_config::{FrameworkConfiguration, StartOptions};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::activation::{AppActivation, ParcelActivation};
use crate::app::{AppName, LoadableApp, RegistrableApp};
use crate::context::OrchestratorContext;
use crate::engine::{
    ApplicationRegistration, ContainerId, EngineStartOptions, LifecycleEngine, MicroApp,
    ParcelOptions,
};
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::lifecycle::FrameworkLifeCycles;
use crate::loader::RemoteEntryLoader;
use crate::manifest::AppManifest;
use crate::prefetch::{NoPrefetch, PrefetchScheduler, trigger_prefetch};
use crate::sandbox::{CapabilityProbe, Negotiation, StaticProbe, negotiate};

/// Coordinates app registration, the one-time start and manual loads.
///
/// Built with [`Orchestrator::builder`].
pub struct Orchestrator {
    context: Arc<OrchestratorContext>,
    engine: Arc<dyn LifecycleEngine>,
    prefetcher: Arc<dyn PrefetchScheduler>,
    probe: Arc<dyn CapabilityProbe>,
    start_lock: Mutex<()>,
}

impl Orchestrator {
    /// Start building an orchestrator.
    #[must_use]
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::default()
    }

    /// Register apps for route-driven activation.
    ///
    /// Apps whose name is already registered are skipped. Each admitted app
    /// is handed to the engine with a loader that waits for [`start`] before
    /// fetching anything. Returns the admitted names.
    ///
    /// [`start`]: Self::start
    pub async fn register_micro_apps(
        &self,
        apps: Vec<RegistrableApp>,
        life_cycles: Option<FrameworkLifeCycles>,
    ) -> Vec<AppName> {
        let admitted = self.context.registry().admit(apps).await;
        let life_cycles = life_cycles.map(Arc::new);

        for app in &admitted {
            let activation = AppActivation::new(
                Arc::clone(app),
                Arc::clone(&self.context),
                life_cycles.clone(),
            );
            self.engine.register_application(ApplicationRegistration {
                name: app.name.clone(),
                app: Arc::new(activation),
                active_when: app.active_rule.clone(),
                custom_props: app.props.clone(),
            });
            info!(app = %app.name, entry = %app.entry, "Registered micro app");
        }

        admitted.iter().map(|app| app.name.clone()).collect()
    }

    /// Register every app described by a manifest.
    ///
    /// # Errors
    ///
    /// Returns an error if a manifest entry cannot be turned into an app.
    pub async fn register_manifest(
        &self,
        manifest: AppManifest,
        life_cycles: Option<FrameworkLifeCycles>,
    ) -> OrchestratorResult<Vec<AppName>> {
        let apps = manifest.into_registrable()?;
        Ok(self.register_micro_apps(apps, life_cycles).await)
    }

    /// Finalize the configuration and begin orchestration.
    ///
    /// In order: merge `options` over the defaults, negotiate the sandbox,
    /// publish the configuration, trigger prefetch, start the engine and
    /// open the start gate. Waiting activations proceed only after the
    /// configuration is published.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::AlreadyStarted`] on a second call.
    pub async fn start(&self, options: StartOptions) -> OrchestratorResult<Negotiation> {
        let _guard = self.start_lock.lock().await;
        if self.context.gate().is_resolved() {
            warn!("start called more than once; ignoring");
            return Err(OrchestratorError::AlreadyStarted);
        }

        let mut configuration = FrameworkConfiguration::from_options(options);
        let negotiation = negotiate(&mut configuration, self.probe.as_ref());
        let flags = configuration.isolation_flags();

        let configuration = Arc::new(configuration);
        self.context.publish(Arc::clone(&configuration)).await;

        let apps = self.context.registry().snapshot().await;
        trigger_prefetch(
            self.prefetcher.as_ref(),
            &apps,
            &flags.prefetch,
            configuration.import_entry_opts(),
        );

        self.engine.start(EngineStartOptions {
            url_reroute_only: flags.url_reroute_only,
        });
        self.context.gate().resolve();

        info!(
            singular = flags.singular,
            sandbox = flags.sandbox.is_enabled(),
            isolation = %negotiation.strategy,
            prefetch = %flags.prefetch,
            "Orchestrator started"
        );
        Ok(negotiation)
    }

    /// Load start options from the layered config files, then [`start`].
    ///
    /// `home_override` replaces user-level discovery and is treated as the
    /// `.tessera` directory itself.
    ///
    /// [`start`]: Self::start
    ///
    /// # Errors
    ///
    /// Returns a config error if loading fails, or
    /// [`OrchestratorError::AlreadyStarted`] on a second start.
    pub async fn start_from_config(
        &self,
        workspace_root: Option<&Path>,
        home_override: Option<&Path>,
    ) -> OrchestratorResult<Negotiation> {
        let resolved = tessera_config::load(workspace_root, home_override)?;
        if !resolved.loaded_files.is_empty() {
            info!(files = ?resolved.loaded_files, "loaded start options");
        }
        self.start(resolved.options).await
    }

    /// Mount an app immediately, outside route matching.
    ///
    /// Does not wait for [`start`](Self::start). Without an explicit
    /// `configuration`, the configuration published when the load runs is
    /// used. The app is mounted into a fresh container.
    pub fn load_micro_app(
        &self,
        app: LoadableApp,
        configuration: Option<FrameworkConfiguration>,
        life_cycles: Option<FrameworkLifeCycles>,
    ) -> Arc<dyn MicroApp> {
        let options = ParcelOptions {
            container: ContainerId::new(),
            props: app.props.clone(),
        };
        info!(app = %app.name, container = %options.container, "Mounting micro app manually");

        let loader = ParcelActivation::new(
            app,
            configuration.map(Arc::new),
            Arc::clone(&self.context),
            life_cycles.map(Arc::new),
        );
        self.engine.mount_root_parcel(Arc::new(loader), options)
    }

    /// The currently published configuration.
    ///
    /// Before [`start`](Self::start) this is the default configuration.
    pub async fn configuration(&self) -> Arc<FrameworkConfiguration> {
        self.context.configuration().await
    }

    /// Whether [`start`](Self::start) has completed.
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.context.gate().is_resolved()
    }

    /// Registered app names in registration order.
    pub async fn registered_apps(&self) -> Vec<AppName> {
        self.context.registry().names().await
    }

    /// The shared context.
    #[must_use]
    pub fn context(&self) -> &Arc<OrchestratorContext> {
        &self.context
    }
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Orchestrator`].
///
/// The engine and entry loader are required. Prefetching defaults to
/// [`NoPrefetch`] and the capability probe to [`StaticProbe::supported`].
#[derive(Default)]
pub struct OrchestratorBuilder {
    engine: Option<Arc<dyn LifecycleEngine>>,
    entry_loader: Option<Arc<dyn RemoteEntryLoader>>,
    prefetcher: Option<Arc<dyn PrefetchScheduler>>,
    probe: Option<Arc<dyn CapabilityProbe>>,
}

impl OrchestratorBuilder {
    /// Set the lifecycle engine.
    #[must_use]
    pub fn engine(mut self, engine: Arc<dyn LifecycleEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Set the remote entry loader.
    #[must_use]
    pub fn entry_loader(mut self, loader: Arc<dyn RemoteEntryLoader>) -> Self {
        self.entry_loader = Some(loader);
        self
    }

    /// Set the prefetch scheduler.
    #[must_use]
    pub fn prefetch_scheduler(mut self, scheduler: Arc<dyn PrefetchScheduler>) -> Self {
        self.prefetcher = Some(scheduler);
        self
    }

    /// Set the sandbox capability probe.
    #[must_use]
    pub fn capability_probe(mut self, probe: Arc<dyn CapabilityProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    /// Build the orchestrator.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::MissingComponent`] if the engine or the
    /// entry loader was not set.
    pub fn build(self) -> OrchestratorResult<Orchestrator> {
        let engine = self
            .engine
            .ok_or(OrchestratorError::MissingComponent("lifecycle engine"))?;
        let entry_loader = self
            .entry_loader
            .ok_or(OrchestratorError::MissingComponent("remote entry loader"))?;

        Ok(Orchestrator {
            context: Arc::new(OrchestratorContext::new(entry_loader)),
            engine,
            prefetcher: self.prefetcher.unwrap_or_else(|| Arc::new(NoPrefetch)),
            probe: self
                .probe
                .unwrap_or_else(|| Arc::new(StaticProbe::supported())),
            start_lock: Mutex::new(()),
        })
    }
}

impl fmt::Debug for OrchestratorBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrchestratorBuilder")
            .field("engine", &self.engine.is_some())
            .field("entry_loader", &self.entry_loader.is_some())
            .field("prefetcher", &self.prefetcher.is_some())
            .field("probe", &self.probe.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::lifecycle::LifecycleBundle;

    struct NullLoader;

    #[async_trait]
    impl RemoteEntryLoader for NullLoader {
        async fn load_app(
            &self,
            _app: &LoadableApp,
            _configuration: &FrameworkConfiguration,
            _life_cycles: Option<&FrameworkLifeCycles>,
        ) -> OrchestratorResult<LifecycleBundle> {
            Ok(LifecycleBundle::default())
        }
    }

    #[test]
    fn test_builder_requires_engine() {
        let result = Orchestrator::builder()
            .entry_loader(Arc::new(NullLoader))
            .build();
        assert!(matches!(
            result,
            Err(OrchestratorError::MissingComponent("lifecycle engine"))
        ));
    }

    #[test]
    fn test_builder_reports_engine_first() {
        assert!(matches!(
            Orchestrator::builder().build(),
            Err(OrchestratorError::MissingComponent("lifecycle engine"))
        ));
    }
}
