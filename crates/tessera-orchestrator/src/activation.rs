//! Bundle loaders handed to the lifecycle engine.
//!
//! - [`AppActivation`]: route-driven; waits for `start`, then loads with the
//!   published configuration and brackets mount with loading signals
//! - [`ParcelActivation`]: manual; loads immediately with the supplied or
//!   current configuration

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tessera_config::FrameworkConfiguration;
use tracing::{debug, warn};

use crate::app::{AppName, LoadableApp, RegistrableApp};
use crate::context::OrchestratorContext;
use crate::engine::BundleLoader;
use crate::error::OrchestratorResult;
use crate::lifecycle::{FrameworkLifeCycles, LifecycleBundle};

/// Loader for a registered app, invoked by the engine on first activation.
pub struct AppActivation {
    app: Arc<RegistrableApp>,
    context: Arc<OrchestratorContext>,
    life_cycles: Option<Arc<FrameworkLifeCycles>>,
}

impl AppActivation {
    /// Create a loader for `app`.
    #[must_use]
    pub fn new(
        app: Arc<RegistrableApp>,
        context: Arc<OrchestratorContext>,
        life_cycles: Option<Arc<FrameworkLifeCycles>>,
    ) -> Self {
        Self {
            app,
            context,
            life_cycles,
        }
    }
}

#[async_trait]
impl BundleLoader for AppActivation {
    fn app_name(&self) -> &AppName {
        &self.app.name
    }

    async fn load(&self) -> OrchestratorResult<LifecycleBundle> {
        self.app.loader.signal(true);

        if !self.context.gate().is_resolved() {
            debug!(app = %self.app.name, "activation waiting for start");
        }
        self.context.gate().wait().await;

        // Read after the gate so the load sees what `start` published.
        let configuration = self.context.configuration().await;
        let loadable = self.app.loadable();

        let bundle = self
            .context
            .entry_loader()
            .load_app(&loadable, &configuration, self.life_cycles.as_deref())
            .await
            .inspect_err(|e| warn!(app = %self.app.name, error = %e, "app load failed"))?;

        debug!(app = %self.app.name, "app loaded");
        Ok(bundle.with_loading_bracket(&self.app.loader))
    }
}

impl fmt::Debug for AppActivation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppActivation")
            .field("app", &self.app.name)
            .finish_non_exhaustive()
    }
}

/// Loader for a manually mounted app. Never waits for `start`.
pub struct ParcelActivation {
    app: LoadableApp,
    configuration: Option<Arc<FrameworkConfiguration>>,
    context: Arc<OrchestratorContext>,
    life_cycles: Option<Arc<FrameworkLifeCycles>>,
}

impl ParcelActivation {
    /// Create a loader for `app`.
    ///
    /// With no explicit `configuration`, the configuration published at
    /// load time is used.
    #[must_use]
    pub fn new(
        app: LoadableApp,
        configuration: Option<Arc<FrameworkConfiguration>>,
        context: Arc<OrchestratorContext>,
        life_cycles: Option<Arc<FrameworkLifeCycles>>,
    ) -> Self {
        Self {
            app,
            configuration,
            context,
            life_cycles,
        }
    }
}

#[async_trait]
impl BundleLoader for ParcelActivation {
    fn app_name(&self) -> &AppName {
        &self.app.name
    }

    async fn load(&self) -> OrchestratorResult<LifecycleBundle> {
        let configuration = match &self.configuration {
            Some(configuration) => Arc::clone(configuration),
            None => self.context.configuration().await,
        };

        self.context
            .entry_loader()
            .load_app(&self.app, &configuration, self.life_cycles.as_deref())
            .await
            .inspect_err(|e| warn!(app = %self.app.name, error = %e, "manual app load failed"))
    }
}

impl fmt::Debug for ParcelActivation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParcelActivation")
            .field("app", &self.app.name)
            .field("explicit_configuration", &self.configuration.is_some())
            .finish_non_exhaustive()
    }
}
