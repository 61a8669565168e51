//! State shared between the orchestrator and its activation loaders.

use std::fmt;
use std::sync::Arc;

use tessera_config::FrameworkConfiguration;
use tokio::sync::RwLock;

use crate::gate::StartGate;
use crate::loader::RemoteEntryLoader;
use crate::registry::AppRegistry;

/// Registry, published configuration, start gate and entry loader.
///
/// Activation loaders hold an `Arc` to this so they can wait on the gate
/// and read the configuration at load time rather than at registration.
pub struct OrchestratorContext {
    registry: AppRegistry,
    configuration: RwLock<Arc<FrameworkConfiguration>>,
    gate: StartGate,
    entry_loader: Arc<dyn RemoteEntryLoader>,
}

impl OrchestratorContext {
    /// A fresh context: empty registry, default configuration, closed gate.
    #[must_use]
    pub fn new(entry_loader: Arc<dyn RemoteEntryLoader>) -> Self {
        Self {
            registry: AppRegistry::new(),
            configuration: RwLock::new(Arc::new(FrameworkConfiguration::default())),
            gate: StartGate::new(),
            entry_loader,
        }
    }

    /// The app registry.
    #[must_use]
    pub fn registry(&self) -> &AppRegistry {
        &self.registry
    }

    /// The start gate.
    #[must_use]
    pub fn gate(&self) -> &StartGate {
        &self.gate
    }

    /// The remote entry loader.
    #[must_use]
    pub fn entry_loader(&self) -> &Arc<dyn RemoteEntryLoader> {
        &self.entry_loader
    }

    /// The currently published configuration.
    pub async fn configuration(&self) -> Arc<FrameworkConfiguration> {
        Arc::clone(&*self.configuration.read().await)
    }

    /// Replace the published configuration in a single write.
    pub(crate) async fn publish(&self, configuration: Arc<FrameworkConfiguration>) {
        *self.configuration.write().await = configuration;
    }
}

impl fmt::Debug for OrchestratorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrchestratorContext")
            .field("registry", &self.registry)
            .field("gate", &self.gate)
            .finish_non_exhaustive()
    }
}
