//! The remote entry loader seam.

use async_trait::async_trait;
use tessera_config::FrameworkConfiguration;

use crate::app::LoadableApp;
use crate::error::OrchestratorResult;
use crate::lifecycle::{FrameworkLifeCycles, LifecycleBundle};

/// Fetches an app's entry, evaluates it inside the configured sandbox and
/// returns its lifecycle bundle.
///
/// Implementations own HTML/JS fetching, script evaluation and style
/// isolation. The orchestrator only decides *when* loading may happen and
/// with which configuration.
#[async_trait]
pub trait RemoteEntryLoader: Send + Sync {
    /// Load one app.
    ///
    /// `life_cycles` are the framework hooks supplied at registration or
    /// manual load time, forwarded untouched.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::LoadFailed`](crate::OrchestratorError::LoadFailed)
    /// or any error raised while evaluating the entry.
    async fn load_app(
        &self,
        app: &LoadableApp,
        configuration: &FrameworkConfiguration,
        life_cycles: Option<&FrameworkLifeCycles>,
    ) -> OrchestratorResult<LifecycleBundle>;
}
