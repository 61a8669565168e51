//! The lifecycle engine seam.
//!
//! Route matching, lifecycle sequencing and parcel mounting are the engine's
//! job. The orchestrator only hands it registrations, a start signal and
//! root parcels.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::app::{ActiveRule, AppName};
use crate::error::OrchestratorResult;
use crate::lifecycle::LifecycleBundle;

/// Produces an app's lifecycle bundle when the engine activates it.
#[async_trait]
pub trait BundleLoader: Send + Sync {
    /// The app this loader belongs to.
    fn app_name(&self) -> &AppName;

    /// Fetch and evaluate the app, returning its lifecycle bundle.
    async fn load(&self) -> OrchestratorResult<LifecycleBundle>;
}

impl fmt::Debug for dyn BundleLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BundleLoader")
            .field("app", self.app_name())
            .finish_non_exhaustive()
    }
}

/// A route-driven application handed to the engine.
#[derive(Debug, Clone)]
pub struct ApplicationRegistration {
    /// App name.
    pub name: AppName,
    /// Called by the engine on first activation.
    pub app: Arc<dyn BundleLoader>,
    /// When the engine should activate the app.
    pub active_when: ActiveRule,
    /// Props passed to every lifecycle call.
    pub custom_props: Value,
}

/// Options forwarded to [`LifecycleEngine::start`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStartOptions {
    /// Only reroute on URL changes, not on every history call.
    pub url_reroute_only: bool,
}

/// Identifier of the fresh container a root parcel mounts into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContainerId(Uuid);

impl ContainerId {
    /// A new random container id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ContainerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "container-{}", self.0)
    }
}

/// Options for mounting a root parcel.
#[derive(Debug, Clone)]
pub struct ParcelOptions {
    /// Container the parcel mounts into.
    pub container: ContainerId,
    /// The app's props.
    pub props: Value,
}

/// Status of a manually mounted app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MicroAppStatus {
    /// The bundle is being fetched.
    Loading,
    /// Bootstrap is running.
    Bootstrapping,
    /// Mount is running.
    Mounting,
    /// Mounted and live.
    Mounted,
    /// Unmount is running.
    Unmounting,
    /// Unmounted.
    Unmounted,
    /// The bundle failed to load.
    LoadError(String),
    /// A lifecycle step failed.
    Failed(String),
}

impl MicroAppStatus {
    /// Whether the app has left the load/bootstrap/mount pipeline.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        !matches!(self, Self::Loading | Self::Bootstrapping | Self::Mounting)
    }
}

/// Handle to an app mounted through [`LifecycleEngine::mount_root_parcel`].
#[async_trait]
pub trait MicroApp: Send + Sync {
    /// The app's name.
    fn name(&self) -> &AppName;

    /// The container the app was mounted into.
    fn container(&self) -> ContainerId;

    /// Current status.
    fn status(&self) -> MicroAppStatus;

    /// Resolve once mounting finished.
    ///
    /// # Errors
    ///
    /// Returns the load or lifecycle error that stopped the mount.
    async fn mounted(&self) -> OrchestratorResult<()>;

    /// Unmount the app.
    ///
    /// # Errors
    ///
    /// Returns an error if the app never mounted or unmount fails.
    async fn unmount(&self) -> OrchestratorResult<()>;
}

impl fmt::Debug for dyn MicroApp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MicroApp")
            .field("name", self.name())
            .field("container", &self.container())
            .field("status", &self.status())
            .finish()
    }
}

/// The underlying lifecycle engine.
pub trait LifecycleEngine: Send + Sync {
    /// Register a route-driven application.
    fn register_application(&self, registration: ApplicationRegistration);

    /// Begin route matching and lifecycle management.
    fn start(&self, options: EngineStartOptions);

    /// Mount an app immediately, outside route matching.
    fn mount_root_parcel(
        &self,
        loader: Arc<dyn BundleLoader>,
        options: ParcelOptions,
    ) -> Arc<dyn MicroApp>;
}
