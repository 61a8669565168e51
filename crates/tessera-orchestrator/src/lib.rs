//! Micro app orchestration core for Tessera.
//!
//! Sits between a host application and a lifecycle engine:
//!
//! - [`AppRegistry`]: idempotent, name-keyed registration
//! - [`StartGate`]: no app loads before [`Orchestrator::start`] publishes
//!   the final configuration
//! - [`LifecycleBundle::with_loading_bracket`]: loading signals around mount
//! - [`negotiate`]: picks proxy or snapshot isolation, forcing singular mode
//!   when only the snapshot sandbox is available
//! - [`Orchestrator::load_micro_app`]: manual mounts that bypass the gate
//! - [`trigger_prefetch`]: hands registered apps to a [`PrefetchScheduler`]
//!
//! Fetching entries, evaluating scripts and route matching live behind the
//! [`RemoteEntryLoader`] and [`LifecycleEngine`] traits.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod activation;
pub mod app;
pub mod context;
pub mod engine;
pub mod error;
pub mod gate;
pub mod lifecycle;
pub mod loader;
pub mod manifest;
pub mod orchestrator;
pub mod prefetch;
pub mod prelude;
pub mod registry;
pub mod sandbox;

pub use activation::{AppActivation, ParcelActivation};
pub use app::{ActiveRule, AppName, LoadableApp, LoadingIndicator, RegistrableApp};
pub use context::OrchestratorContext;
pub use engine::{
    ApplicationRegistration, BundleLoader, ContainerId, EngineStartOptions, LifecycleEngine,
    MicroApp, MicroAppStatus, ParcelOptions,
};
pub use error::{OrchestratorError, OrchestratorResult};
pub use gate::StartGate;
pub use lifecycle::{
    FrameworkLifeCycles, HookPhase, Lifecycle, LifecycleBundle, LifecycleFn, LifecycleFuture,
    LifecycleHook, LifecyclePhase,
};
pub use loader::RemoteEntryLoader;
pub use manifest::{AppManifest, MANIFEST_FILE_NAME, ManifestApp, ManifestRule};
pub use orchestrator::{Orchestrator, OrchestratorBuilder};
pub use prefetch::{NoPrefetch, PrefetchScheduler, trigger_prefetch};
pub use registry::AppRegistry;
pub use sandbox::{CapabilityProbe, Negotiation, StaticProbe, negotiate};

pub use tessera_config::{
    FrameworkConfiguration, ImportEntryOpts, IsolationStrategy, PrefetchStrategy, SandboxConfig,
    SandboxOption, StartOptions,
};
