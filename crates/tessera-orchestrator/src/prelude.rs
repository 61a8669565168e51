//! Common imports for hosts embedding the orchestrator.
//!
//! ```rust,ignore
//! use tessera_orchestrator::prelude::*;
//! ```

pub use crate::{
    ActiveRule, AppName, BundleLoader, FrameworkConfiguration, FrameworkLifeCycles, LifecycleBundle,
    LifecycleEngine, LifecycleFn, LoadableApp, LoadingIndicator, MicroApp, Orchestrator,
    OrchestratorError, OrchestratorResult, PrefetchScheduler, PrefetchStrategy, RegistrableApp,
    RemoteEntryLoader, SandboxOption, StartOptions,
};
