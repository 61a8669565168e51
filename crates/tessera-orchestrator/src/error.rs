//! Orchestrator error types.

use std::path::PathBuf;

use crate::app::AppName;
use crate::lifecycle::LifecyclePhase;

/// Errors from orchestrator operations.
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    /// The app name is invalid.
    #[error("invalid app name: {0}")]
    InvalidName(String),

    /// Fetching or evaluating an app's entry failed.
    #[error("app load failed: {app} - {message}")]
    LoadFailed {
        /// The app that failed to load.
        app: AppName,
        /// Failure reason.
        message: String,
    },

    /// A lifecycle step returned an error.
    #[error("{phase} failed for app {app}: {message}")]
    LifecycleFailed {
        /// The app whose lifecycle failed.
        app: AppName,
        /// Which lifecycle phase was running.
        phase: LifecyclePhase,
        /// Failure reason.
        message: String,
    },

    /// `start` was already called on this orchestrator.
    #[error("orchestrator already started")]
    AlreadyStarted,

    /// The builder was not given a required collaborator.
    #[error("orchestrator is missing a {0}")]
    MissingComponent(&'static str),

    /// Failed to read or parse an app manifest.
    #[error("manifest error in {path}: {message}")]
    Manifest {
        /// Path to the manifest file.
        path: PathBuf,
        /// Error description.
        message: String,
    },

    /// Configuration loading failed.
    #[error(transparent)]
    Config(#[from] tessera_config::ConfigError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for orchestrator operations.
pub type OrchestratorResult<T> = Result<T, OrchestratorError>;
