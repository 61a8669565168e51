//! Tessera Telemetry - Logging for the Tessera micro-app orchestrator.
//!
//! Builds the `tracing` subscriber a host installs around the orchestrator,
//! and the scoped subscriber `tessera-test` uses to capture log output.
//!
//! # Example
//!
//! ```rust,no_run
//! use tessera_telemetry::{LogConfig, LogFormat, setup_logging};
//!
//! # fn main() -> Result<(), tessera_telemetry::TelemetryError> {
//! let config = LogConfig::new("debug")
//!     .with_format(LogFormat::Pretty)
//!     .with_directive("tessera_orchestrator=trace");
//!
//! setup_logging(&config)?;
//! tracing::info!("host started");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{
    FileLogConfig, FileRotation, LOG_ENV_VAR, LogConfig, LogFormat, LogTarget, capture_dispatch,
    setup_default_logging, setup_logging,
};
