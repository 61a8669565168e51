//! Prelude module - commonly used types for convenient import.
//!
//! Use `use tessera_telemetry::prelude::*;` to import all essential types.

// Errors
pub use crate::{TelemetryError, TelemetryResult};

// Logging configuration
pub use crate::{FileLogConfig, FileRotation, LogConfig, LogFormat, LogTarget};

// Setup functions
pub use crate::{capture_dispatch, setup_default_logging, setup_logging};
