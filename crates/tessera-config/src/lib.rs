#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
//! Framework configuration for the Tessera orchestrator.
//!
//! This crate owns the [`FrameworkConfiguration`] that `start` finalizes and
//! every sub-application load reads, the [`StartOptions`] overrides a host
//! passes in, and a layered loader that builds those overrides from TOML
//! files and environment variables.
//!
//! # Usage
//!
//! ```rust,no_run
//! use tessera_config::{FrameworkConfiguration, StartOptions};
//!
//! // Load with full precedence chain (defaults → system → user → workspace → env).
//! let resolved = tessera_config::load(Some(std::path::Path::new(".")), None).unwrap();
//! let config = FrameworkConfiguration::from_options(resolved.options);
//! println!("singular mode: {}", config.singular);
//! ```
//!
//! # Configuration Precedence
//!
//! From highest to lowest priority:
//!
//! 1. **Workspace** (`{workspace}/.tessera/config.toml`)
//! 2. **User** (`~/.tessera/config.toml`, or `$TESSERA_HOME/config.toml`)
//! 3. **System** (`/etc/tessera/config.toml`)
//! 4. **Environment variables** (`TESSERA_*`), fallback only
//! 5. **Embedded defaults** (`defaults.toml` compiled into binary)
//!
//! # Design
//!
//! This crate has no dependencies on other internal tessera crates. The
//! orchestrator consumes [`FrameworkConfiguration`] directly; isolation
//! negotiation happens there, not here.

/// Environment variable fallback resolution.
pub mod env;
/// Configuration error types.
pub mod error;
/// Configuration file discovery and loading.
pub mod loader;
/// Layered configuration merging with precedence.
pub mod merge;
/// Configuration struct definitions.
pub mod types;
/// Configuration validation rules.
pub mod validate;

// Re-export primary types at the crate root.
pub use error::{ConfigError, ConfigResult};
pub use loader::{ResolvedConfig, load, load_file};
pub use merge::{ConfigLayer, FieldSources};
pub use types::*;
