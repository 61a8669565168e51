//! Configuration error types.

use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A config file could not be read.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path of the file that failed to read.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A config file (or the merged tree) could not be parsed.
    #[error("failed to parse config {path}: {source}")]
    ParseError {
        /// Path of the offending file, or a synthetic label.
        path: String,
        /// Underlying TOML error.
        source: toml::de::Error,
    },

    /// A configuration value is out of range or inconsistent.
    #[error("invalid value for {field}: {message}")]
    ValidationError {
        /// Dotted path of the field.
        field: String,
        /// What is wrong with it.
        message: String,
    },

    /// The user's home directory could not be determined.
    #[error("could not determine home directory")]
    NoHomeDir,
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
