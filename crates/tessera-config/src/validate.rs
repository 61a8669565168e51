//! Post-merge configuration validation.
//!
//! Validates that deserialized [`StartOptions`] values are well-formed and
//! that cross-field invariants hold.

use crate::error::{ConfigError, ConfigResult};
use crate::types::{PrefetchStrategy, SandboxOption, StartOptions};

/// Validate a fully-merged and deserialized set of start options.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(options: &StartOptions) -> ConfigResult<()> {
    validate_prefetch(options)?;
    validate_sandbox(options)?;
    validate_import_entry(options)?;
    Ok(())
}

fn validate_prefetch(options: &StartOptions) -> ConfigResult<()> {
    let Some(PrefetchStrategy::Named(names)) = &options.prefetch else {
        return Ok(());
    };

    for name in names {
        if name.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                field: "prefetch".to_owned(),
                message: "prefetch app names must not be empty".to_owned(),
            });
        }
        if name.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(ConfigError::ValidationError {
                field: "prefetch".to_owned(),
                message: format!("prefetch app name '{name}' contains whitespace"),
            });
        }
    }

    Ok(())
}

fn validate_sandbox(options: &StartOptions) -> ConfigResult<()> {
    if let Some(SandboxOption::Enabled(config)) = &options.sandbox
        && config.strict_style_isolation
        && config.experimental_style_isolation
    {
        return Err(ConfigError::ValidationError {
            field: "sandbox".to_owned(),
            message: "strict_style_isolation and experimental_style_isolation are mutually exclusive"
                .to_owned(),
        });
    }
    Ok(())
}

fn validate_import_entry(options: &StartOptions) -> ConfigResult<()> {
    if options.import_entry.keys().any(|key| key.trim().is_empty()) {
        return Err(ConfigError::ValidationError {
            field: "import_entry".to_owned(),
            message: "passthrough option keys must not be empty".to_owned(),
        });
    }
    Ok(())
}
