//! Config file discovery and layered loading.
//!
//! Implements the [`load`] algorithm:
//! 1. Parse `defaults.toml` → base
//! 2. Merge `/etc/tessera/config.toml` (system)
//! 3. Merge `~/.tessera/config.toml` or `$TESSERA_HOME/config.toml` (user)
//! 4. Merge `{workspace}/.tessera/config.toml` (workspace)
//! 5. Apply env var fallbacks for fields no file set
//! 6. Deserialize merged tree → [`StartOptions`]
//! 7. Validate
//! 8. Return [`ResolvedConfig`]

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::env::{ENV_HOME, apply_env_fallbacks, collect_env_vars};
use crate::error::{ConfigError, ConfigResult};
use crate::merge::{ConfigLayer, FieldSources, deep_merge_tracking, record_all_leaves};
use crate::types::StartOptions;
use crate::validate;

/// Embedded default configuration.
const DEFAULTS_TOML: &str = include_str!("defaults.toml");

/// Maximum allowed config file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1_048_576;

/// The outcome of a layered load: the options plus where each came from.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// The merged, validated start options.
    pub options: StartOptions,
    /// Which layer set each leaf field.
    pub field_sources: FieldSources,
    /// Config files that were found and merged, in merge order.
    pub loaded_files: Vec<String>,
}

/// Load start options with layered file precedence.
///
/// `workspace_root` is the root of the host project. If `None`, the
/// workspace layer is skipped.
///
/// `home_override` replaces user-level discovery: the path is treated as
/// the `.tessera` directory itself.
///
/// # Errors
///
/// Returns a [`ConfigError`] if any config file is malformed, or if the
/// final merged options fail validation.
pub fn load(
    workspace_root: Option<&Path>,
    home_override: Option<&Path>,
) -> ConfigResult<ResolvedConfig> {
    let env_vars = collect_env_vars();

    // 1. Parse embedded defaults.
    let mut merged: toml::Value =
        toml::from_str(DEFAULTS_TOML).map_err(|e| ConfigError::ParseError {
            path: "<embedded defaults>".to_owned(),
            source: e,
        })?;

    let mut field_sources = FieldSources::new();
    let mut loaded_files = Vec::new();
    record_all_leaves(&merged, "", &ConfigLayer::Defaults, &mut field_sources);

    // 2. System config.
    let system_path = PathBuf::from("/etc/tessera/config.toml");
    if let Some(overlay) = try_load_file(&system_path)? {
        deep_merge_tracking(
            &mut merged,
            &overlay,
            "",
            &ConfigLayer::System,
            &mut field_sources,
        );
        loaded_files.push(system_path.display().to_string());
        info!(path = %system_path.display(), "loaded system config");
    }

    // 3. User config.
    let user_config = if let Some(h) = home_override {
        let path = h.join("config.toml");
        try_load_file(&path)?.map(|overlay| (overlay, path))
    } else {
        let from_home = match home_directory() {
            Ok(home) => {
                let path = home.join(".tessera").join("config.toml");
                try_load_file(&path)?.map(|overlay| (overlay, path))
            },
            Err(e) => {
                debug!(error = %e, "skipping home-directory config");
                None
            },
        };
        match (from_home, env_vars.get(ENV_HOME)) {
            (Some(found), _) => Some(found),
            (None, Some(raw)) => match validate_tessera_home(raw) {
                Some(dir) => {
                    let path = dir.join("config.toml");
                    try_load_file(&path)?.map(|overlay| (overlay, path))
                },
                None => {
                    warn!(path = %raw, "TESSERA_HOME is not a directory; ignoring");
                    None
                },
            },
            (None, None) => None,
        }
    };

    if let Some((overlay, path)) = user_config {
        deep_merge_tracking(
            &mut merged,
            &overlay,
            "",
            &ConfigLayer::User,
            &mut field_sources,
        );
        loaded_files.push(path.display().to_string());
        info!(path = %path.display(), "loaded user config");
    }

    // 4. Workspace config.
    if let Some(ws_root) = workspace_root {
        let ws_path = ws_root.join(".tessera").join("config.toml");
        if let Some(overlay) = try_load_file(&ws_path)? {
            deep_merge_tracking(
                &mut merged,
                &overlay,
                "",
                &ConfigLayer::Workspace,
                &mut field_sources,
            );
            loaded_files.push(ws_path.display().to_string());
            info!(path = %ws_path.display(), "loaded workspace config");
        }
    }

    // 5. Env var fallbacks for fields still at their defaults.
    let env_count = apply_env_fallbacks(&mut merged, &mut field_sources, &env_vars);
    if env_count > 0 {
        debug!(count = env_count, "applied environment variable fallbacks");
    }

    // 6. Deserialize.
    let options: StartOptions =
        merged
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::ParseError {
                path: "<merged config>".to_owned(),
                source: e,
            })?;

    // 7. Validate.
    validate::validate(&options)?;

    Ok(ResolvedConfig {
        options,
        field_sources,
        loaded_files,
    })
}

/// Load start options from a single file (no layering, no defaults).
///
/// Fields absent from the file stay unset and fall back to the framework
/// defaults at `start`.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file cannot be read, parsed, or fails
/// validation.
pub fn load_file(path: &Path) -> ConfigResult<StartOptions> {
    let Some(value) = try_load_file(path)? else {
        return Err(ConfigError::ReadError {
            path: path.display().to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "config file not found"),
        });
    };

    let options: StartOptions =
        value
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::ParseError {
                path: path.display().to_string(),
                source: e,
            })?;

    validate::validate(&options)?;
    Ok(options)
}

/// Try to load a file, returning `None` if the file doesn't exist.
///
/// Uses a single read operation to avoid TOCTOU races (no separate
/// exists/metadata checks before reading).
fn try_load_file(path: &Path) -> ConfigResult<Option<toml::Value>> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "config file not found, skipping");
            return Ok(None);
        },
        Err(e) => {
            return Err(ConfigError::ReadError {
                path: path.display().to_string(),
                source: e,
            });
        },
    };

    if content.len() as u64 > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::ValidationError {
            field: path.display().to_string(),
            message: format!(
                "config file is {} bytes, exceeding the {} byte limit",
                content.len(),
                MAX_CONFIG_FILE_SIZE
            ),
        });
    }

    let value: toml::Value = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(Some(value))
}

/// Canonicalize `TESSERA_HOME`, accepting only existing directories.
fn validate_tessera_home(raw_path: &str) -> Option<PathBuf> {
    let canonical = PathBuf::from(raw_path).canonicalize().ok()?;
    canonical.is_dir().then_some(canonical)
}

/// Determine the user's home directory.
fn home_directory() -> ConfigResult<PathBuf> {
    directories::BaseDirs::new()
        .map(|d| d.home_dir().to_path_buf())
        .ok_or(ConfigError::NoHomeDir)
}
