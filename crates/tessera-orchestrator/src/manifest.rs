//! Declarative app manifests (`apps.toml`).
//!
//! ```toml
//! [[apps]]
//! name = "dashboard"
//! entry = "//localhost:7100"
//! active_rule = "/dashboard"
//!
//! [[apps]]
//! name = "settings"
//! entry = "//localhost:7200"
//! active_rule = ["/settings", "/profile"]
//! props = { theme = "dark" }
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::app::{ActiveRule, AppName, RegistrableApp};
use crate::error::{OrchestratorError, OrchestratorResult};

/// Conventional manifest file name.
pub const MANIFEST_FILE_NAME: &str = "apps.toml";

/// Maximum allowed manifest size (1 MB).
const MAX_MANIFEST_SIZE: u64 = 1_048_576;

/// A set of apps declared in TOML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppManifest {
    /// Declared apps, in registration order.
    #[serde(default)]
    pub apps: Vec<ManifestApp>,
}

/// One `[[apps]]` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestApp {
    /// App name.
    pub name: AppName,
    /// Where the app's bundle is fetched from.
    pub entry: String,
    /// Path prefix or prefixes that activate the app.
    pub active_rule: ManifestRule,
    /// Custom props.
    #[serde(default)]
    pub props: Option<Value>,
    /// Extra pass-through fields.
    #[serde(default)]
    pub extra: Map<String, Value>,
}

/// A path prefix rule as written in TOML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ManifestRule {
    /// A single prefix.
    One(String),
    /// Any of several prefixes.
    Many(Vec<String>),
}

impl ManifestRule {
    fn prefixes(&self) -> &[String] {
        match self {
            Self::One(prefix) => std::slice::from_ref(prefix),
            Self::Many(prefixes) => prefixes,
        }
    }
}

impl From<ManifestRule> for ActiveRule {
    fn from(rule: ManifestRule) -> Self {
        match rule {
            ManifestRule::One(prefix) => Self::Prefix(prefix),
            ManifestRule::Many(prefixes) => Self::Prefixes(prefixes),
        }
    }
}

impl AppManifest {
    /// Parse and validate a manifest from a string.
    ///
    /// `origin` is only used in error messages.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::Manifest`] if the TOML is malformed or
    /// fails validation.
    pub fn from_toml_str(content: &str, origin: &Path) -> OrchestratorResult<Self> {
        let manifest: Self = toml::from_str(content).map_err(|e| OrchestratorError::Manifest {
            path: origin.to_path_buf(),
            message: e.to_string(),
        })?;
        manifest.validate(origin)?;
        Ok(manifest)
    }

    /// Read, parse and validate a manifest file.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::Io`] if the file cannot be read, or
    /// [`OrchestratorError::Manifest`] if it is too large, malformed or
    /// invalid.
    pub fn load(path: &Path) -> OrchestratorResult<Self> {
        let content = std::fs::read_to_string(path)?;
        if content.len() as u64 > MAX_MANIFEST_SIZE {
            return Err(OrchestratorError::Manifest {
                path: path.to_path_buf(),
                message: format!(
                    "manifest is {} bytes, exceeding the {MAX_MANIFEST_SIZE} byte limit",
                    content.len()
                ),
            });
        }
        let manifest = Self::from_toml_str(&content, path)?;
        debug!(path = %path.display(), apps = manifest.apps.len(), "loaded app manifest");
        Ok(manifest)
    }

    /// Load `apps.toml` from a directory if present.
    ///
    /// # Errors
    ///
    /// Same as [`load`](Self::load), except a missing file yields `Ok(None)`.
    pub fn load_from_dir(dir: &Path) -> OrchestratorResult<Option<Self>> {
        let path: PathBuf = dir.join(MANIFEST_FILE_NAME);
        match Self::load(&path) {
            Ok(manifest) => Ok(Some(manifest)),
            Err(OrchestratorError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no app manifest");
                Ok(None)
            },
            Err(e) => Err(e),
        }
    }

    fn validate(&self, origin: &Path) -> OrchestratorResult<()> {
        let invalid = |message: String| OrchestratorError::Manifest {
            path: origin.to_path_buf(),
            message,
        };

        let mut seen = HashSet::new();
        for app in &self.apps {
            if !seen.insert(&app.name) {
                return Err(invalid(format!("app '{}' is declared twice", app.name)));
            }
            if app.entry.trim().is_empty() {
                return Err(invalid(format!("app '{}' has an empty entry", app.name)));
            }
            let prefixes = app.active_rule.prefixes();
            if prefixes.is_empty() {
                return Err(invalid(format!("app '{}' has no active_rule paths", app.name)));
            }
            if let Some(bad) = prefixes.iter().find(|p| !p.starts_with('/')) {
                return Err(invalid(format!(
                    "app '{}' active_rule '{bad}' must start with '/'",
                    app.name
                )));
            }
            if app.props.as_ref().is_some_and(|p| !p.is_object()) {
                return Err(invalid(format!("app '{}' props must be a table", app.name)));
            }
        }
        Ok(())
    }

    /// Convert into registrable apps with no-op loading indicators.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::LoadFailed`] for an app with an empty
    /// entry. Parsed manifests are validated already, so this only affects
    /// manifests built by hand.
    pub fn into_registrable(self) -> OrchestratorResult<Vec<RegistrableApp>> {
        self.apps
            .into_iter()
            .map(|app| {
                if app.entry.trim().is_empty() {
                    return Err(OrchestratorError::LoadFailed {
                        message: "manifest entry is empty".into(),
                        app: app.name,
                    });
                }
                let mut registrable = RegistrableApp::new(app.name, app.entry, app.active_rule);
                if let Some(props) = app.props {
                    registrable = registrable.with_props(props);
                }
                registrable.extra = app.extra;
                Ok(registrable)
            })
            .collect()
    }
}
