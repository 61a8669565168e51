//! Micro app descriptors.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{OrchestratorError, OrchestratorResult};

/// Unique, stable micro app name.
///
/// Names are the deduplication key of the registry. They must be non-empty
/// and contain no whitespace or control characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct AppName(String);

impl<'de> Deserialize<'de> for AppName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}

impl AppName {
    /// Create a new `AppName`, validating the format.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::InvalidName`] if the name is empty or
    /// contains whitespace or control characters.
    pub fn new(name: impl Into<String>) -> OrchestratorResult<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(OrchestratorError::InvalidName(
                "app name must not be empty".into(),
            ));
        }
        if name.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(OrchestratorError::InvalidName(format!(
                "app name must not contain whitespace or control characters, got: {name:?}"
            )));
        }
        Ok(Self(name))
    }

    /// Create an `AppName` without validation (for tests and internal use).
    #[must_use]
    pub fn from_static(name: &str) -> Self {
        Self(name.to_string())
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AppName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for AppName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for AppName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for AppName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Decides whether an app should be active for a location.
#[derive(Clone)]
pub enum ActiveRule {
    /// Active when the location path starts with this path prefix.
    Prefix(String),
    /// Active when any of the prefixes matches.
    Prefixes(Vec<String>),
    /// Active when the predicate returns `true`.
    Predicate(Arc<dyn Fn(&str) -> bool + Send + Sync>),
}

impl ActiveRule {
    /// Build a rule from an arbitrary predicate over the location.
    pub fn predicate(f: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        Self::Predicate(Arc::new(f))
    }

    /// Check the rule against a location such as `/app/page?x=1#top`.
    ///
    /// Prefixes match on whole path segments: `/app` matches `/app` and
    /// `/app/page` but not `/application`. Query and fragment are ignored.
    #[must_use]
    pub fn matches(&self, location: &str) -> bool {
        match self {
            Self::Prefix(prefix) => path_matches(prefix, location),
            Self::Prefixes(prefixes) => prefixes.iter().any(|p| path_matches(p, location)),
            Self::Predicate(f) => f(location),
        }
    }
}

fn path_matches(prefix: &str, location: &str) -> bool {
    let path = location
        .split(['?', '#'])
        .next()
        .unwrap_or_default();
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return true;
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

impl fmt::Debug for ActiveRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prefix(p) => f.debug_tuple("Prefix").field(p).finish(),
            Self::Prefixes(p) => f.debug_tuple("Prefixes").field(p).finish(),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

impl From<&str> for ActiveRule {
    fn from(prefix: &str) -> Self {
        Self::Prefix(prefix.to_owned())
    }
}

impl From<String> for ActiveRule {
    fn from(prefix: String) -> Self {
        Self::Prefix(prefix)
    }
}

impl From<Vec<String>> for ActiveRule {
    fn from(prefixes: Vec<String>) -> Self {
        Self::Prefixes(prefixes)
    }
}

/// Callback told when an app's loading starts (`true`) and ends (`false`).
#[derive(Clone)]
pub struct LoadingIndicator(Arc<dyn Fn(bool) + Send + Sync>);

impl LoadingIndicator {
    /// Wrap a callback.
    pub fn new(f: impl Fn(bool) + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// An indicator that ignores every signal.
    #[must_use]
    pub fn noop() -> Self {
        Self::new(|_| {})
    }

    /// Report the loading state.
    pub fn signal(&self, loading: bool) {
        (self.0)(loading);
    }
}

impl Default for LoadingIndicator {
    fn default() -> Self {
        Self::noop()
    }
}

impl fmt::Debug for LoadingIndicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LoadingIndicator")
    }
}

fn empty_props() -> Value {
    Value::Object(Map::new())
}

/// An app the host registers for route-driven activation.
#[derive(Debug, Clone)]
pub struct RegistrableApp {
    /// Registry key.
    pub name: AppName,
    /// Where the app's bundle is fetched from.
    pub entry: String,
    /// When the app should be active.
    pub active_rule: ActiveRule,
    /// Loading-state callback.
    pub loader: LoadingIndicator,
    /// Custom props handed to every lifecycle call.
    pub props: Value,
    /// Extra descriptor fields passed through to the entry loader.
    pub extra: Map<String, Value>,
}

impl RegistrableApp {
    /// Describe an app with default props and a no-op loading indicator.
    pub fn new(name: AppName, entry: impl Into<String>, active_rule: impl Into<ActiveRule>) -> Self {
        Self {
            name,
            entry: entry.into(),
            active_rule: active_rule.into(),
            loader: LoadingIndicator::noop(),
            props: empty_props(),
            extra: Map::new(),
        }
    }

    /// Set the loading indicator.
    #[must_use]
    pub fn with_loader(mut self, loader: LoadingIndicator) -> Self {
        self.loader = loader;
        self
    }

    /// Set the custom props.
    #[must_use]
    pub fn with_props(mut self, props: Value) -> Self {
        self.props = props;
        self
    }

    /// Add an extra pass-through field.
    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// The descriptor handed to the entry loader: everything except the
    /// active rule and the loading indicator.
    #[must_use]
    pub fn loadable(&self) -> LoadableApp {
        LoadableApp {
            name: self.name.clone(),
            entry: self.entry.clone(),
            props: self.props.clone(),
            extra: self.extra.clone(),
        }
    }
}

/// An app descriptor as the entry loader sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadableApp {
    /// App name.
    pub name: AppName,
    /// Where the app's bundle is fetched from.
    pub entry: String,
    /// Custom props.
    #[serde(default = "empty_props")]
    pub props: Value,
    /// Extra descriptor fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LoadableApp {
    /// Describe an app for manual loading.
    pub fn new(name: AppName, entry: impl Into<String>) -> Self {
        Self {
            name,
            entry: entry.into(),
            props: empty_props(),
            extra: Map::new(),
        }
    }

    /// Set the custom props.
    #[must_use]
    pub fn with_props(mut self, props: Value) -> Self {
        self.props = props;
        self
    }

    /// Add an extra pass-through field.
    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[test]
    fn test_app_name_valid() {
        assert!(AppName::new("react16").is_ok());
        assert!(AppName::new("vue-app_2").is_ok());
        assert!(AppName::new("@scope/app").is_ok());
    }

    #[test]
    fn test_app_name_invalid() {
        assert!(AppName::new("").is_err());
        assert!(AppName::new("two words").is_err());
        assert!(AppName::new("tab\there").is_err());
        assert!(AppName::new("bell\u{7}").is_err());
    }

    #[test]
    fn test_app_name_deserialize_validates() {
        let ok: Result<AppName, _> = serde_json::from_str("\"shell\"");
        assert!(ok.is_ok());
        let bad: Result<AppName, _> = serde_json::from_str("\"bad name\"");
        assert!(bad.is_err());
    }

    #[test]
    fn test_prefix_matches_segments() {
        let rule = ActiveRule::from("/app");
        assert!(rule.matches("/app"));
        assert!(rule.matches("/app/"));
        assert!(rule.matches("/app/settings?tab=1"));
        assert!(rule.matches("/app#anchor"));
        assert!(!rule.matches("/application"));
        assert!(!rule.matches("/other/app"));
    }

    #[test]
    fn test_trailing_slash_and_root_prefix() {
        assert!(ActiveRule::from("/app/").matches("/app"));
        assert!(ActiveRule::from("/").matches("/anything/at/all"));
    }

    #[test]
    fn test_prefixes_match_any() {
        let rule = ActiveRule::from(vec!["/a".to_owned(), "/b".to_owned()]);
        assert!(rule.matches("/b/page"));
        assert!(!rule.matches("/c"));
    }

    #[test]
    fn test_predicate_rule() {
        let rule = ActiveRule::predicate(|location| location.contains("admin"));
        assert!(rule.matches("/x/admin"));
        assert!(!rule.matches("/x"));
        assert_eq!(format!("{rule:?}"), "Predicate(..)");
    }

    #[test]
    fn test_loading_indicator_forwards_signals() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let indicator = LoadingIndicator::new(move |loading| sink.lock().unwrap().push(loading));

        indicator.signal(true);
        indicator.signal(false);

        assert_eq!(*seen.lock().unwrap(), vec![true, false]);
    }

    #[test]
    fn test_loadable_drops_rule_and_loader() {
        let app = RegistrableApp::new(AppName::from_static("shell"), "//localhost:7100", "/shell")
            .with_props(serde_json::json!({"theme": "dark"}))
            .with_extra("container", "#root");

        let loadable = app.loadable();
        assert_eq!(loadable.name, "shell");
        assert_eq!(loadable.entry, "//localhost:7100");
        assert_eq!(loadable.props["theme"], "dark");
        assert_eq!(loadable.extra["container"], "#root");
    }

    #[test]
    fn test_loadable_serializes_extra_flat() {
        let loadable = LoadableApp::new(AppName::from_static("shell"), "//cdn/shell")
            .with_extra("container", "#root");
        let json = serde_json::to_value(&loadable).unwrap();
        assert_eq!(json["container"], "#root");
        assert_eq!(json["props"], serde_json::json!({}));
    }
}
