//! Configuration types for the Tessera orchestrator.
//!
//! [`StartOptions`] is what a host hands to `start` (every field optional);
//! [`FrameworkConfiguration`] is the finalized, process-wide value produced by
//! merging those options over the built-in defaults.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

/// Open-ended passthrough bag forwarded to the remote-entry loader and the
/// prefetch scheduler without interpretation.
pub type ImportEntryOpts = serde_json::Map<String, serde_json::Value>;

// ---------------------------------------------------------------------------
// PrefetchStrategy
// ---------------------------------------------------------------------------

/// How registered sub-applications should be fetched in the background.
///
/// In TOML and JSON this is written as `true`/`false`, the string `"all"`,
/// or an array of application names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PrefetchStrategy {
    /// No background loading.
    Disabled,
    /// Prefetch the remaining applications once the first one has mounted.
    #[default]
    Enabled,
    /// Prefetch every registered application immediately.
    All,
    /// Prefetch only the named applications.
    Named(Vec<String>),
}

impl PrefetchStrategy {
    /// Whether any prefetching was requested.
    ///
    /// An empty [`Named`](Self::Named) list still counts as enabled; the
    /// scheduler decides what an empty selection means.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::Disabled)
    }
}

impl From<bool> for PrefetchStrategy {
    fn from(enabled: bool) -> Self {
        if enabled { Self::Enabled } else { Self::Disabled }
    }
}

impl fmt::Display for PrefetchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => f.write_str("false"),
            Self::Enabled => f.write_str("true"),
            Self::All => f.write_str("all"),
            Self::Named(names) => f.write_str(&names.join(",")),
        }
    }
}

impl FromStr for PrefetchStrategy {
    type Err = String;

    /// Parse the environment-variable form: `true`, `false`, `all`, or a
    /// comma-separated list of application names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(Self::Enabled),
            "false" | "0" | "no" => Ok(Self::Disabled),
            "all" => Ok(Self::All),
            "" => Err("empty prefetch strategy".to_owned()),
            _ => Ok(Self::Named(
                trimmed
                    .split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(str::to_owned)
                    .collect(),
            )),
        }
    }
}

impl Serialize for PrefetchStrategy {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Disabled => serializer.serialize_bool(false),
            Self::Enabled => serializer.serialize_bool(true),
            Self::All => serializer.serialize_str("all"),
            Self::Named(names) => names.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for PrefetchStrategy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Flag(bool),
            Keyword(String),
            Names(Vec<String>),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Flag(enabled) => Ok(Self::from(enabled)),
            Repr::Keyword(keyword) if keyword == "all" => Ok(Self::All),
            Repr::Keyword(other) => Err(de::Error::custom(format!(
                "unknown prefetch strategy '{other}'; expected a bool, \"all\", or a list of app names"
            ))),
            Repr::Names(names) => Ok(Self::Named(names)),
        }
    }
}

// ---------------------------------------------------------------------------
// SandboxOption
// ---------------------------------------------------------------------------

/// Extra isolation knobs accepted when the sandbox is written as a table.
///
/// Forwarded to the remote-entry loader; the orchestrator only cares whether
/// the sandbox is enabled at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SandboxConfig {
    /// Mount each application's styles inside a shadow root.
    pub strict_style_isolation: bool,
    /// Rewrite application styles with a scoping prefix.
    pub experimental_style_isolation: bool,
}

/// Whether (and how) sub-applications are isolated from each other.
///
/// Written as `true`/`false` or as a [`SandboxConfig`] table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SandboxOption {
    /// No isolation is applied.
    Disabled,
    /// Isolation is requested with the given options.
    Enabled(SandboxConfig),
}

impl SandboxOption {
    /// Whether isolation was requested.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::Enabled(_))
    }

    /// The table options, if isolation is enabled.
    #[must_use]
    pub fn config(&self) -> Option<&SandboxConfig> {
        match self {
            Self::Enabled(config) => Some(config),
            Self::Disabled => None,
        }
    }
}

impl Default for SandboxOption {
    fn default() -> Self {
        Self::Enabled(SandboxConfig::default())
    }
}

impl From<bool> for SandboxOption {
    fn from(enabled: bool) -> Self {
        if enabled {
            Self::default()
        } else {
            Self::Disabled
        }
    }
}

impl Serialize for SandboxOption {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Disabled => serializer.serialize_bool(false),
            Self::Enabled(config) if *config == SandboxConfig::default() => {
                serializer.serialize_bool(true)
            },
            Self::Enabled(config) => config.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for SandboxOption {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Flag(bool),
            Table(SandboxConfig),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Flag(enabled) => Self::from(enabled),
            Repr::Table(config) => Self::Enabled(config),
        })
    }
}

// ---------------------------------------------------------------------------
// IsolationStrategy
// ---------------------------------------------------------------------------

/// The isolation mechanism chosen during sandbox negotiation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IsolationStrategy {
    /// No sandbox, or negotiation has not run yet.
    #[default]
    None,
    /// Global access is intercepted per application; supports concurrent
    /// applications.
    Proxy,
    /// Global state is captured before activation and restored afterwards;
    /// only correct with a single active application.
    Snapshot,
}

impl IsolationStrategy {
    /// Whether this strategy can isolate more than one mounted application.
    #[must_use]
    pub fn supports_multiple_instances(self) -> bool {
        !matches!(self, Self::Snapshot)
    }
}

impl fmt::Display for IsolationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("none"),
            Self::Proxy => f.write_str("proxy"),
            Self::Snapshot => f.write_str("snapshot"),
        }
    }
}

// ---------------------------------------------------------------------------
// StartOptions
// ---------------------------------------------------------------------------

/// Caller-supplied overrides for `start`.
///
/// Every unset field falls back to the [`FrameworkConfiguration`] default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StartOptions {
    /// Background loading strategy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefetch: Option<PrefetchStrategy>,
    /// Allow at most one mounted application at a time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub singular: Option<bool>,
    /// Isolation request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sandbox: Option<SandboxOption>,
    /// Only reroute on URL changes, not on every history call.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url_reroute_only: Option<bool>,
    /// Passthrough options for the remote-entry loader.
    #[serde(skip_serializing_if = "serde_json::Map::is_empty")]
    pub import_entry: ImportEntryOpts,
}

impl StartOptions {
    /// Empty overrides; `start` will use every default.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the prefetch strategy.
    #[must_use]
    pub fn with_prefetch(mut self, prefetch: impl Into<PrefetchStrategy>) -> Self {
        self.prefetch = Some(prefetch.into());
        self
    }

    /// Set singular mode.
    #[must_use]
    pub fn with_singular(mut self, singular: bool) -> Self {
        self.singular = Some(singular);
        self
    }

    /// Set the sandbox request.
    #[must_use]
    pub fn with_sandbox(mut self, sandbox: impl Into<SandboxOption>) -> Self {
        self.sandbox = Some(sandbox.into());
        self
    }

    /// Set the routing-mode flag.
    #[must_use]
    pub fn with_url_reroute_only(mut self, url_reroute_only: bool) -> Self {
        self.url_reroute_only = Some(url_reroute_only);
        self
    }

    /// Add one passthrough entry for the remote-entry loader.
    #[must_use]
    pub fn with_import_entry(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.import_entry.insert(key.into(), value.into());
        self
    }
}

// ---------------------------------------------------------------------------
// FrameworkConfiguration
// ---------------------------------------------------------------------------

/// The process-wide configuration every sub-application load observes.
///
/// Built once by `start` and adjusted at most once by sandbox negotiation
/// (which may force `singular` and always records `isolation`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameworkConfiguration {
    /// Background loading strategy.
    pub prefetch: PrefetchStrategy,
    /// At most one application mounted at a time.
    pub singular: bool,
    /// Isolation request.
    pub sandbox: SandboxOption,
    /// Routing-mode flag forwarded to the lifecycle engine.
    pub url_reroute_only: bool,
    /// Passthrough options for the remote-entry loader and prefetching.
    pub import_entry: ImportEntryOpts,
    /// Negotiated isolation mechanism.
    pub isolation: IsolationStrategy,
}

impl Default for FrameworkConfiguration {
    fn default() -> Self {
        Self {
            prefetch: PrefetchStrategy::Enabled,
            singular: true,
            sandbox: SandboxOption::default(),
            url_reroute_only: false,
            import_entry: ImportEntryOpts::new(),
            isolation: IsolationStrategy::None,
        }
    }
}

impl FrameworkConfiguration {
    /// Merge `options` over the defaults
    /// `{prefetch: true, singular: true, sandbox: true}`.
    #[must_use]
    pub fn from_options(options: StartOptions) -> Self {
        let defaults = Self::default();
        Self {
            prefetch: options.prefetch.unwrap_or(defaults.prefetch),
            singular: options.singular.unwrap_or(defaults.singular),
            sandbox: options.sandbox.unwrap_or(defaults.sandbox),
            url_reroute_only: options
                .url_reroute_only
                .unwrap_or(defaults.url_reroute_only),
            import_entry: options.import_entry,
            isolation: defaults.isolation,
        }
    }

    /// The isolation-related flags, split from the passthrough options.
    #[must_use]
    pub fn isolation_flags(&self) -> IsolationFlags {
        IsolationFlags {
            prefetch: self.prefetch.clone(),
            sandbox: self.sandbox,
            singular: self.singular,
            url_reroute_only: self.url_reroute_only,
        }
    }

    /// Options forwarded verbatim to the remote-entry loader.
    #[must_use]
    pub fn import_entry_opts(&self) -> &ImportEntryOpts {
        &self.import_entry
    }
}

/// The flags `start` interprets itself rather than passing through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IsolationFlags {
    /// Background loading strategy.
    pub prefetch: PrefetchStrategy,
    /// Isolation request.
    pub sandbox: SandboxOption,
    /// Singular mode.
    pub singular: bool,
    /// Routing-mode flag.
    pub url_reroute_only: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_framework_contract() {
        let config = FrameworkConfiguration::default();
        assert_eq!(config.prefetch, PrefetchStrategy::Enabled);
        assert!(config.singular);
        assert!(config.sandbox.is_enabled());
        assert!(!config.url_reroute_only);
        assert_eq!(config.isolation, IsolationStrategy::None);
    }

    #[test]
    fn options_override_defaults() {
        let options = StartOptions::new()
            .with_singular(false)
            .with_prefetch(PrefetchStrategy::All)
            .with_import_entry("fetch_timeout_ms", 500);
        let config = FrameworkConfiguration::from_options(options);

        assert!(!config.singular);
        assert_eq!(config.prefetch, PrefetchStrategy::All);
        assert!(config.sandbox.is_enabled());
        assert_eq!(config.import_entry["fetch_timeout_ms"], 500);
    }

    #[test]
    fn isolation_flags_exclude_passthrough() {
        let config = FrameworkConfiguration::from_options(
            StartOptions::new()
                .with_url_reroute_only(true)
                .with_import_entry("credentials", "include"),
        );
        let flags = config.isolation_flags();
        assert!(flags.url_reroute_only);
        assert!(flags.singular);
        assert_eq!(config.import_entry_opts().len(), 1);
    }

    #[test]
    fn prefetch_accepts_all_shapes() {
        #[derive(Deserialize)]
        struct Wrapper {
            prefetch: PrefetchStrategy,
        }

        let parse = |s: &str| toml::from_str::<Wrapper>(s).map(|w| w.prefetch);

        assert_eq!(parse("prefetch = false").unwrap(), PrefetchStrategy::Disabled);
        assert_eq!(parse("prefetch = true").unwrap(), PrefetchStrategy::Enabled);
        assert_eq!(parse("prefetch = \"all\"").unwrap(), PrefetchStrategy::All);
        assert_eq!(
            parse("prefetch = [\"a\", \"b\"]").unwrap(),
            PrefetchStrategy::Named(vec!["a".into(), "b".into()])
        );
        assert!(parse("prefetch = \"eager\"").is_err());
    }

    #[test]
    fn prefetch_from_env_string() {
        let parse = |s: &str| s.parse::<PrefetchStrategy>().unwrap();
        assert_eq!(parse("TRUE"), PrefetchStrategy::Enabled);
        assert_eq!(parse("0"), PrefetchStrategy::Disabled);
        assert_eq!(parse("all"), PrefetchStrategy::All);
        assert_eq!(
            parse(" app-a , app-b "),
            PrefetchStrategy::Named(vec!["app-a".into(), "app-b".into()])
        );
        assert!("".parse::<PrefetchStrategy>().is_err());
    }

    #[test]
    fn sandbox_accepts_bool_or_table() {
        let plain: StartOptions = toml::from_str("sandbox = false").unwrap();
        assert_eq!(plain.sandbox, Some(SandboxOption::Disabled));

        let table: StartOptions =
            toml::from_str("[sandbox]\nstrict_style_isolation = true").unwrap();
        let config = table.sandbox.unwrap();
        assert!(config.is_enabled());
        assert!(config.config().unwrap().strict_style_isolation);

        assert!(toml::from_str::<StartOptions>("[sandbox]\nloose = true").is_err());
    }

    #[test]
    fn sandbox_serializes_default_as_bool() {
        let json = serde_json::to_value(SandboxOption::default()).unwrap();
        assert_eq!(json, serde_json::Value::Bool(true));

        let json = serde_json::to_value(SandboxOption::Enabled(SandboxConfig {
            strict_style_isolation: true,
            experimental_style_isolation: false,
        }))
        .unwrap();
        assert_eq!(json["strict_style_isolation"], true);
    }

    #[test]
    fn snapshot_is_single_instance_only() {
        assert!(IsolationStrategy::Proxy.supports_multiple_instances());
        assert!(IsolationStrategy::None.supports_multiple_instances());
        assert!(!IsolationStrategy::Snapshot.supports_multiple_instances());
    }
}
