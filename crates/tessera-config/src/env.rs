//! Environment variable fallbacks.
//!
//! `TESSERA_*` variables only fill fields that no config file set; a value
//! written in any file layer always wins.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::merge::{ConfigLayer, FieldSources};
use crate::types::PrefetchStrategy;

/// Prefix shared by every variable this crate reads.
pub const ENV_PREFIX: &str = "TESSERA_";

/// `TESSERA_PREFETCH`: `true`, `false`, `all`, or comma-separated app names.
pub const ENV_PREFETCH: &str = "TESSERA_PREFETCH";
/// `TESSERA_SINGULAR`: boolean.
pub const ENV_SINGULAR: &str = "TESSERA_SINGULAR";
/// `TESSERA_SANDBOX`: boolean.
pub const ENV_SANDBOX: &str = "TESSERA_SANDBOX";
/// `TESSERA_URL_REROUTE_ONLY`: boolean.
pub const ENV_URL_REROUTE_ONLY: &str = "TESSERA_URL_REROUTE_ONLY";
/// `TESSERA_HOME`: alternate directory holding the user `config.toml`.
pub const ENV_HOME: &str = "TESSERA_HOME";

/// Snapshot every `TESSERA_*` variable from the process environment.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars()
        .filter(|(key, _)| key.starts_with(ENV_PREFIX))
        .collect()
}

/// Apply environment fallbacks to fields still holding their default value.
///
/// Returns the number of fields that were filled from the environment.
/// Unparseable values are logged and ignored.
pub fn apply_env_fallbacks(
    merged: &mut toml::Value,
    sources: &mut FieldSources,
    env_vars: &HashMap<String, String>,
) -> usize {
    let Some(table) = merged.as_table_mut() else {
        return 0;
    };

    let mut applied: usize = 0;
    for (var, field) in [
        (ENV_PREFETCH, "prefetch"),
        (ENV_SINGULAR, "singular"),
        (ENV_SANDBOX, "sandbox"),
        (ENV_URL_REROUTE_ONLY, "url_reroute_only"),
    ] {
        let Some(raw) = env_vars.get(var) else {
            continue;
        };
        if !is_unset(field, sources) {
            debug!(var, field, "config file already sets field; ignoring env var");
            continue;
        }
        let value = if field == "prefetch" {
            parse_prefetch(raw)
        } else {
            parse_bool(raw).map(toml::Value::Boolean)
        };
        match value {
            Some(value) => {
                table.insert(field.to_owned(), value);
                sources.retain(|key, _| key != field && !key.starts_with(&format!("{field}.")));
                sources.insert(field.to_owned(), ConfigLayer::Environment);
                applied = applied.saturating_add(1);
            },
            None => warn!(var, value = %raw, "ignoring unparseable environment variable"),
        }
    }
    applied
}

/// A field is unset when nothing but the embedded defaults wrote it.
fn is_unset(field: &str, sources: &FieldSources) -> bool {
    let nested = format!("{field}.");
    sources
        .iter()
        .filter(|(key, _)| key.as_str() == field || key.starts_with(&nested))
        .all(|(_, layer)| *layer == ConfigLayer::Defaults)
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_prefetch(raw: &str) -> Option<toml::Value> {
    let strategy: PrefetchStrategy = raw.parse().ok()?;
    Some(match strategy {
        PrefetchStrategy::Disabled => toml::Value::Boolean(false),
        PrefetchStrategy::Enabled => toml::Value::Boolean(true),
        PrefetchStrategy::All => toml::Value::String("all".to_owned()),
        PrefetchStrategy::Named(names) => {
            toml::Value::Array(names.into_iter().map(toml::Value::String).collect())
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::record_all_leaves;

    fn defaults() -> (toml::Value, FieldSources) {
        let merged: toml::Value =
            toml::from_str("prefetch = true\nsingular = true\nsandbox = true").unwrap();
        let mut sources = FieldSources::new();
        record_all_leaves(&merged, "", &ConfigLayer::Defaults, &mut sources);
        (merged, sources)
    }

    #[test]
    fn test_env_fills_default_fields() {
        let (mut merged, mut sources) = defaults();
        let env = HashMap::from([
            (ENV_SINGULAR.to_owned(), "false".to_owned()),
            (ENV_PREFETCH.to_owned(), "app-a,app-b".to_owned()),
        ]);

        let applied = apply_env_fallbacks(&mut merged, &mut sources, &env);

        assert_eq!(applied, 2);
        assert_eq!(merged["singular"].as_bool(), Some(false));
        assert_eq!(merged["prefetch"].as_array().unwrap().len(), 2);
        assert_eq!(sources.get("singular"), Some(&ConfigLayer::Environment));
    }

    #[test]
    fn test_env_does_not_override_files() {
        let (mut merged, mut sources) = defaults();
        sources.insert("sandbox".to_owned(), ConfigLayer::User);
        let env = HashMap::from([(ENV_SANDBOX.to_owned(), "false".to_owned())]);

        let applied = apply_env_fallbacks(&mut merged, &mut sources, &env);

        assert_eq!(applied, 0);
        assert_eq!(merged["sandbox"].as_bool(), Some(true));
    }

    #[test]
    fn test_unparseable_env_is_ignored() {
        let (mut merged, mut sources) = defaults();
        let env = HashMap::from([(ENV_SINGULAR.to_owned(), "maybe".to_owned())]);

        assert_eq!(apply_env_fallbacks(&mut merged, &mut sources, &env), 0);
        assert_eq!(merged["singular"].as_bool(), Some(true));
    }

    #[test]
    fn test_parse_bool_variants() {
        assert_eq!(parse_bool(" ON "), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool(""), None);
    }
}
