use serde::{Deserialize, Serialize};
use std::{fs::File, io::BufReader, path::Path};
use strum_macros::{AsRefStr, Display, EnumString};
use thiserror::Error;

use crate::{Error, InternalResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HydrateConfig {
    #[serde(default)]
    pub identity: IdentityConfig,

    /// Top-level template field holding the resource list or map.
    #[serde(default = "default_resources_field")]
    pub resources_field: String,

    #[serde(default)]
    pub duplicate_policy: DuplicatePolicy,

    /// Run pass 2. When off, reference strings stay verbatim in the output
    /// and no dependency analysis happens.
    #[serde(default = "default_true")]
    pub resolve_references: bool,
}

impl Default for HydrateConfig {
    fn default() -> Self {
        Self {
            identity: IdentityConfig::default(),
            resources_field: default_resources_field(),
            duplicate_policy: DuplicatePolicy::default(),
            resolve_references: default_true(),
        }
    }
}

impl HydrateConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> InternalResult<Self> {
        from_file(path)
    }
}

/// Fields that identify an output document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityConfig {
    #[serde(default = "default_api_version_field")]
    pub api_version: String,

    #[serde(default = "default_kind_field")]
    pub kind: String,

    /// Dotted path to the name, e.g. `metadata.name`.
    #[serde(default = "default_name_path")]
    pub name_path: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            api_version: default_api_version_field(),
            kind: default_kind_field(),
            name_path: default_name_path(),
        }
    }
}

/// What happens when two outputs register under the same key.
/// The later document wins either way.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumString, Display, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Record a warning in the hydration result.
    #[default]
    Warn,
    /// Replace silently.
    Overwrite,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Failed to open config file {path}: {message}")]
    Io { path: String, message: String },
    #[error("Failed to parse config: {0}")]
    Parse(String),
}

pub fn from_file<T: for<'de> Deserialize<'de>, P: AsRef<Path>>(path: P) -> InternalResult<T> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        Error::Config(ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    })?;
    let reader = BufReader::new(file);
    let config = serde_json::from_reader(reader)
        .map_err(|e| Error::Config(ConfigError::Parse(e.to_string())))?;
    Ok(config)
}

pub fn from_str<T: for<'de> Deserialize<'de>>(s: &str) -> InternalResult<T> {
    let config =
        serde_json::from_str(s).map_err(|e| Error::Config(ConfigError::Parse(e.to_string())))?;
    Ok(config)
}

fn default_resources_field() -> String {
    "resources".to_string()
}
fn default_api_version_field() -> String {
    "apiVersion".to_string()
}
fn default_kind_field() -> String {
    "kind".to_string()
}
fn default_name_path() -> String {
    "metadata.name".to_string()
}
fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hydrate_config_serde() {
        let config = HydrateConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        tracing::debug!("{}", json);
        let deserialized: HydrateConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: HydrateConfig =
            from_str(r#"{"identity": {"name_path": "name"}, "duplicate_policy": "overwrite"}"#)
                .unwrap();
        assert_eq!(config.identity.api_version, "apiVersion");
        assert_eq!(config.identity.name_path, "name");
        assert_eq!(config.resources_field, "resources");
        assert_eq!(config.duplicate_policy, DuplicatePolicy::Overwrite);
        assert!(config.resolve_references);
    }

    #[test]
    fn test_invalid_config() {
        let result: InternalResult<HydrateConfig> = from_str("{ not json");
        assert!(matches!(result, Err(Error::Config(ConfigError::Parse(_)))));

        let result: InternalResult<HydrateConfig> = from_file("/nonexistent/hydrate.json");
        assert!(matches!(result, Err(Error::Config(ConfigError::Io { .. }))));
    }

    #[test]
    fn test_duplicate_policy_text() {
        assert_eq!(DuplicatePolicy::Warn.to_string(), "warn");
        assert_eq!(
            "overwrite".parse::<DuplicatePolicy>().unwrap(),
            DuplicatePolicy::Overwrite
        );
    }
}
