//! Engine configuration
//!
//! Everything the engine treats as a convention rather than a rule lives in
//! [`ProbeConfig`]: the storage naming patterns of each delegation kind, the
//! storage identifiers injected by tooling, markers to disregard and the
//! name of the top type. Defaults match the conventions of the Kotlin
//! compiler; a TOML file can override any subset of them.
use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    magic::{
        ENV_CONFIG_PATH, EXCLUDED_STORAGE_NAMES, EXCLUDED_STORAGE_PREFIXES,
        INTERFACE_DELEGATE_PREFIX, LAZY_DELEGATE_SUFFIX, LAZY_WRAPPER_TYPES, MAP_TYPES,
        PROVIDER_DELEGATE_SUFFIX, REFERENCE_DELEGATE_SUFFIX, TOP_TYPE,
    },
    utils::error::{ProbeError, ProbeResult},
};

fn owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Storage naming conventions for each delegation kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DelegateConventions {
    pub interface_prefix: String,
    pub lazy_suffix: String,
    pub reference_suffix: String,
    pub provider_suffix: String,
    /// Raw names of the lazy cache wrapper type.
    pub lazy_wrappers: Vec<String>,
    /// Raw names of key-value mapping types.
    pub map_types: Vec<String>,
}

impl Default for DelegateConventions {
    fn default() -> Self {
        Self {
            interface_prefix: INTERFACE_DELEGATE_PREFIX.to_string(),
            lazy_suffix: LAZY_DELEGATE_SUFFIX.to_string(),
            reference_suffix: REFERENCE_DELEGATE_SUFFIX.to_string(),
            provider_suffix: PROVIDER_DELEGATE_SUFFIX.to_string(),
            lazy_wrappers: owned(LAZY_WRAPPER_TYPES),
            map_types: owned(MAP_TYPES),
        }
    }
}

impl DelegateConventions {
    pub fn is_lazy_wrapper(&self, raw_name: &str) -> bool {
        self.lazy_wrappers.iter().any(|w| w == raw_name)
    }

    pub fn is_map_type(&self, raw_name: &str) -> bool {
        self.map_types.iter().any(|m| m == raw_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub conventions: DelegateConventions,
    pub excluded_storage_names: Vec<String>,
    pub excluded_storage_prefixes: Vec<String>,
    /// Fully-qualified marker names the annotation cache must skip.
    pub ignored_markers: BTreeSet<String>,
    pub top_type: String,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            conventions: DelegateConventions::default(),
            excluded_storage_names: owned(EXCLUDED_STORAGE_NAMES),
            excluded_storage_prefixes: owned(EXCLUDED_STORAGE_PREFIXES),
            ignored_markers: BTreeSet::new(),
            top_type: TOP_TYPE.to_string(),
        }
    }
}

impl ProbeConfig {
    /// Returns `true` if `storage_name` was injected by tooling and is never instance state.
    pub fn is_excluded_storage(&self, storage_name: &str) -> bool {
        self.excluded_storage_names.iter().any(|n| n == storage_name)
            || self
                .excluded_storage_prefixes
                .iter()
                .any(|p| storage_name.starts_with(p.as_str()))
    }

    /// Get the configuration path from the environment, if set.
    pub fn env_path() -> Option<PathBuf> {
        std::env::var_os(ENV_CONFIG_PATH).map(PathBuf::from)
    }

    /// Load the configuration named by [`ENV_CONFIG_PATH`], or the defaults if
    /// the variable is not set.
    pub fn from_env() -> ProbeResult<Self> {
        match Self::env_path() {
            Some(path) => Self::load_from_toml(&path),
            None => Ok(Self::default()),
        }
    }

    /// Parse a configuration from a TOML string. Missing keys keep their defaults.
    pub fn from_toml_str(toml_str: &str) -> ProbeResult<Self> {
        toml::from_str(toml_str).map_err(|e| ProbeError::ConfigParse {
            source: e,
            file: "<inline>".to_string(),
        })
    }

    /// Load a configuration from a TOML file.
    pub fn load_from_toml(path: &Path) -> ProbeResult<Self> {
        let toml_str = std::fs::read_to_string(path)?;
        debug!("Loading propscope configuration from {}", path.display());

        toml::from_str(&toml_str).map_err(|e| ProbeError::ConfigParse {
            source: e,
            file: path.display().to_string(),
        })
    }

    /// Save the configuration to a TOML file, creating parent directories as needed.
    pub fn save_to_toml(&self, path: &Path) -> ProbeResult<()> {
        let toml_str = toml::to_string(self)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, toml_str)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let conf = ProbeConfig::from_toml_str(
            r#"
            top_type = "Object"

            [conventions]
            reference_suffix = "$ref"
            "#,
        )
        .unwrap();

        assert_eq!(conf.top_type, "Object");
        assert_eq!(conf.conventions.reference_suffix, "$ref");
        assert_eq!(conf.conventions.lazy_suffix, LAZY_DELEGATE_SUFFIX);
        assert!(conf.conventions.is_lazy_wrapper("kotlin.Lazy"));
        assert!(conf.is_excluded_storage("__cobertura_counters"));
    }

    #[test]
    fn excluded_prefixes() {
        let conf = ProbeConfig::default();
        assert!(conf.is_excluded_storage("bitmap$init$0"));
        assert!(!conf.is_excluded_storage("bitmap"));
    }

    #[test]
    fn malformed_toml_is_reported() {
        let err = ProbeConfig::from_toml_str("top_type = [").unwrap_err();
        assert!(matches!(err, ProbeError::ConfigParse { .. }));
    }

    #[test]
    fn save_then_load() {
        let dir = std::env::temp_dir().join(format!("propscope-conf-{}", std::process::id()));
        let path = dir.join("nested").join("propscope.toml");
        let mut conf = ProbeConfig::default();
        conf.ignored_markers.insert("com.example.Ignored".to_string());

        conf.save_to_toml(&path).unwrap();
        let loaded = ProbeConfig::load_from_toml(&path).unwrap();
        assert_eq!(loaded, conf);

        std::fs::remove_dir_all(&dir).ok();
    }
}
