//! TOML configuration for navigators and selection controls.
//!
//! ```
//! use swingset::config::SwingSetConfig;
//! use swingset::navigator::EnablementPolicy;
//!
//! let config = SwingSetConfig::from_toml_str(r#"
//! [navigator]
//! policy = "legacy"
//! auto_commit = true
//!
//! [selection]
//! allow_null = true
//! filter_mode = "contains"
//! "#).unwrap();
//!
//! assert_eq!(config.navigator.policy, EnablementPolicy::Legacy);
//! assert!(config.selection.allow_null);
//! assert_eq!(config.selection.separator, " - ");
//! ```
//!
//! Every key is optional; missing keys take their defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};
use swingset_core::logging::targets;

use crate::error::ConfigError;
use crate::model::{DEFAULT_SEPARATOR, FilterMode};
use crate::navigator::EnablementPolicy;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwingSetConfig {
    /// Row navigator settings.
    pub navigator: NavigatorConfig,
    /// Selection control settings.
    pub selection: SelectionConfig,
}

/// Row navigator settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigatorConfig {
    /// Button enablement policy.
    pub policy: EnablementPolicy,
    /// Commit a modified row implicitly before navigating away.
    pub auto_commit: bool,
    /// Ask the user before deleting a row.
    pub confirm_deletions: bool,
    /// Whether rows may be updated.
    pub modification_allowed: bool,
    /// Whether rows may be inserted.
    pub insertion_allowed: bool,
    /// Whether rows may be deleted.
    pub deletion_allowed: bool,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            policy: EnablementPolicy::Strict,
            auto_commit: false,
            confirm_deletions: true,
            modification_allowed: true,
            insertion_allowed: true,
            deletion_allowed: true,
        }
    }
}

/// Selection control settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Text between the primary and secondary option.
    pub separator: String,
    /// Offer a null item.
    pub allow_null: bool,
    /// Take `allow_null` from the bound column's nullability when binding.
    pub null_from_metadata: bool,
    /// Accept typed text that matches no option.
    pub editable: bool,
    /// How typed text filters the list.
    pub filter_mode: FilterMode,
    /// Whether filtering ignores case.
    pub case_insensitive: bool,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            separator: DEFAULT_SEPARATOR.to_string(),
            allow_null: false,
            null_from_metadata: false,
            editable: false,
            filter_mode: FilterMode::StartsWith,
            case_insensitive: true,
        }
    }
}

impl SwingSetConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(target: targets::CONFIG, path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Render the configuration as TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
