//! Configuration for importing gazetteer places.
//!
//! Load order: `.gbpn/config.toml` → environment variables → defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "config.toml";

/// Top-level importer configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GbpnConfig {
    pub preferences: Preferences,
    pub hierarchy: HierarchyConfig,
    pub source: SourceConfig,
}

/// General import preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// Merge the comma-separated alternative names of each record.
    pub alternative_names_enabled: bool,
    /// Build the administrative hierarchy above each imported place.
    pub hierarchy_enabled: bool,
    /// Strip a trailing " CP" from civil parish names.
    pub strip_civil_parish_suffix: bool,
}

/// Which hierarchy tiers to build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HierarchyConfig {
    /// Historic counties, linked before 1889.
    pub historic: bool,
    /// Administrative counties and districts, linked 1889 to 1974.
    pub administrative: bool,
    /// Unitary authorities, linked after 1974.
    pub modern: bool,
    /// Civil parishes beneath the administrative and modern tiers.
    pub civil_parish: bool,
}

/// Where the gazetteer export lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// CSV path, relative to the project root unless absolute.
    pub path: PathBuf,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            alternative_names_enabled: true,
            hierarchy_enabled: true,
            strip_civil_parish_suffix: false,
        }
    }
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self {
            historic: true,
            administrative: true,
            modern: true,
            civil_parish: true,
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("GBPN.csv"),
        }
    }
}

/// Helper to parse an env var and apply it to a config field.
fn env_override<T: std::str::FromStr>(var: &str, target: &mut T) {
    if let Ok(v) = std::env::var(var)
        && let Ok(n) = v.parse()
    {
        *target = n;
    }
}

/// Get the path to the config file for a given project root.
pub fn config_file(project_root: &Path) -> PathBuf {
    crate::storage::gbpn_dir(project_root).join(CONFIG_FILE)
}

impl GbpnConfig {
    /// Load config from `.gbpn/config.toml` in the project root, with env var overrides.
    /// Falls back to defaults if no config file exists.
    pub fn load(project_root: &Path) -> Result<Self> {
        let config_path = config_file(project_root);

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("failed to read {}", config_path.display()))?;
            toml::from_str(&content)
                .with_context(|| format!("invalid config in {}", config_path.display()))?
        } else {
            Self::default()
        };

        env_override(
            "GBPN_ALTERNATIVE_NAMES",
            &mut config.preferences.alternative_names_enabled,
        );
        env_override("GBPN_HIERARCHY", &mut config.preferences.hierarchy_enabled);
        env_override(
            "GBPN_STRIP_CP_SUFFIX",
            &mut config.preferences.strip_civil_parish_suffix,
        );
        env_override("GBPN_SOURCE", &mut config.source.path);

        Ok(config)
    }

    /// Write the config to `.gbpn/config.toml`, creating the directory if needed.
    pub fn save(&self, project_root: &Path) -> Result<()> {
        let dir = crate::storage::gbpn_dir(project_root);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
        let content = toml::to_string_pretty(self).context("failed to serialize config")?;
        let path = config_file(project_root);
        std::fs::write(&path, content)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }

    /// The source CSV path resolved against the project root.
    pub fn source_path(&self, project_root: &Path) -> PathBuf {
        if self.source.path.is_absolute() {
            self.source.path.clone()
        } else {
            project_root.join(&self.source.path)
        }
    }
}
