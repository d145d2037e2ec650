//! Application configuration stored under the user's config directory.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Directory name under the platform config root.
pub const CONFIG_DIR: &str = "recipebox";

/// User-tunable settings for the app.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding the persisted recipe collection.
    pub data_root: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_root: config_root(),
        }
    }
}

impl AppConfig {
    /// Load the configuration, falling back to defaults when no config
    /// file exists yet.
    pub fn load() -> Result<Self> {
        Self::load_from(config_path())
    }

    /// Load from an explicit path.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        Ok(config)
    }

    /// Persist the configuration, creating parent directories if needed.
    pub fn persist(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let serialized =
            serde_json::to_string_pretty(self).context("failed to serialize config")?;
        fs::write(path, serialized)
            .with_context(|| format!("failed to write config {}", path.display()))
    }
}

/// Write the default config file on first run so users have something to
/// edit. Existing files are left alone.
pub fn ensure_default_config() -> Result<()> {
    let path = config_path();
    if path.exists() {
        return Ok(());
    }
    AppConfig::default().persist(path)
}

/// Platform config directory for the app.
pub fn config_root() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR)
}

fn config_path() -> PathBuf {
    config_root().join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn config_round_trip() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.json");

        let config = AppConfig {
            data_root: PathBuf::from("/tmp/recipes"),
        };
        config.persist(&path)?;

        let loaded = AppConfig::load_from(&path)?;
        assert_eq!(loaded.data_root, PathBuf::from("/tmp/recipes"));
        Ok(())
    }

    #[test]
    fn missing_config_yields_defaults() -> Result<()> {
        let dir = tempdir()?;
        let loaded = AppConfig::load_from(dir.path().join("absent.json"))?;
        assert_eq!(loaded.data_root, config_root());
        Ok(())
    }
}
