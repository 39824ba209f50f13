//! Application configuration persistence
//!
//! Stored in ~/.config/tunedl/config.json. A missing file means defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::download::TagDefaults;
use crate::service::client::DEFAULT_PAGE_SIZE;

/// Persistent application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Base directory for downloads when none is given
    pub output_dir: Option<PathBuf>,
    /// Also list podcast episodes alongside songs
    pub include_podcasts: bool,
    /// Songs requested per library page
    pub page_size: u32,
    /// Tag values for fields a track does not provide
    pub tags: TagDefaults,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            include_podcasts: false,
            page_size: DEFAULT_PAGE_SIZE,
            tags: TagDefaults::default(),
        }
    }
}

impl AppConfig {
    /// Load the config from its default location
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Save the config to its default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;

        serde_json::from_str(&contents).with_context(|| format!("Failed to parse config {:?}", path))
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {:?}", parent))?;
        }

        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, contents).with_context(|| format!("Failed to write config to {:?}", path))?;

        debug!("Saved config to {:?}", path);
        Ok(())
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        Ok(config_dir.join("tunedl").join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.page_size, 500);
        assert_eq!(config.tags.genre, "Podcast");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = AppConfig::default();
        config.output_dir = Some(PathBuf::from("/music"));
        config.include_podcasts = true;
        config.tags.genre = "Spoken".to_string();
        config.save_to(&path).unwrap();

        assert_eq!(AppConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"page_size": 50, "tags": {"disc_number": 0}}"#).unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.page_size, 50);
        assert_eq!(config.tags.disc_number, 0);
        assert_eq!(config.tags.genre, "Podcast");
        assert!(!config.include_podcasts);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{not json").unwrap();
        assert!(AppConfig::load_from(&path).is_err());
    }
}
