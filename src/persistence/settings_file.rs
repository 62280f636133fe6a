//! JSON file storage for application settings
//!
//! Only settings are stored. VM state is never written to disk.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::core::Settings;

/// Settings file wrapper
pub struct SettingsFile {
    path: PathBuf,
}

impl SettingsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Settings file in the per-user config directory
    pub fn default_location() -> Result<Self> {
        let path = dirs::config_dir()
            .context("Failed to get config directory")?
            .join(crate::APP_DIR_NAME)
            .join("settings.json");
        Ok(Self::new(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load settings, or `None` when no file has been saved yet
    pub fn load(&self) -> Result<Option<Settings>> {
        if !self.path.exists() {
            debug!("No settings file at {:?}", self.path);
            return Ok(None);
        }

        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read settings from {:?}", self.path))?;
        let settings = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse settings in {:?}", self.path))?;
        Ok(Some(settings))
    }

    pub fn save(&self, settings: &Settings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(settings)?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to write settings to {:?}", self.path))?;

        info!("Settings saved to {:?}", self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SettingsFile::new(dir.path().join("settings.json"));
        assert!(store.load().expect("load").is_none());
    }

    #[test]
    fn saved_settings_load_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SettingsFile::new(dir.path().join("nested").join("settings.json"));

        let settings = Settings {
            api_base_url: "http://vm-host:8080".to_string(),
            show_metrics: false,
            ..Default::default()
        };
        store.save(&settings).expect("save");

        assert_eq!(store.load().expect("load"), Some(settings));
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").expect("write");

        let err = SettingsFile::new(&path).load().expect_err("should fail");
        assert!(err.to_string().contains("Failed to parse settings"));
    }
}
