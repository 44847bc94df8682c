//! Settings management for oivkit
//!
//! Stores user preferences in ~/.config/oivkit/settings.json

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// User settings for oivkit
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Settings {
    /// Parent directory for extracted packages (empty = per-user data dir)
    #[serde(default)]
    pub extraction_base_dir: String,

    /// Keep extracted files after `info` finishes
    #[serde(default)]
    pub keep_extracted: bool,
}

impl Settings {
    /// Get the config directory path (~/.config/oivkit)
    fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("oivkit");

        Ok(config_dir)
    }

    /// Get the settings file path
    pub fn settings_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("settings.json"))
    }

    /// Load settings from disk, or return defaults if not found
    pub fn load() -> Self {
        let loaded = Self::settings_path().and_then(|path| {
            if path.exists() {
                Self::load_from(&path)
            } else {
                Ok(Self::default())
            }
        });

        match loaded {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!("Could not load settings: {:#}. Using defaults.", e);
                Self::default()
            }
        }
    }

    /// Load settings from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Save settings to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::settings_path()?)
    }

    /// Save settings to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
    }

    /// Apply the given changes; returns whether anything was set
    pub fn update(&mut self, extraction_base_dir: Option<String>, keep_extracted: Option<bool>) -> bool {
        let changed = extraction_base_dir.is_some() || keep_extracted.is_some();
        if let Some(dir) = extraction_base_dir {
            self.extraction_base_dir = dir;
        }
        if let Some(keep) = keep_extracted {
            self.keep_extracted = keep;
        }
        changed
    }

    /// Extraction base directory, if one is configured
    pub fn extraction_base_dir(&self) -> Option<PathBuf> {
        if self.extraction_base_dir.is_empty() {
            None
        } else {
            Some(PathBuf::from(&self.extraction_base_dir))
        }
    }
}
