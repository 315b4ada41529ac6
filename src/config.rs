//! Persisted user settings
//!
//! The config file lives in the platform config directory as JSON. A
//! missing file yields the defaults; command-line flags override whatever
//! is loaded here.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or saving settings
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to determine config directory location
    #[error("Failed to determine config directory location")]
    ConfigDirectoryNotFound,

    /// Failed to read or write the config file
    #[error("Failed to access config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The config file is not valid JSON
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Failed to serialize settings
    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// User settings persisted between sessions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Rename template; `None` falls back to the built-in default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rename_format: Option<String>,

    /// Metadata provider name, e.g. `tvmaze` or `tmdb`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,

    /// Preferred metadata language code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    /// TMDB API access token (only needed for the TMDB provider).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tmdb_access_token: Option<String>,
}

impl Config {
    /// Loads the settings from the platform config directory.
    ///
    /// A missing file is not an error and yields the defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(&path).map_err(|e| ConfigError::Io {
            path: path.clone(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(|e| ConfigError::Parse { path, source: e })
    }

    /// Writes the settings back to the config file.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(&path, content).map_err(|e| ConfigError::Io { path, source: e })
    }

    fn config_path() -> Result<PathBuf, ConfigError> {
        let proj_dirs = directories::ProjectDirs::from("org", "mediarenamer", "media-renamer")
            .ok_or(ConfigError::ConfigDirectoryNotFound)?;
        Ok(proj_dirs.config_dir().join("config.json"))
    }
}
