//! Configuration module for air-canvas
//!
//! Drawing settings are live and shared through [`SettingsStore`]; session
//! settings are fixed when a session starts. Both load from one TOML file
//! with optional `[settings]` and `[session]` tables.

pub mod session;
pub mod settings;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use session::{Backdrop, ChannelOrder, SessionConfig};
pub use settings::{Settings, SettingsError, SettingsStore, StyleProvider, Theme};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid settings: {0}")]
    Settings(#[from] SettingsError),
    #[error("Invalid session configuration: {0}")]
    Invalid(String),
}

/// Contents of a configuration file
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub settings: Settings,
    pub session: SessionConfig,
}

impl AppConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.settings.validate()?;
        config.session.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }
}

/// Default location offered for saving a drawing
pub fn default_save_path() -> PathBuf {
    match std::env::var_os("HOME") {
        Some(home) => Path::new(&home).join("Documents").join("Drawing.png"),
        None => PathBuf::from("Drawing.png"),
    }
}
