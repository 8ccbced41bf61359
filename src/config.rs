//! Application configuration.
//!
//! Stored as TOML under the user's config directory
//! (`<config_dir>/wavewatch/config.toml`). A missing file means defaults.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{CaptureError, Result};

const APP_DIR: &str = "wavewatch";
const CONFIG_FILE: &str = "config.toml";

/// Settings shared by the CLI and the desktop front-end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Log level filter (`error`, `warn`, `info`, `debug`, `trace`)
    pub log_level: String,
    /// Whether interface listings default to monitor-capable interfaces
    pub monitor_only: bool,
    /// Default interface for beacon capture
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beacon_interface: Option<String>,
    /// Default interface for packet capture
    #[serde(skip_serializing_if = "Option::is_none")]
    pub packet_interface: Option<String>,
    /// How long front-ends wait for a session to end after a stop request
    pub stop_timeout_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            monitor_only: false,
            beacon_interface: None,
            packet_interface: None,
            stop_timeout_ms: 2000,
        }
    }
}

impl AppConfig {
    /// Loads the configuration at `path`, or defaults if it doesn't exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| CaptureError::Config(format!("Failed to read config file: {}", e)))?;
        let config = Self::from_toml(&content)?;

        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Loads from the default location.
    pub fn load_default() -> Result<Self> {
        Self::load(&default_config_path()?)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| CaptureError::Config(format!("Failed to deserialize config: {}", e)))
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| CaptureError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Writes the configuration to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = self.to_toml()?;
        let mut file = fs::File::create(path)?;
        file.write_all(content.as_bytes())?;

        info!("Saved configuration to {}", path.display());
        Ok(())
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }
}

/// Path of the configuration file in the user's config directory.
pub fn default_config_path() -> Result<PathBuf> {
    let dir = dirs::config_dir()
        .ok_or_else(|| CaptureError::Config("Could not determine config directory".to_string()))?;
    Ok(dir.join(APP_DIR).join(CONFIG_FILE))
}
