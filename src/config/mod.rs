//! Application Configuration
//!
//! Scanner settings stored in TOML format.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::analysis::constants::{
    DEFAULT_REQUIRED_TICKS, DEFAULT_SCAN_INTERVAL_MS, DEFAULT_TIMEOUT_SECS,
};

/// Invalid scanner settings
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} must be at least 1")]
    Zero(&'static str),
}

/// Application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Scan loop settings
    pub scanner: ScannerSettings,
    /// OCR settings
    pub ocr: OcrSettings,
}

/// When a scan session counts as successfully finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionPolicy {
    /// Bank name, card number, expiry and holder name all locked
    #[default]
    AllFields,
    /// Card number, expiry and holder name locked; bank name optional
    Essentials,
}

/// Scan loop settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerSettings {
    /// Seconds before giving up
    pub timeout_secs: u32,
    /// Milliseconds between scan attempts
    pub scan_interval_ms: u64,
    /// Consecutive identical values needed to lock a field
    pub required_ticks: u32,
    /// Enable debug logging
    pub debug: bool,
    /// Which locked fields end the session
    pub completion: CompletionPolicy,
}

impl Default for ScannerSettings {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            scan_interval_ms: DEFAULT_SCAN_INTERVAL_MS,
            required_ticks: DEFAULT_REQUIRED_TICKS,
            debug: false,
            completion: CompletionPolicy::AllFields,
        }
    }
}

impl ScannerSettings {
    /// Reject settings the scan loop cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::Zero("timeout_secs"));
        }
        if self.scan_interval_ms == 0 {
            return Err(ConfigError::Zero("scan_interval_ms"));
        }
        if self.required_ticks == 0 {
            return Err(ConfigError::Zero("required_ticks"));
        }
        Ok(())
    }
}

/// OCR settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrSettings {
    /// Detections scoring below this are dropped before parsing (0.0 keeps all)
    pub recognition_threshold: f32,
}

/// Default configuration file location
pub fn default_config_path() -> Result<PathBuf> {
    Ok(crate::storage::get_config_dir()?.join("config.toml"))
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: AppConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}
