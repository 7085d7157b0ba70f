//! Application configuration
//!
//! Defaults match the stock apple setup. A JSON file named by
//! `APPLEDIST_CONFIG` overrides any subset of the fields.

use anyhow::{Context, Result};
use appledist_core::CalibrationConfig;
use appledist_cv::DetectionConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const CONFIG_ENV: &str = "APPLEDIST_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub device_index: i32,
    pub window_title: String,
    pub calibration: CalibrationConfig,
    pub detection: DetectionConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            device_index: 0,
            window_title: "Apple Detector".to_string(),
            calibration: CalibrationConfig::default(),
            detection: DetectionConfig::default(),
        }
    }
}

impl AppConfig {
    /// Defaults, or the file named by `APPLEDIST_CONFIG` when it is set.
    pub fn load() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.detection
            .validate()
            .context("Invalid detection settings")?;
        self.calibration
            .calibrated_estimator()
            .context("Invalid calibration settings")?;
        Ok(())
    }
}
