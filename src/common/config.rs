use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::common::error::{FaceGateError, Result};
use crate::common::paths;

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub registration: RegistrationConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServiceConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ScanConfig {
    /// Pause after camera activation before the first recognition attempt.
    #[serde(default = "default_warmup_delay")]
    pub warmup_delay_ms: u64,
    /// Period between successive recognition attempts while scanning.
    #[serde(default = "default_scan_interval")]
    pub scan_interval_ms: u64,
    /// How long the login command keeps scanning before giving up.
    #[serde(default = "default_session_timeout")]
    pub session_timeout_secs: u64,
}

fn default_warmup_delay() -> u64 {
    1500
}

fn default_scan_interval() -> u64 {
    2000
}

fn default_session_timeout() -> u64 {
    60
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            warmup_delay_ms: default_warmup_delay(),
            scan_interval_ms: default_scan_interval(),
            session_timeout_secs: default_session_timeout(),
        }
    }
}

impl ScanConfig {
    pub fn warmup_delay(&self) -> Duration {
        Duration::from_millis(self.warmup_delay_ms)
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_millis(self.scan_interval_ms)
    }

    pub fn session_timeout(&self) -> Duration {
        Duration::from_secs(self.session_timeout_secs)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CameraConfig {
    /// V4L2 device index. Special value 999 means auto-detect.
    #[serde(default = "default_device_index")]
    pub device_index: u32,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
}

fn default_device_index() -> u32 {
    0
}

fn default_width() -> u32 {
    480
}

fn default_height() -> u32 {
    360
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device_index: default_device_index(),
            width: default_width(),
            height: default_height(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RegistrationConfig {
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: u64,
}

fn default_max_image_bytes() -> u64 {
    10 * 1024 * 1024
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            max_image_bytes: default_max_image_bytes(),
        }
    }
}

impl Config {
    /// Load from the first config file found, falling back to defaults.
    pub fn load() -> Result<Self> {
        for candidate in paths::config_file_candidates() {
            if candidate.exists() {
                return Self::load_from_path(&candidate);
            }
        }
        let config = Config::default();
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents).map_err(|e| {
            FaceGateError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.service.base_url.trim().is_empty() {
            return Err(FaceGateError::Config(
                "service.base_url must not be empty".into(),
            ));
        }
        if self.service.request_timeout_secs == 0 {
            return Err(FaceGateError::Config(
                "service.request_timeout_secs must be at least 1".into(),
            ));
        }
        if self.scan.scan_interval_ms == 0 {
            return Err(FaceGateError::Config(
                "scan.scan_interval_ms must be at least 1".into(),
            ));
        }
        if self.scan.session_timeout_secs == 0 {
            return Err(FaceGateError::Config(
                "scan.session_timeout_secs must be at least 1".into(),
            ));
        }
        if self.camera.width == 0 || self.camera.width > 4096 {
            return Err(FaceGateError::Config(format!(
                "camera.width must be between 1 and 4096, got {}",
                self.camera.width
            )));
        }
        if self.camera.height == 0 || self.camera.height > 4096 {
            return Err(FaceGateError::Config(format!(
                "camera.height must be between 1 and 4096, got {}",
                self.camera.height
            )));
        }
        if self.registration.max_image_bytes == 0 {
            return Err(FaceGateError::Config(
                "registration.max_image_bytes must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
