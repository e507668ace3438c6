//! Engine configuration
//!
//! Defaults ship embedded from `config.toml`. Setting `DICTATION_CONFIG`
//! (directly or through a `.env` file) points the engine at another file.

use crate::activity::DEFAULT_ACTIVITY_WINDOW;
use crate::dictation::{
    RestartPolicy, SessionOptions, DEFAULT_MAX_RESTART_ATTEMPTS, DEFAULT_RESTART_DELAY,
    DEFAULT_RESTART_WINDOW,
};
use crate::platform::DeviceClass;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// Environment variable naming an alternative config file
pub const CONFIG_ENV: &str = "DICTATION_CONFIG";

const EMBEDDED_CONFIG: &str = include_str!("../config.toml");

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub recognizer: RecognizerSection,
    #[serde(default)]
    pub session: SessionSection,
    #[serde(default)]
    pub platform: PlatformSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecognizerSection {
    /// BCP 47 language tag passed to the recognizer
    pub language: String,
    pub interim_results: bool,
}

impl Default for RecognizerSection {
    fn default() -> Self {
        Self {
            language: "en-US".to_string(),
            interim_results: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionSection {
    pub restart_delay_ms: u64,
    pub max_restart_attempts: u32,
    pub restart_window_ms: u64,
    pub activity_window_ms: u64,
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            restart_delay_ms: duration_ms(DEFAULT_RESTART_DELAY),
            max_restart_attempts: DEFAULT_MAX_RESTART_ATTEMPTS,
            restart_window_ms: duration_ms(DEFAULT_RESTART_WINDOW),
            activity_window_ms: duration_ms(DEFAULT_ACTIVITY_WINDOW),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlatformSection {
    /// Explicit device class; detected from `user_agent` when unset
    pub device_class: Option<DeviceClass>,
    pub user_agent: String,
    pub max_touch_points: u32,
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl EngineConfig {
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// The defaults compiled into the binary
    pub fn embedded() -> Result<Self, ConfigError> {
        Self::from_toml(EMBEDDED_CONFIG)
    }

    /// Load the file named by `DICTATION_CONFIG`, or the embedded defaults
    pub fn load() -> Result<Self, ConfigError> {
        // A missing .env file is fine
        let _ = dotenvy::dotenv();

        match std::env::var(CONFIG_ENV) {
            Ok(path) if !path.trim().is_empty() => {
                let path = PathBuf::from(path);
                let contents = fs::read_to_string(&path).map_err(|e| ConfigError::Read {
                    path: path.clone(),
                    source: e,
                })?;
                info!("Loaded engine configuration from {:?}", path);
                Self::from_toml(&contents)
            }
            _ => Self::embedded(),
        }
    }

    /// Device class from the explicit setting or the configured user agent
    pub fn device_class(&self) -> DeviceClass {
        self.platform.device_class.unwrap_or_else(|| {
            DeviceClass::detect(&self.platform.user_agent, self.platform.max_touch_points)
        })
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            language: self.recognizer.language.clone(),
            interim_results: self.recognizer.interim_results,
            device_class: self.device_class(),
            restart: RestartPolicy {
                delay: Duration::from_millis(self.session.restart_delay_ms),
                max_attempts: self.session.max_restart_attempts,
                window: Duration::from_millis(self.session.restart_window_ms),
            },
            activity_window: Duration::from_millis(self.session.activity_window_ms),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}
