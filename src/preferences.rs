//! User preferences storage
//!
//! Handles saving and loading user preferences to a JSON file
//! in the application support directory.

use crate::dictation::SessionOptions;
use crate::platform::DeviceClass;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// User preferences
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Preferences {
    /// Language code for dictation (e.g., "en", "no", "da", "fi", "de" or a full tag like "en-GB")
    pub language_code: Option<String>,
    /// Device class override (None = use configuration / detection)
    pub device_class: Option<DeviceClass>,
    /// Haptic feedback opt-out (None = enabled where the device supports it)
    pub haptics_enabled: Option<bool>,
    /// Custom transcript storage location (None = use default)
    pub transcript_location: Option<PathBuf>,
}

impl Preferences {
    /// Recognizer language tag for the preferred language, if one is set
    pub fn language_tag(&self) -> Option<String> {
        self.language_code
            .as_deref()
            .filter(|code| !code.trim().is_empty())
            .map(language_code_to_tag)
    }

    pub fn haptics_enabled(&self) -> bool {
        self.haptics_enabled.unwrap_or(true)
    }

    /// Overlay these preferences on options derived from the engine config
    pub fn apply(&self, options: &mut SessionOptions) {
        if let Some(tag) = self.language_tag() {
            options.language = tag;
        }
        if let Some(device_class) = self.device_class {
            options.device_class = device_class;
        }
    }
}

/// Convert a short language code to the recognizer's BCP 47 tag
pub fn language_code_to_tag(code: &str) -> String {
    match code {
        "en" => "en-US".to_string(),
        "no" | "nb" => "nb-NO".to_string(),
        "da" => "da-DK".to_string(),
        "fi" => "fi-FI".to_string(),
        "de" => "de-DE".to_string(),
        _ => code.to_string(), // Already a full tag, or unknown
    }
}

/// Get the preferences file path
fn preferences_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("DictationEngine").join("preferences.json"))
}

/// Load preferences from the default location
///
/// Returns default preferences if the file doesn't exist or can't be read
pub fn load_preferences() -> Preferences {
    match preferences_path() {
        Some(path) => load_preferences_from(&path),
        None => Preferences::default(),
    }
}

/// Load preferences from a specific file
pub fn load_preferences_from(path: &Path) -> Preferences {
    if !path.exists() {
        return Preferences::default();
    }

    match fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str(&contents) {
            Ok(prefs) => prefs,
            Err(e) => {
                error!("Failed to parse preferences: {}", e);
                Preferences::default()
            }
        },
        Err(e) => {
            error!("Failed to read preferences file: {}", e);
            Preferences::default()
        }
    }
}

/// Save preferences to the default location
pub fn save_preferences(prefs: &Preferences) -> Result<(), PreferencesError> {
    let path = preferences_path().ok_or(PreferencesError::NoConfigDir)?;
    save_preferences_to(&path, prefs)
}

/// Save preferences to a specific file
pub fn save_preferences_to(path: &Path, prefs: &Preferences) -> Result<(), PreferencesError> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent)?;
            info!("Created preferences directory: {:?}", parent);
        }
    }

    let json = serde_json::to_string_pretty(prefs)?;
    fs::write(path, json)?;
    info!("Saved preferences to: {:?}", path);

    Ok(())
}

/// Get the default transcript location path
pub fn default_transcript_location() -> Option<PathBuf> {
    dirs::document_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join("Documents")))
        .map(|d| d.join("DictationEngine").join("transcripts"))
}

/// Preferences errors
#[derive(Debug, thiserror::Error)]
pub enum PreferencesError {
    #[error("Could not find config directory")]
    NoConfigDir,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}
