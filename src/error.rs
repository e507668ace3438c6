use crate::config::ConfigError;
use crate::preferences::PreferencesError;
use crate::storage::StorageError;
use thiserror::Error;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Preferences error: {0}")]
    Preferences(#[from] PreferencesError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}
