//! Local storage module for saving transcripts
//!
//! Handles saving finished dictation transcripts to the user's Documents
//! folder, or a custom location if configured in preferences.

use crate::preferences::{self, Preferences};
use chrono::Local;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Get the transcripts directory
///
/// Returns the custom location from preferences if set,
/// otherwise returns the default location in Documents.
pub fn transcripts_dir(prefs: &Preferences) -> Option<PathBuf> {
    if let Some(custom) = &prefs.transcript_location {
        return Some(custom.clone());
    }
    preferences::default_transcript_location()
}

/// Save a transcript into the directory chosen by the preferences
pub fn save_transcript(transcript: &str, prefs: &Preferences) -> Result<PathBuf, StorageError> {
    let dir = transcripts_dir(prefs).ok_or(StorageError::NoDocumentsDir)?;
    save_transcript_in(&dir, transcript)
}

/// Save a transcript as a timestamped markdown file in `dir`
///
/// Returns the path to the saved file
pub fn save_transcript_in(dir: &Path, transcript: &str) -> Result<PathBuf, StorageError> {
    if transcript.trim().is_empty() {
        return Err(StorageError::EmptyTranscript);
    }

    if !dir.exists() {
        fs::create_dir_all(dir).map_err(|e| StorageError::CreateDirectory {
            path: dir.to_path_buf(),
            source: e,
        })?;
        info!("Created transcripts directory: {:?}", dir);
    }

    // Generate filename with timestamp
    let timestamp = Local::now().format("%Y-%m-%d-%H-%M-%S");
    let filename = format!("dictation-{}.md", timestamp);
    let filepath = dir.join(&filename);

    let mut file = fs::File::create(&filepath).map_err(|e| StorageError::CreateFile {
        path: filepath.clone(),
        source: e,
    })?;

    file.write_all(transcript.as_bytes())
        .map_err(|e| StorageError::WriteFile {
            path: filepath.clone(),
            source: e,
        })?;

    file.flush().map_err(|e| StorageError::WriteFile {
        path: filepath.clone(),
        source: e,
    })?;

    info!("Saved transcript to: {:?}", filepath);
    Ok(filepath)
}

/// Storage errors with contextual information
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Could not find Documents directory")]
    NoDocumentsDir,

    #[error("Transcript is empty")]
    EmptyTranscript,

    #[error("Failed to create directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create file {path}: {source}")]
    CreateFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write to file {path}: {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
