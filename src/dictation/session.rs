//! Dictation session state

use super::reconcile::merge;
use serde::Serialize;
use std::fmt;

/// Lifecycle state of a dictation session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    #[default]
    Idle,
    Listening,
    Paused,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => write!(f, "idle"),
            SessionState::Listening => write!(f, "listening"),
            SessionState::Paused => write!(f, "paused"),
        }
    }
}

/// Point-in-time view of the session for the UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub is_listening: bool,
    pub is_paused: bool,
    pub is_detecting_speech: bool,
    /// Finalized text plus any interim text still being recognized
    pub transcript: String,
}

/// Accumulated transcript plus the current interim (unfinalized) text
#[derive(Debug, Default, Clone)]
pub struct TranscriptBuffer {
    accumulated: String,
    interim: String,
}

impl TranscriptBuffer {
    /// Finalized text only
    pub fn accumulated(&self) -> &str {
        &self.accumulated
    }

    /// Current interim text, if any
    pub fn interim(&self) -> &str {
        &self.interim
    }

    /// Text shown to the user: finalized text followed by the interim text
    ///
    /// The interim text is laid out the way it will be once finalized, so the
    /// display does not jump when the final result arrives.
    pub fn display(&self) -> String {
        merge(&self.accumulated, &self.interim)
    }

    /// Merge a final chunk into the accumulated text
    ///
    /// Returns true if the accumulated text changed.
    pub fn commit_final(&mut self, chunk: &str) -> bool {
        let merged = merge(&self.accumulated, chunk);
        if merged == self.accumulated {
            return false;
        }
        self.accumulated = merged;
        true
    }

    /// Replace the interim text
    pub fn set_interim(&mut self, text: String) {
        self.interim = text;
    }

    /// Fold the interim text into the accumulated text as displayed
    ///
    /// Used when the stream is stopping and no final result for the interim
    /// text is guaranteed to arrive.
    pub fn freeze(&mut self) {
        self.accumulated = self.display();
        self.interim.clear();
    }

    /// Replace everything with caller-supplied text
    pub fn overwrite(&mut self, text: &str) {
        self.accumulated = text.to_string();
        self.interim.clear();
    }

    pub fn clear(&mut self) {
        self.accumulated.clear();
        self.interim.clear();
    }
}
