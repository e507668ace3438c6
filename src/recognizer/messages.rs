//! Events emitted by a speech recognizer stream

use serde::{Deserialize, Serialize};
use std::fmt;

/// One recognized segment of a result event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSegment {
    pub text: String,
    #[serde(default)]
    pub confidence: f32,
    /// Final segments will not be revised by the recognizer any more
    #[serde(default)]
    pub is_final: bool,
}

impl ResultSegment {
    pub fn final_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            confidence: 1.0,
            is_final: true,
        }
    }

    pub fn interim_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            confidence: 0.0,
            is_final: false,
        }
    }
}

/// Lifecycle and result events of a recognizer stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecognizerEvent {
    /// The stream is live and capturing
    Start,
    /// Ordered result segments, final and interim
    Result { segments: Vec<ResultSegment> },
    /// Sound or speech detected on the input
    SpeechDetected,
    Error { code: RecognizerErrorCode },
    /// The stream ended, whether requested or not
    End,
}

/// Split result segments into final chunks and the concatenated interim text
pub fn partition_segments(segments: &[ResultSegment]) -> (Vec<&str>, String) {
    let mut finals = Vec::new();
    let mut interim = String::new();
    for segment in segments {
        if segment.is_final {
            finals.push(segment.text.as_str());
        } else {
            interim.push_str(&segment.text);
        }
    }
    (finals, interim)
}

/// Coded reason carried by a recognizer error event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RecognizerErrorCode {
    /// No speech in the current window; routine during pauses
    NoSpeech,
    Aborted,
    AudioCapture,
    Network,
    /// Microphone permission denied
    NotAllowed,
    /// The platform refuses to provide recognition
    ServiceNotAllowed,
    LanguageNotSupported,
    Other(String),
}

impl RecognizerErrorCode {
    pub fn parse(code: &str) -> Self {
        match code {
            "no-speech" => RecognizerErrorCode::NoSpeech,
            "aborted" => RecognizerErrorCode::Aborted,
            "audio-capture" => RecognizerErrorCode::AudioCapture,
            "network" => RecognizerErrorCode::Network,
            "not-allowed" => RecognizerErrorCode::NotAllowed,
            "service-not-allowed" => RecognizerErrorCode::ServiceNotAllowed,
            "language-not-supported" => RecognizerErrorCode::LanguageNotSupported,
            other => RecognizerErrorCode::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            RecognizerErrorCode::NoSpeech => "no-speech",
            RecognizerErrorCode::Aborted => "aborted",
            RecognizerErrorCode::AudioCapture => "audio-capture",
            RecognizerErrorCode::Network => "network",
            RecognizerErrorCode::NotAllowed => "not-allowed",
            RecognizerErrorCode::ServiceNotAllowed => "service-not-allowed",
            RecognizerErrorCode::LanguageNotSupported => "language-not-supported",
            RecognizerErrorCode::Other(code) => code,
        }
    }

    /// Errors that are part of normal operation and never surfaced
    pub fn is_ignorable(&self) -> bool {
        matches!(self, RecognizerErrorCode::NoSpeech)
    }

    /// Errors after which restarting cannot help
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RecognizerErrorCode::NotAllowed | RecognizerErrorCode::ServiceNotAllowed
        )
    }

    /// Message shown to the user for terminal errors
    pub fn user_message(&self) -> String {
        match self {
            RecognizerErrorCode::NotAllowed => {
                "Microphone access was denied. Allow microphone access to use dictation."
                    .to_string()
            }
            RecognizerErrorCode::ServiceNotAllowed => {
                "Speech recognition is not available on this device.".to_string()
            }
            other => format!("Speech recognition error: {}", other),
        }
    }
}

impl fmt::Display for RecognizerErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for RecognizerErrorCode {
    fn from(code: String) -> Self {
        RecognizerErrorCode::parse(&code)
    }
}

impl From<RecognizerErrorCode> for String {
    fn from(code: RecognizerErrorCode) -> Self {
        code.as_str().to_string()
    }
}
