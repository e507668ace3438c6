//! Speech recognizer abstraction
//!
//! A recognizer is the platform-supplied live speech-to-text stream. The
//! engine never reuses one: each listening session and each restart gets a
//! fresh instance from a [`RecognizerFactory`], wired to the controller's
//! event queue through a [`RecognizerEventSink`].

mod messages;
mod scripted;

pub use messages::{partition_segments, RecognizerErrorCode, RecognizerEvent, ResultSegment};
pub use scripted::{Script, ScriptedRecognizerFactory};

use crate::dictation::Envelope;
use tokio::sync::mpsc;

/// Settings a recognizer instance is opened with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognizerConfig {
    /// Keep the stream open across utterances
    pub continuous: bool,
    /// Report interim (unfinalized) results
    pub interim_results: bool,
    /// BCP 47 language tag, e.g. "en-US"
    pub language: String,
}

/// Errors a recognizer can report synchronously from `start`
#[derive(Debug, thiserror::Error)]
pub enum RecognizerError {
    #[error("Speech recognition is not supported on this platform")]
    Unsupported,

    #[error("Recognizer failed to start ({code}): {message}")]
    StartFailed {
        code: RecognizerErrorCode,
        message: String,
    },
}

impl RecognizerError {
    /// Error code equivalent to this failure, as if reported by an error event
    pub fn code(&self) -> RecognizerErrorCode {
        match self {
            RecognizerError::Unsupported => RecognizerErrorCode::ServiceNotAllowed,
            RecognizerError::StartFailed { code, .. } => code.clone(),
        }
    }
}

/// A live recognizer stream
pub trait Recognizer {
    /// Begin recognition; events arrive later through the sink
    fn start(&mut self) -> Result<(), RecognizerError>;

    /// Ask the stream to finish; an `End` event is expected to follow
    fn stop(&mut self);
}

/// Creates a fresh recognizer for every session and restart
pub trait RecognizerFactory {
    fn create(&mut self, config: &RecognizerConfig, sink: RecognizerEventSink)
        -> Box<dyn Recognizer>;
}

/// Delivers one recognizer instance's events to the controller queue
///
/// Every sink is stamped with the generation of the instance it belongs to,
/// so events from a superseded instance are recognized and dropped.
#[derive(Debug, Clone)]
pub struct RecognizerEventSink {
    generation: u64,
    tx: mpsc::UnboundedSender<Envelope>,
}

impl RecognizerEventSink {
    pub(crate) fn new(generation: u64, tx: mpsc::UnboundedSender<Envelope>) -> Self {
        Self { generation, tx }
    }

    /// Post an event; returns false once the controller is gone
    pub fn emit(&self, event: RecognizerEvent) -> bool {
        self.tx
            .send(Envelope::Recognizer {
                generation: self.generation,
                event,
            })
            .is_ok()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}
