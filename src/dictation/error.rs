//! Error types for the dictation session controller

/// Rejected control-surface calls
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ControlError {
    #[error("Cannot reset the transcript while listening - stop or pause first")]
    ResetWhileListening,
}
