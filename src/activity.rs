//! Speech activity indicator
//!
//! Tracks whether speech is currently being detected as a flag that decays
//! after a quiet period. Used for UI feedback only.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::trace;

/// Quiet period after which the indicator drops
pub const DEFAULT_ACTIVITY_WINDOW: Duration = Duration::from_millis(1500);

/// Debounced "speech detected" flag
///
/// Must be triggered from within a Tokio runtime; the decay runs as a
/// spawned timer task.
pub struct ActivityDebouncer {
    window: Duration,
    detecting: Arc<AtomicBool>,
    decay: Option<JoinHandle<()>>,
}

impl ActivityDebouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            detecting: Arc::new(AtomicBool::new(false)),
            decay: None,
        }
    }

    /// Mark speech as detected and restart the decay timer
    pub fn trigger(&mut self) {
        self.cancel_decay();
        self.detecting.store(true, Ordering::SeqCst);

        let detecting = self.detecting.clone();
        let window = self.window;
        self.decay = Some(tokio::spawn(async move {
            sleep(window).await;
            detecting.store(false, Ordering::SeqCst);
            trace!("Speech activity decayed");
        }));
    }

    /// Drop the indicator immediately
    pub fn clear(&mut self) {
        self.cancel_decay();
        self.detecting.store(false, Ordering::SeqCst);
    }

    pub fn is_detecting(&self) -> bool {
        self.detecting.load(Ordering::SeqCst)
    }

    fn cancel_decay(&mut self) {
        if let Some(handle) = self.decay.take() {
            handle.abort();
        }
    }
}

impl Default for ActivityDebouncer {
    fn default() -> Self {
        Self::new(DEFAULT_ACTIVITY_WINDOW)
    }
}

impl Drop for ActivityDebouncer {
    fn drop(&mut self) {
        self.cancel_decay();
    }
}
