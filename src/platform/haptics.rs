//! Haptic feedback on session start and stop

use tracing::trace;

/// Short pulse when listening starts, in milliseconds
pub const START_PULSE: &[u32] = &[50];

/// Longer vibrate-pause-vibrate pattern when a session ends, in milliseconds
pub const STOP_PATTERN: &[u32] = &[100, 50, 100];

/// Host vibration API
///
/// Fire-and-forget: implementations must not fail the caller.
pub trait Haptics: Send {
    fn vibrate(&self, pattern_ms: &[u32]);
}

/// Optional haptics device gated by the device quirks
pub struct HapticFeedback {
    device: Option<Box<dyn Haptics>>,
    enabled: bool,
}

impl HapticFeedback {
    pub fn new(enabled: bool) -> Self {
        Self {
            device: None,
            enabled,
        }
    }

    pub fn attach(&mut self, device: Box<dyn Haptics>) {
        self.device = Some(device);
    }

    pub fn start_pulse(&self) {
        self.fire(START_PULSE);
    }

    pub fn stop_pattern(&self) {
        self.fire(STOP_PATTERN);
    }

    fn fire(&self, pattern: &[u32]) {
        if !self.enabled {
            return;
        }
        if let Some(device) = &self.device {
            trace!(?pattern, "Vibrating");
            device.vibrate(pattern);
        }
    }
}
