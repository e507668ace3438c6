//! Restart policy for recognizer streams that end without being asked to
//!
//! Host platforms routinely end a live recognition stream after a timeout.
//! Each unexpected end is answered with a fresh recognizer after a short fixed
//! delay, up to a cap on consecutive attempts within a window.

use std::time::Duration;
use tokio::time::Instant;

/// Delay before reopening a recognizer after an unexpected end
pub const DEFAULT_RESTART_DELAY: Duration = Duration::from_millis(100);

/// Maximum consecutive restarts within the window before giving up
pub const DEFAULT_MAX_RESTART_ATTEMPTS: u32 = 5;

/// Window in which consecutive restarts are counted
pub const DEFAULT_RESTART_WINDOW: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestartPolicy {
    pub delay: Duration,
    pub max_attempts: u32,
    pub window: Duration,
}

impl Default for RestartPolicy {
    fn default() -> Self {
        Self {
            delay: DEFAULT_RESTART_DELAY,
            max_attempts: DEFAULT_MAX_RESTART_ATTEMPTS,
            window: DEFAULT_RESTART_WINDOW,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartDecision {
    /// Reopen the recognizer after `delay`
    Retry { attempt: u32, delay: Duration },
    /// Too many consecutive failures, the session must end
    GiveUp { attempts: u32 },
}

/// Counts consecutive restarts against a [`RestartPolicy`]
#[derive(Debug, Clone)]
pub struct RestartTracker {
    policy: RestartPolicy,
    attempts: u32,
    window_started: Option<Instant>,
}

impl RestartTracker {
    pub fn new(policy: RestartPolicy) -> Self {
        Self {
            policy,
            attempts: 0,
            window_started: None,
        }
    }

    /// Record an unexpected end at `now` and decide what to do about it
    pub fn next_attempt(&mut self, now: Instant) -> RestartDecision {
        let within_window = self
            .window_started
            .is_some_and(|started| now.duration_since(started) <= self.policy.window);
        if !within_window {
            self.window_started = Some(now);
            self.attempts = 0;
        }

        self.attempts = self.attempts.saturating_add(1);
        if self.attempts > self.policy.max_attempts {
            return RestartDecision::GiveUp {
                attempts: self.policy.max_attempts,
            };
        }

        RestartDecision::Retry {
            attempt: self.attempts,
            delay: self.policy.delay,
        }
    }

    /// Forget previous attempts, e.g. once the stream produced speech again
    pub fn reset(&mut self) {
        self.attempts = 0;
        self.window_started = None;
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}
