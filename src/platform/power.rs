//! Screen wake lock management
//!
//! Keeps the device awake while a session is listening. The host may revoke
//! the lock at any time (typically when the page or app is hidden); the lock
//! is re-acquired when the host becomes visible again while still wanted.

use tracing::{debug, info, warn};

/// Errors reported by the host when requesting a wake lock
#[derive(Debug, thiserror::Error)]
pub enum PowerLockError {
    #[error("Wake lock request rejected: {0}")]
    Rejected(String),

    #[error("Wake lock not available while the host is hidden")]
    NotVisible,
}

/// Host wake lock API
pub trait PowerLockHost: Send {
    /// Whether the host can provide wake locks at all
    fn is_supported(&self) -> bool {
        true
    }

    /// Request a screen wake lock
    fn request(&mut self) -> Result<Box<dyn PowerLockHandle>, PowerLockError>;
}

/// A granted wake lock
pub trait PowerLockHandle: Send {
    fn release(self: Box<Self>);
}

/// Owns at most one wake lock and tracks whether one is wanted
pub struct PowerLockManager {
    host: Option<Box<dyn PowerLockHost>>,
    handle: Option<Box<dyn PowerLockHandle>>,
    wanted: bool,
}

impl PowerLockManager {
    pub fn new(host: Box<dyn PowerLockHost>) -> Self {
        Self {
            host: Some(host),
            handle: None,
            wanted: false,
        }
    }

    /// Manager for hosts without a wake lock API; every call is a no-op
    pub fn unsupported() -> Self {
        Self {
            host: None,
            handle: None,
            wanted: false,
        }
    }

    /// Request the lock unless it is already held
    pub fn acquire(&mut self) {
        self.wanted = true;
        if self.handle.is_some() {
            return;
        }

        let Some(host) = self.host.as_mut() else {
            debug!("No wake lock host, skipping acquire");
            return;
        };
        if !host.is_supported() {
            debug!("Wake lock not supported by host");
            return;
        }

        match host.request() {
            Ok(handle) => {
                self.handle = Some(handle);
                info!("Wake lock acquired");
            }
            Err(e) => {
                warn!("Failed to acquire wake lock: {}", e);
            }
        }
    }

    /// Release the lock if held
    pub fn release(&mut self) {
        self.wanted = false;
        if let Some(handle) = self.handle.take() {
            handle.release();
            info!("Wake lock released");
        }
    }

    /// The host invalidated the lock on its own
    pub fn on_revoked(&mut self) {
        if self.handle.take().is_some() {
            info!("Wake lock revoked by host");
        }
    }

    /// Re-acquire a wanted lock once the host is visible again
    pub fn on_visibility_change(&mut self, visible: bool) {
        if visible && self.wanted && self.handle.is_none() {
            info!("Host visible again, re-acquiring wake lock");
            self.acquire();
        }
    }

    pub fn is_held(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for PowerLockManager {
    fn drop(&mut self) {
        self.release();
    }
}
