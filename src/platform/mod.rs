//! Platform integration: device quirks, wake lock and haptic feedback
//!
//! Everything that depends on the host device is isolated here so the
//! session controller itself stays platform-agnostic.

mod haptics;
pub(crate) mod power;

pub use haptics::{HapticFeedback, Haptics, START_PULSE, STOP_PATTERN};
pub use power::{PowerLockError, PowerLockHandle, PowerLockHost, PowerLockManager};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse classification of the host device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    #[default]
    Desktop,
    Mobile,
    /// Mobile browsers whose continuous mode re-emits already finalized results
    RestrictedMobile,
}

impl DeviceClass {
    /// Classify a host from its user-agent string and touch capability
    pub fn detect(user_agent: &str, max_touch_points: u32) -> Self {
        let ua = user_agent.to_lowercase();

        if ua.contains("samsungbrowser") || ua.contains("samsung") || ua.contains("android") {
            return DeviceClass::RestrictedMobile;
        }
        if ua.contains("iphone") || ua.contains("ipad") || ua.contains("ipod") {
            return DeviceClass::Mobile;
        }
        // iPadOS reports a desktop Safari user agent but has a touch screen
        if ua.contains("macintosh") && max_touch_points > 1 {
            return DeviceClass::Mobile;
        }
        if ua.contains("mobile") {
            return DeviceClass::Mobile;
        }
        DeviceClass::Desktop
    }
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceClass::Desktop => write!(f, "desktop"),
            DeviceClass::Mobile => write!(f, "mobile"),
            DeviceClass::RestrictedMobile => write!(f, "restricted mobile"),
        }
    }
}

/// Per-device recognizer and feedback settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuirkConfig {
    /// Keep one recognizer stream open across utterances
    pub continuous_mode: bool,
    /// Vibrate on session start and stop
    pub haptics_enabled: bool,
}

/// Look up the quirks for a device class
pub fn quirks_for(device: DeviceClass) -> QuirkConfig {
    match device {
        DeviceClass::Desktop => QuirkConfig {
            continuous_mode: true,
            haptics_enabled: false,
        },
        DeviceClass::Mobile => QuirkConfig {
            continuous_mode: true,
            haptics_enabled: true,
        },
        DeviceClass::RestrictedMobile => QuirkConfig {
            continuous_mode: false,
            haptics_enabled: true,
        },
    }
}
