//! Device classification
//!
//! Thin adapter run once at the application edge: it inspects a user-agent
//! string and produces the [`PreviewConfig`] the core is constructed with.
//! Nothing inside the core looks at the environment.

use std::sync::OnceLock;
use std::time::Duration;

use crate::config::PreviewConfig;

/// User-agent fragments (lowercase) that identify TV and set-top hardware
const CONSTRAINED_MARKERS: &[&str] = &[
    "smart-tv",
    "smarttv",
    "tizen",
    "webos",
    "web0s",
    "netcast",
    "hbbtv",
    "bravia",
    "viera",
    "vidaa",
    "roku",
    "crkey",
    "googletv",
    "android tv",
    "appletv",
    "apple tv",
    "aftb",
    "aftm",
    "afts",
    "aftt",
    "aftmm",
];

static DETECTED: OnceLock<DeviceProfile> = OnceLock::new();

/// Coarse device class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    /// TV/set-top hardware that crashes under concurrent decoders
    Constrained,
    /// Desktop and mobile browsers
    Standard,
}

/// Capabilities derived from the device class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceProfile {
    /// Detected class
    pub class: DeviceClass,
    /// Decode slots the device can sustain
    pub max_concurrent: usize,
    /// Snapshot cycle interval for the device
    pub snapshot_interval: Duration,
}

impl DeviceProfile {
    /// Profile for a device class
    pub fn for_class(class: DeviceClass) -> Self {
        let config = match class {
            DeviceClass::Constrained => PreviewConfig::constrained(),
            DeviceClass::Standard => PreviewConfig::default(),
        };

        Self {
            class,
            max_concurrent: config.max_concurrent,
            snapshot_interval: config.snapshot_interval,
        }
    }

    /// Classify a user-agent string
    pub fn from_user_agent(user_agent: &str) -> Self {
        let ua = user_agent.to_ascii_lowercase();
        let class = if CONSTRAINED_MARKERS.iter().any(|m| ua.contains(m)) {
            DeviceClass::Constrained
        } else {
            DeviceClass::Standard
        };

        Self::for_class(class)
    }

    /// Process-wide profile, classified on first call and cached afterwards
    ///
    /// `user_agent` is only invoked on the first call.
    pub fn detect(user_agent: impl FnOnce() -> String) -> &'static DeviceProfile {
        DETECTED.get_or_init(|| {
            let profile = Self::from_user_agent(&user_agent());
            tracing::info!(
                class = ?profile.class,
                max_concurrent = profile.max_concurrent,
                snapshot_interval_secs = profile.snapshot_interval.as_secs(),
                "Device profile detected"
            );
            profile
        })
    }

    /// Whether this is a constrained device
    pub fn is_constrained(&self) -> bool {
        self.class == DeviceClass::Constrained
    }

    /// Build the configuration for this device
    pub fn config(&self) -> PreviewConfig {
        let base = match self.class {
            DeviceClass::Constrained => PreviewConfig::constrained(),
            DeviceClass::Standard => PreviewConfig::default(),
        };

        base.max_concurrent(self.max_concurrent)
            .snapshot_interval(self.snapshot_interval)
    }
}
