//! Preview orchestration configuration

use std::time::Duration;

/// Default number of concurrent decode slots on capable devices
pub const DEFAULT_MAX_CONCURRENT: usize = 2;

/// Default interval between snapshot cycles
pub const DEFAULT_SNAPSHOT_INTERVAL: Duration = Duration::from_secs(30);

/// Snapshot interval on constrained devices
pub const CONSTRAINED_SNAPSHOT_INTERVAL: Duration = Duration::from_secs(60);

/// Default hard deadline for one capture attempt (open + first frame)
pub const DEFAULT_CAPTURE_TIMEOUT: Duration = Duration::from_secs(10);

/// Default budget for closing a capture connection before it is dropped
pub const DEFAULT_CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

/// Shortest accepted snapshot interval
pub const MIN_SNAPSHOT_INTERVAL: Duration = Duration::from_millis(1);

/// Default pause between two captures of the same cycle
pub const DEFAULT_INTER_ITEM_DELAY: Duration = Duration::from_millis(500);

/// Output format of snapshot images
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotEncoding {
    /// Maximum snapshot width; larger frames are scaled down
    pub max_width: u32,
    /// Maximum snapshot height; larger frames are scaled down
    pub max_height: u32,
    /// JPEG quality (1-100)
    pub quality: u8,
}

impl Default for SnapshotEncoding {
    fn default() -> Self {
        Self {
            max_width: 640,
            max_height: 360,
            quality: 75,
        }
    }
}

/// Configuration shared by the admission controller and snapshot scheduler
#[derive(Debug, Clone)]
pub struct PreviewConfig {
    /// Maximum number of concurrently held preview slots (at least 1)
    pub max_concurrent: usize,

    /// Interval between capture cycles
    pub snapshot_interval: Duration,

    /// Hard deadline for opening a connection and receiving its first frame
    pub capture_timeout: Duration,

    /// Time allowed for a capture connection to close
    pub close_timeout: Duration,

    /// Delay between two captures within one cycle
    pub inter_item_delay: Duration,

    /// Whether the device is a constrained TV/set-top class device
    pub device_is_constrained: bool,

    /// Capacity of the snapshot broadcast channel
    pub broadcast_capacity: usize,

    /// Snapshot image output
    pub encoding: SnapshotEncoding,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            snapshot_interval: DEFAULT_SNAPSHOT_INTERVAL,
            capture_timeout: DEFAULT_CAPTURE_TIMEOUT,
            close_timeout: DEFAULT_CLOSE_TIMEOUT,
            inter_item_delay: DEFAULT_INTER_ITEM_DELAY,
            device_is_constrained: false,
            broadcast_capacity: 64,
            encoding: SnapshotEncoding::default(),
        }
    }
}

impl PreviewConfig {
    /// Config for a constrained device: one slot, slower and smaller snapshots
    pub fn constrained() -> Self {
        Self {
            max_concurrent: 1,
            snapshot_interval: CONSTRAINED_SNAPSHOT_INTERVAL,
            device_is_constrained: true,
            encoding: SnapshotEncoding {
                max_width: 480,
                max_height: 270,
                quality: 70,
            },
            ..Default::default()
        }
    }

    /// Set the slot limit (clamped to at least 1)
    pub fn max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent = max.max(1);
        self
    }

    /// Set the snapshot cycle interval (at least [`MIN_SNAPSHOT_INTERVAL`])
    pub fn snapshot_interval(mut self, interval: Duration) -> Self {
        self.snapshot_interval = interval.max(MIN_SNAPSHOT_INTERVAL);
        self
    }

    /// Set the per-capture deadline
    pub fn capture_timeout(mut self, timeout: Duration) -> Self {
        self.capture_timeout = timeout;
        self
    }

    /// Set the budget for closing a capture connection
    pub fn close_timeout(mut self, timeout: Duration) -> Self {
        self.close_timeout = timeout;
        self
    }

    /// Set the delay between captures in a cycle
    pub fn inter_item_delay(mut self, delay: Duration) -> Self {
        self.inter_item_delay = delay;
        self
    }

    /// Set the snapshot output format
    pub fn encoding(mut self, encoding: SnapshotEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Set the snapshot broadcast channel capacity
    pub fn broadcast_capacity(mut self, capacity: usize) -> Self {
        self.broadcast_capacity = capacity.max(1);
        self
    }
}
