//! Preview slot and revocation listener types

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use tokio::time::Instant;

use crate::media::StreamId;

/// Notified when the controller takes a slot away from its holder
///
/// The holder is expected to close its media connection and fall back to a
/// static thumbnail. Voluntary releases never trigger this.
///
/// Any `Fn(&StreamId)` closure is a listener.
pub trait SlotListener: Send + Sync {
    /// The slot for `stream_id` has been revoked
    fn on_revoked(&self, stream_id: &StreamId);
}

impl<F> SlotListener for F
where
    F: Fn(&StreamId) + Send + Sync,
{
    fn on_revoked(&self, stream_id: &StreamId) {
        self(stream_id)
    }
}

/// The right for one stream to hold one active decode connection
#[derive(Clone)]
pub struct PreviewSlot {
    /// Stream holding the slot
    pub stream_id: StreamId,
    /// URL the holder decodes
    pub source_url: String,
    /// Grant number, unique per controller
    pub lease: u64,
    /// When the slot was granted
    pub granted_at: Instant,
    listener: Arc<dyn SlotListener>,
}

impl PreviewSlot {
    pub(super) fn new(
        stream_id: StreamId,
        source_url: String,
        lease: u64,
        listener: Arc<dyn SlotListener>,
    ) -> Self {
        Self {
            stream_id,
            source_url,
            lease,
            granted_at: Instant::now(),
            listener,
        }
    }

    /// Notify the holder of revocation
    ///
    /// Consumes the slot so a revocation is delivered at most once. A panic in
    /// the listener is caught and logged.
    pub(super) fn revoke(self) {
        let stream_id = self.stream_id;
        let listener = self.listener;

        let result = catch_unwind(AssertUnwindSafe(|| listener.on_revoked(&stream_id)));
        if result.is_err() {
            tracing::warn!(
                stream = %stream_id,
                lease = self.lease,
                "Slot listener panicked during revocation"
            );
        }
    }
}

impl std::fmt::Debug for PreviewSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewSlot")
            .field("stream_id", &self.stream_id)
            .field("source_url", &self.source_url)
            .field("lease", &self.lease)
            .field("granted_at", &self.granted_at)
            .finish_non_exhaustive()
    }
}

/// Snapshot of the controller's capacity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotStatus {
    /// Slots currently held
    pub active: usize,
    /// Slot limit
    pub max_concurrent: usize,
    /// Whether a new stream would be granted a slot right now
    pub has_capacity: bool,
    /// Whether the controller is suspended
    pub suspended: bool,
}
