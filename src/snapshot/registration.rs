//! Visible-stream registrations and the snapshots delivered to them

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use bytes::Bytes;
use tokio::time::Instant;

use crate::media::StreamId;

/// A still image captured from a live stream
///
/// Cheap to clone: the JPEG payload is reference counted.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Stream the image was captured from
    pub stream_id: StreamId,
    /// JPEG payload
    pub data: Bytes,
    /// Image width
    pub width: u32,
    /// Image height
    pub height: u32,
    /// Capture time
    pub captured_at: Instant,
}

impl Snapshot {
    /// MIME type of `data`
    pub fn content_type(&self) -> &'static str {
        "image/jpeg"
    }
}

/// Receives refreshed snapshots for one registration
///
/// Any `Fn(Snapshot)` closure is a sink.
pub trait SnapshotSink: Send + Sync {
    fn on_snapshot(&self, snapshot: Snapshot);
}

impl<F> SnapshotSink for F
where
    F: Fn(Snapshot) + Send + Sync,
{
    fn on_snapshot(&self, snapshot: Snapshot) {
        self(snapshot)
    }
}

/// A tile that is visible enough to want periodic snapshots
#[derive(Clone)]
pub struct VisibleStreamRegistration {
    pub stream_id: StreamId,
    pub source_url: String,
    pub(crate) sink: Arc<dyn SnapshotSink>,
}

impl VisibleStreamRegistration {
    pub fn new(stream_id: StreamId, source_url: String, sink: Arc<dyn SnapshotSink>) -> Self {
        Self {
            stream_id,
            source_url,
            sink,
        }
    }

    /// Hand `snapshot` to the sink; a panicking sink is logged and ignored
    pub(crate) fn deliver(&self, snapshot: Snapshot) {
        let result = catch_unwind(AssertUnwindSafe(|| self.sink.on_snapshot(snapshot)));
        if result.is_err() {
            tracing::warn!(stream = %self.stream_id, "Snapshot sink panicked");
        }
    }
}

impl std::fmt::Debug for VisibleStreamRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisibleStreamRegistration")
            .field("stream_id", &self.stream_id)
            .field("source_url", &self.source_url)
            .finish_non_exhaustive()
    }
}
