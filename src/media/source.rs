//! Media connection capability
//!
//! The orchestration core never decodes anything itself. Whatever transport
//! is active for a stream URL (WebRTC, HLS, FLV, ...) is plugged in through
//! [`MediaSource`], which opens [`MediaConnection`]s that push decoded frames
//! into a [`FrameSink`].

use std::future::Future;

use tokio::sync::mpsc;

use super::frame::VideoFrame;
use crate::error::Result;

/// Opens live decode sessions for stream URLs
///
/// The URL is passed through untouched; the core never inspects its scheme.
///
/// # Example
/// ```no_run
/// use preview_rs::media::{FrameSink, MediaConnection, MediaSource};
/// use preview_rs::error::Result;
///
/// struct NullSource;
/// struct NullConnection;
///
/// impl MediaConnection for NullConnection {
///     fn attach_frame_sink(&mut self, _sink: FrameSink) {}
///     async fn close(&mut self) {}
/// }
///
/// impl MediaSource for NullSource {
///     type Connection = NullConnection;
///
///     async fn open(&self, _url: &str) -> Result<NullConnection> {
///         Ok(NullConnection)
///     }
/// }
/// ```
pub trait MediaSource: Send + Sync + 'static {
    /// Connection type produced by this source
    type Connection: MediaConnection;

    /// Open a decode session for `url`
    fn open(&self, url: &str) -> impl Future<Output = Result<Self::Connection>> + Send;
}

/// One live decode session
pub trait MediaConnection: Send + 'static {
    /// Route decoded frames into `sink`
    ///
    /// Dropping the sink (or the connection) signals end of stream.
    fn attach_frame_sink(&mut self, sink: FrameSink);

    /// Tear the session down
    ///
    /// Called exactly once by whoever owns the connection.
    fn close(&mut self) -> impl Future<Output = ()> + Send;
}

/// Receiving end of decoded frames, the "canvas" a connection draws into
#[derive(Debug, Clone)]
pub struct FrameSink {
    tx: mpsc::Sender<VideoFrame>,
}

impl FrameSink {
    /// Create a sink and the receiver that drains it
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<VideoFrame>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Offer a frame without waiting
    ///
    /// Returns `false` if the frame was dropped because the consumer is full
    /// or gone. Frames are previews; dropping one is always acceptable.
    pub fn push(&self, frame: VideoFrame) -> bool {
        self.tx.try_send(frame).is_ok()
    }

    /// Whether the consumer has gone away
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::media::frame::PixelFormat;

    #[tokio::test]
    async fn test_frame_sink_push() {
        let (sink, mut rx) = FrameSink::channel(1);
        let frame = VideoFrame::new(1, 1, PixelFormat::Rgb8, Bytes::from_static(&[1, 2, 3]));

        assert!(sink.push(frame.clone()));
        // Full: second push is dropped rather than blocking
        assert!(!sink.push(frame));

        let received = rx.recv().await.unwrap();
        assert_eq!(received.width, 1);

        drop(rx);
        assert!(sink.is_closed());
    }
}
