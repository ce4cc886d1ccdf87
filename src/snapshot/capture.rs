//! One snapshot capture attempt
//!
//! Opens a short-lived connection, waits for the first decodable frame,
//! closes the connection and encodes the frame. Opening and the first frame
//! share one hard deadline and closing has its own budget; a connection that
//! does not close in time is dropped. Opening and waiting also race the
//! suspension signal so a full-screen session never has to wait for a
//! preview capture.

use tokio::sync::watch;
use tokio::time::{timeout, timeout_at, Instant};

use super::encode::encode_frame;
use super::registration::{Snapshot, VisibleStreamRegistration};
use crate::config::PreviewConfig;
use crate::error::{Error, Result};
use crate::media::{FrameSink, MediaConnection, MediaSource, VideoFrame};

/// Resolves once the suspension flag is set; never resolves if the sender is gone
pub(crate) async fn suspended(rx: &mut watch::Receiver<bool>) {
    if rx.wait_for(|suspended| *suspended).await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// Capture one snapshot for `registration`
pub(crate) async fn capture_snapshot<S: MediaSource>(
    source: &S,
    registration: &VisibleStreamRegistration,
    config: &PreviewConfig,
    suspend_rx: &mut watch::Receiver<bool>,
) -> Result<Snapshot> {
    let deadline = Instant::now() + config.capture_timeout;

    let opened = tokio::select! {
        biased;
        _ = suspended(suspend_rx) => return Err(Error::Cancelled),
        opened = timeout_at(deadline, source.open(&registration.source_url)) => opened,
    };

    let mut connection = match opened {
        Ok(Ok(connection)) => connection,
        Ok(Err(e)) => return Err(e),
        Err(_) => return Err(Error::Timeout(config.capture_timeout)),
    };

    let (sink, mut frames) = FrameSink::channel(2);
    connection.attach_frame_sink(sink);

    let first: Result<VideoFrame> = tokio::select! {
        biased;
        _ = suspended(suspend_rx) => Err(Error::Cancelled),
        frame = timeout_at(deadline, frames.recv()) => match frame {
            Ok(Some(frame)) => Ok(frame),
            Ok(None) => Err(Error::ConnectionClosed),
            Err(_) => Err(Error::Timeout(config.capture_timeout)),
        },
    };

    // Decoder time is the scarce resource: release it before encoding
    drop(frames);
    close_connection(connection, registration, config).await;

    let frame = first?;
    let image = encode_frame(&frame, &config.encoding)?;

    Ok(Snapshot {
        stream_id: registration.stream_id.clone(),
        data: image.data,
        width: image.width,
        height: image.height,
        captured_at: Instant::now(),
    })
}

/// Close within `close_timeout`, otherwise abandon the connection
async fn close_connection<C: MediaConnection>(
    mut connection: C,
    registration: &VisibleStreamRegistration,
    config: &PreviewConfig,
) {
    if timeout(config.close_timeout, connection.close()).await.is_err() {
        tracing::warn!(
            stream = %registration.stream_id,
            url = %registration.source_url,
            timeout_ms = config.close_timeout.as_millis() as u64,
            "Connection did not close in time, dropping it"
        );
    }
}
