//! Scripted media source for unit tests
//!
//! The URL picks the behaviour:
//! - `fail://...` open fails
//! - `hang://...` opens but never produces a frame
//! - `empty://...` delivers a 0x0 frame
//! - `closed://...` drops the sink without a frame
//! - `stuck://...` delivers a frame but never finishes closing
//! - anything else delivers one 4x4 RGB frame, after `open_delay` if set

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use parking_lot::Mutex;

use super::frame::{PixelFormat, VideoFrame};
use super::source::{FrameSink, MediaConnection, MediaSource};
use crate::error::{Error, Result};

#[derive(Default)]
pub(crate) struct Counters {
    pub opened: Mutex<Vec<String>>,
    pub closed: AtomicUsize,
    pub live: AtomicUsize,
    pub max_live: AtomicUsize,
}

#[derive(Clone, Default)]
pub(crate) struct FakeSource {
    pub counters: Arc<Counters>,
    pub open_delay: Option<Duration>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_open_delay(delay: Duration) -> Self {
        Self {
            open_delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn opened(&self) -> Vec<String> {
        self.counters.opened.lock().clone()
    }

    pub fn closed(&self) -> usize {
        self.counters.closed.load(Ordering::SeqCst)
    }

    pub fn live(&self) -> usize {
        self.counters.live.load(Ordering::SeqCst)
    }

    pub fn max_live(&self) -> usize {
        self.counters.max_live.load(Ordering::SeqCst)
    }
}

pub(crate) fn rgb_frame(width: u32, height: u32) -> VideoFrame {
    let len = (width * height * 3) as usize;
    VideoFrame::new(width, height, PixelFormat::Rgb8, Bytes::from(vec![0x80; len]))
}

pub(crate) struct FakeConnection {
    url: String,
    counters: Arc<Counters>,
    held_sink: Option<FrameSink>,
    closed: bool,
}

impl MediaConnection for FakeConnection {
    fn attach_frame_sink(&mut self, sink: FrameSink) {
        if self.url.starts_with("hang://") {
            self.held_sink = Some(sink);
        } else if self.url.starts_with("empty://") {
            sink.push(VideoFrame::new(0, 0, PixelFormat::Rgb8, Bytes::new()));
        } else if self.url.starts_with("closed://") {
            drop(sink);
        } else {
            sink.push(rgb_frame(4, 4));
        }
    }

    async fn close(&mut self) {
        if self.url.starts_with("stuck://") {
            std::future::pending::<()>().await;
        }
        if !self.closed {
            self.closed = true;
            self.held_sink = None;
            self.counters.closed.fetch_add(1, Ordering::SeqCst);
            self.counters.live.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl MediaSource for FakeSource {
    type Connection = FakeConnection;

    async fn open(&self, url: &str) -> Result<FakeConnection> {
        self.counters.opened.lock().push(url.to_string());

        if let Some(delay) = self.open_delay {
            tokio::time::sleep(delay).await;
        }

        if url.starts_with("fail://") {
            return Err(Error::ConnectionOpen {
                url: url.to_string(),
                reason: "refused".into(),
            });
        }

        let live = self.counters.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.max_live.fetch_max(live, Ordering::SeqCst);

        Ok(FakeConnection {
            url: url.to_string(),
            counters: Arc::clone(&self.counters),
            held_sink: None,
            closed: false,
        })
    }
}
