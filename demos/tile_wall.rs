//! Simulated wall of stream tiles
//!
//! Run with: cargo run --example tile_wall [USER_AGENT]
//!
//! Examples:
//!   cargo run --example tile_wall                                  # desktop, 2 slots
//!   cargo run --example tile_wall "Mozilla/5.0 (SMART-TV; Tizen)"  # TV, 1 slot
//!
//! Uses a synthetic source that "decodes" a gradient frame after a short
//! connection delay. Walks through the tile lifecycle: snapshot registration,
//! slot requests, focus-driven slot stealing, a full-screen session, and
//! resumption afterwards.
//!
//! Set RUST_LOG=preview_rs=debug to see every capture.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use bytes::Bytes;
use preview_rs::media::{FrameSink, MediaConnection, MediaSource, PixelFormat, VideoFrame};
use preview_rs::{DeviceProfile, PreviewServices, Snapshot, StreamId};
use tracing_subscriber::EnvFilter;

/// Source producing a 320x180 gradient for any URL
#[derive(Default)]
struct GradientSource {
    opened: AtomicUsize,
}

struct GradientConnection;

impl MediaConnection for GradientConnection {
    fn attach_frame_sink(&mut self, sink: FrameSink) {
        let (width, height) = (320u32, 180u32);
        let mut data = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                let r = (x * 255 / width) as u8;
                let g = (y * 255 / height) as u8;
                data.extend_from_slice(&[r, g, 128]);
            }
        }
        sink.push(VideoFrame::new(width, height, PixelFormat::Rgb8, Bytes::from(data)));
    }

    async fn close(&mut self) {}
}

impl MediaSource for GradientSource {
    type Connection = GradientConnection;

    async fn open(&self, _url: &str) -> preview_rs::Result<GradientConnection> {
        self.opened.fetch_add(1, Ordering::Relaxed);
        tokio::time::sleep(Duration::from_millis(150)).await;
        Ok(GradientConnection)
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("preview_rs=info")),
        )
        .init();

    let user_agent = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "Mozilla/5.0 (X11; Linux x86_64) Chrome/120.0".to_string());
    let profile = DeviceProfile::detect(|| user_agent);

    let config = profile
        .config()
        .snapshot_interval(Duration::from_secs(2))
        .inter_item_delay(Duration::from_millis(100));
    let services = PreviewServices::new(GradientSource::default(), config);

    let tiles: Vec<StreamId> = ["featured-1", "ota-7", "live-3", "uhd-1", "studio-4", "studio-9"]
        .into_iter()
        .map(StreamId::new)
        .collect();

    // Every visible tile wants snapshots
    for tile in &tiles {
        let url = format!("https://cdn.example/{}/index.m3u8", tile);
        services
            .scheduler
            .register_stream_for_snapshot(tile, url, |snapshot: Snapshot| {
                println!(
                    "[{}] snapshot {}x{} ({} bytes)",
                    snapshot.stream_id,
                    snapshot.width,
                    snapshot.height,
                    snapshot.data.len()
                );
            });
    }

    // The first tiles ask for live previews; the rest fall back to snapshots
    for tile in &tiles {
        let granted =
            services
                .admission
                .request_slot(tile, format!("whep://{}", tile), |id: &StreamId| {
                    println!("[{}] slot revoked, showing thumbnail", id);
                });
        let outcome = if granted { "granted" } else { "denied" };
        println!("[{}] live preview {}", tile, outcome);
    }

    tokio::time::sleep(Duration::from_secs(3)).await;

    // Focus moves to the last tile: it steals the oldest slot
    let focused = &tiles[tiles.len() - 1];
    services
        .admission
        .steal_slot(focused, format!("whep://{}", focused), |id: &StreamId| {
            println!("[{}] slot revoked, showing thumbnail", id);
        });
    println!("Active slots: {:?}", services.admission.active_streams());

    // Full-screen playback of one stream
    {
        let session = services.coordinator.begin_exclusive(&tiles[0]).await;
        println!(
            "Full-screen {} started, slots: {:?}",
            session.stream_id(),
            services.admission.status()
        );
        tokio::time::sleep(Duration::from_secs(3)).await;
    }
    println!("Full-screen closed, slots: {:?}", services.admission.status());

    tokio::time::sleep(Duration::from_secs(3)).await;

    let stats = services.scheduler.stats();
    println!(
        "Cycles: {}, snapshots: {}, failed: {}, cancelled: {}, connections opened: {}",
        stats.cycles_completed,
        stats.captures_succeeded,
        stats.captures_failed,
        stats.captures_cancelled,
        services.scheduler.source().opened.load(Ordering::Relaxed)
    );
    println!("Admission: {:?}", services.admission.stats());
}
