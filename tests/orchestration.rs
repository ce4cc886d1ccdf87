//! End-to-end tile lifecycle through the public API

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use preview_rs::media::{FrameSink, MediaConnection, MediaSource, PixelFormat, VideoFrame};
use preview_rs::{Error, PreviewConfig, PreviewServices, Snapshot, StreamId};
use tokio::time::{sleep, Instant};

/// Delivers one 8x8 frame; URLs starting with `down://` refuse to open
#[derive(Clone, Default)]
struct TestSource {
    open: Arc<AtomicUsize>,
    max_open: Arc<AtomicUsize>,
}

struct TestConnection {
    open: Arc<AtomicUsize>,
}

impl MediaConnection for TestConnection {
    fn attach_frame_sink(&mut self, sink: FrameSink) {
        sink.push(VideoFrame::new(
            8,
            8,
            PixelFormat::Rgba8,
            Bytes::from(vec![0xAA; 8 * 8 * 4]),
        ));
    }

    async fn close(&mut self) {
        self.open.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MediaSource for TestSource {
    type Connection = TestConnection;

    async fn open(&self, url: &str) -> preview_rs::Result<TestConnection> {
        if url.starts_with("down://") {
            return Err(Error::ConnectionOpen {
                url: url.to_string(),
                reason: "unreachable".into(),
            });
        }
        sleep(Duration::from_millis(200)).await;
        let now = self.open.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_open.fetch_max(now, Ordering::SeqCst);
        Ok(TestConnection {
            open: Arc::clone(&self.open),
        })
    }
}

type Deliveries = Arc<Mutex<Vec<(StreamId, Instant)>>>;

fn record(log: &Deliveries) -> impl Fn(Snapshot) + Send + Sync + 'static {
    let log = Arc::clone(log);
    move |snapshot: Snapshot| {
        log.lock()
            .unwrap()
            .push((snapshot.stream_id, Instant::now()))
    }
}

#[tokio::test(start_paused = true)]
async fn test_single_slot_steal_scenario() {
    let services = PreviewServices::new(
        TestSource::default(),
        PreviewConfig::default().max_concurrent(1),
    );
    let revoked_a = Arc::new(AtomicUsize::new(0));
    let a = StreamId::new("a");
    let b = StreamId::new("b");

    let r = Arc::clone(&revoked_a);
    assert!(services
        .admission
        .request_slot(&a, "whep://a", move |_: &StreamId| {
            r.fetch_add(1, Ordering::SeqCst);
        }));
    assert!(!services.admission.request_slot(&b, "whep://b", |_: &StreamId| {}));

    assert!(services.admission.force_release_oldest());
    assert_eq!(revoked_a.load(Ordering::SeqCst), 1);

    assert!(services.admission.request_slot(&b, "whep://b", |_: &StreamId| {}));
    assert_eq!(services.admission.status().active, 1);
}

#[tokio::test(start_paused = true)]
async fn test_one_interval_captures_each_stream_once_in_order() {
    let source = TestSource::default();
    let services = PreviewServices::new(source.clone(), PreviewConfig::default());
    let log: Deliveries = Arc::default();

    for name in ["x", "y", "z"] {
        services.scheduler.register_stream_for_snapshot(
            &StreamId::new(name),
            format!("whep://{}", name),
            record(&log),
        );
    }

    sleep(Duration::from_secs(30) + Duration::from_secs(5)).await;

    let log = log.lock().unwrap().clone();
    let order: Vec<&str> = log.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(order, vec!["x", "y", "z"]);
    assert_eq!(source.max_open.load(Ordering::SeqCst), 1);
    assert_eq!(source.open.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_unreachable_stream_does_not_block_others() {
    let services = PreviewServices::new(TestSource::default(), PreviewConfig::default());
    let log: Deliveries = Arc::default();

    services.scheduler.register_stream_for_snapshot(
        &StreamId::new("a"),
        "down://a",
        record(&log),
    );
    services.scheduler.register_stream_for_snapshot(
        &StreamId::new("b"),
        "whep://b",
        record(&log),
    );

    let report = services.scheduler.run_cycle().await;

    assert_eq!(report.failed, 1);
    assert_eq!(report.succeeded, 1);
    let log = log.lock().unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].0.as_str(), "b");
}

#[tokio::test(start_paused = true)]
async fn test_full_screen_session_round_trip() {
    let source = TestSource::default();
    let services = PreviewServices::new(source.clone(), PreviewConfig::default());
    let a = StreamId::new("a");

    assert!(services.admission.request_slot(&a, "whep://a", |_: &StreamId| {}));
    services
        .scheduler
        .register_stream_for_snapshot(&a, "whep://a", |_: Snapshot| {});

    {
        let _session = services.coordinator.begin_exclusive(&a).await;
        assert_eq!(services.admission.status().active, 0);
        assert!(!services.admission.request_slot(&a, "whep://a", |_: &StreamId| {}));
        assert!(!services.scheduler.is_active());
        assert_eq!(source.open.load(Ordering::SeqCst), 0);
    }

    assert!(services.admission.request_slot(&a, "whep://a", |_: &StreamId| {}));
    let status = services.admission.status();
    assert_eq!(status.max_concurrent, 2);
    assert!(status.has_capacity);
    assert!(services.scheduler.is_active());
}
