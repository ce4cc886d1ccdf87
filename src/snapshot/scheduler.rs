//! Snapshot scheduler
//!
//! Keeps the set of visible streams and periodically refreshes a still image
//! for each of them, one capture at a time.

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{broadcast, watch, Notify};
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};

use super::capture::{capture_snapshot, suspended};
use super::registration::{Snapshot, SnapshotSink, VisibleStreamRegistration};
use crate::config::{PreviewConfig, MIN_SNAPSHOT_INTERVAL};
use crate::error::Error;
use crate::media::{MediaSource, StreamId};
use crate::stats::{CycleReport, SchedulerStats};

/// Stop signal for the running timer task
struct TimerHandle {
    stop: Arc<Notify>,
}

impl TimerHandle {
    fn stop(self) {
        // Stores a permit if the task is mid-cycle; it exits on its next loop
        self.stop.notify_one();
    }
}

struct SchedulerState {
    /// Visible streams in registration order
    registrations: Vec<VisibleStreamRegistration>,
    /// Last snapshot delivered per registered stream
    latest: HashMap<StreamId, Snapshot>,
    /// Present while the scheduler is Active
    timer: Option<TimerHandle>,
    stats: SchedulerStats,
}

impl SchedulerState {
    fn position(&self, stream_id: &StreamId) -> Option<usize> {
        self.registrations
            .iter()
            .position(|r| &r.stream_id == stream_id)
    }
}

/// Resets the in-progress flag when a cycle ends, even if it is dropped
struct CycleGuard<'a> {
    running: &'a watch::Sender<bool>,
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        self.running.send_replace(false);
    }
}

/// Periodic, strictly sequential snapshot capture over the visible streams
///
/// The scheduler is Idle (no timer task) while nothing is registered and
/// Active while at least one stream is registered and previews are not
/// suspended. Registration methods that may start the timer take
/// `self: &Arc<Self>`; the timer task only holds a weak reference.
///
/// # Example
/// ```no_run
/// # use std::sync::Arc;
/// # use preview_rs::media::{MediaSource, StreamId};
/// # use preview_rs::snapshot::{Snapshot, SnapshotScheduler};
/// # use preview_rs::PreviewConfig;
/// # fn example<S: MediaSource>(source: S) {
/// let scheduler = Arc::new(SnapshotScheduler::new(source, PreviewConfig::default()));
///
/// scheduler.register_stream_for_snapshot(
///     &StreamId::new("studio-4"),
///     "https://cdn.example/studio-4/index.m3u8",
///     |snapshot: Snapshot| println!("{} bytes", snapshot.data.len()),
/// );
/// # }
/// ```
pub struct SnapshotScheduler<S: MediaSource> {
    source: S,
    config: PreviewConfig,
    state: Mutex<SchedulerState>,
    /// Suspension flag, raced by every capture step
    suspend_tx: watch::Sender<bool>,
    /// Whether a cycle is in progress
    running_tx: watch::Sender<bool>,
    snapshot_tx: broadcast::Sender<Snapshot>,
}

impl<S: MediaSource> SnapshotScheduler<S> {
    /// Create an idle scheduler
    pub fn new(source: S, config: PreviewConfig) -> Self {
        let (snapshot_tx, _) = broadcast::channel(config.broadcast_capacity.max(1));

        Self {
            source,
            config,
            state: Mutex::new(SchedulerState {
                registrations: Vec::new(),
                latest: HashMap::new(),
                timer: None,
                stats: SchedulerStats::new(),
            }),
            suspend_tx: watch::Sender::new(false),
            running_tx: watch::Sender::new(false),
            snapshot_tx,
        }
    }

    /// Scheduler configuration
    pub fn config(&self) -> &PreviewConfig {
        &self.config
    }

    /// The media source captures are taken from
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Add `stream_id` to the visible set
    ///
    /// Re-registering an already visible stream replaces its URL and sink but
    /// keeps its place in the capture order. The first registration starts
    /// the timer unless previews are suspended.
    pub fn register_stream_for_snapshot<K>(
        self: &Arc<Self>,
        stream_id: &StreamId,
        source_url: impl Into<String>,
        sink: K,
    ) where
        K: SnapshotSink + 'static,
    {
        let registration =
            VisibleStreamRegistration::new(stream_id.clone(), source_url.into(), Arc::new(sink));

        let mut state = self.state.lock();

        match state.position(stream_id) {
            Some(index) => {
                state.registrations[index] = registration;
                tracing::debug!(stream = %stream_id, "Snapshot registration updated");
            }
            None => {
                state.registrations.push(registration);
                tracing::debug!(
                    stream = %stream_id,
                    registered = state.registrations.len(),
                    "Stream registered for snapshots"
                );
            }
        }

        if state.timer.is_none() && !self.is_suspended() {
            self.start_timer(&mut state);
        }
    }

    /// Remove `stream_id` from the visible set
    ///
    /// Stops the timer when the set becomes empty. Returns whether the stream
    /// was registered.
    pub fn unregister_stream_from_snapshot(&self, stream_id: &StreamId) -> bool {
        let mut state = self.state.lock();

        let Some(index) = state.position(stream_id) else {
            return false;
        };
        state.registrations.remove(index);
        state.latest.remove(stream_id);

        tracing::debug!(
            stream = %stream_id,
            registered = state.registrations.len(),
            "Stream unregistered from snapshots"
        );

        if state.registrations.is_empty() {
            if let Some(timer) = state.timer.take() {
                timer.stop();
                tracing::info!("Snapshot scheduler idle");
            }
        }

        true
    }

    /// Stop the timer and cancel any in-flight capture
    ///
    /// Registrations are kept. Returns `true` only if this call suspended.
    pub fn suspend(&self) -> bool {
        let changed = self.suspend_tx.send_if_modified(|suspended| {
            let changed = !*suspended;
            *suspended = true;
            changed
        });

        if let Some(timer) = self.state.lock().timer.take() {
            timer.stop();
        }

        if changed {
            tracing::info!("Snapshot capture suspended");
        }
        changed
    }

    /// Lift a suspension and restart the timer if streams are registered
    ///
    /// Returns `true` only if this call resumed.
    pub fn resume(self: &Arc<Self>) -> bool {
        let changed = self.suspend_tx.send_if_modified(|suspended| {
            let changed = *suspended;
            *suspended = false;
            changed
        });

        if changed {
            let mut state = self.state.lock();
            if !state.registrations.is_empty() && state.timer.is_none() {
                self.start_timer(&mut state);
            }
            tracing::info!(
                registered = state.registrations.len(),
                "Snapshot capture resumed"
            );
        }
        changed
    }

    /// Whether capture is suspended
    pub fn is_suspended(&self) -> bool {
        *self.suspend_tx.borrow()
    }

    /// Whether the timer is running (Active state)
    pub fn is_active(&self) -> bool {
        self.state.lock().timer.is_some()
    }

    /// Whether a capture cycle is in progress
    pub fn is_capturing(&self) -> bool {
        *self.running_tx.borrow()
    }

    /// Wait until no capture cycle is in progress
    pub async fn wait_idle(&self) {
        let mut running = self.running_tx.subscribe();
        // The sender lives in `self`, so this cannot fail
        let _ = running.wait_for(|running| !*running).await;
    }

    /// Number of visible streams
    pub fn registered_count(&self) -> usize {
        self.state.lock().registrations.len()
    }

    /// Visible streams in capture order
    pub fn registered_streams(&self) -> Vec<StreamId> {
        self.state
            .lock()
            .registrations
            .iter()
            .map(|r| r.stream_id.clone())
            .collect()
    }

    /// Whether `stream_id` is in the visible set
    pub fn is_registered(&self, stream_id: &StreamId) -> bool {
        self.state.lock().position(stream_id).is_some()
    }

    /// Last snapshot captured for a still-registered stream
    pub fn latest(&self, stream_id: &StreamId) -> Option<Snapshot> {
        self.state.lock().latest.get(stream_id).cloned()
    }

    /// Receive every snapshot delivered from now on
    pub fn subscribe(&self) -> broadcast::Receiver<Snapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Counters since construction
    pub fn stats(&self) -> SchedulerStats {
        self.state.lock().stats.clone()
    }

    /// Run one capture pass over the visible set now
    ///
    /// Returns a skipped report if a pass is already in progress; two passes
    /// never overlap. The set is copied at the start; streams unregistered
    /// since are skipped, and a suspension ends the pass early.
    pub async fn run_cycle(&self) -> CycleReport {
        let Some(_guard) = self.begin_cycle() else {
            tracing::debug!("Snapshot cycle already in progress, skipping");
            self.state
                .lock()
                .stats
                .record_cycle(&CycleReport::skipped(), Duration::ZERO);
            return CycleReport::skipped();
        };

        let started = Instant::now();
        let batch: Vec<StreamId> = self.registered_streams();
        let mut suspend_rx = self.suspend_tx.subscribe();
        let mut report = CycleReport::default();

        tracing::debug!(streams = batch.len(), "Snapshot cycle started");

        for (index, stream_id) in batch.iter().enumerate() {
            if *suspend_rx.borrow_and_update() {
                tracing::debug!(
                    remaining = batch.len() - index,
                    "Snapshot cycle cut short"
                );
                break;
            }

            if report.attempted > 0 && !self.pause_between_items(&mut suspend_rx).await {
                break;
            }

            // Re-read: the URL or sink may have changed, or the tile left view
            let Some(registration) = self.registration(stream_id) else {
                continue;
            };

            report.attempted += 1;
            let captured =
                capture_snapshot(&self.source, &registration, &self.config, &mut suspend_rx).await;
            match captured {
                Ok(snapshot) => {
                    report.succeeded += 1;
                    self.publish(&registration, snapshot);
                }
                Err(Error::Cancelled) => {
                    report.cancelled += 1;
                    tracing::debug!(stream = %stream_id, "Snapshot capture cancelled");
                    break;
                }
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(
                        stream = %stream_id,
                        url = %registration.source_url,
                        error = %e,
                        "Snapshot capture failed"
                    );
                }
            }
        }

        let duration = started.elapsed();
        self.state.lock().stats.record_cycle(&report, duration);

        tracing::debug!(
            attempted = report.attempted,
            succeeded = report.succeeded,
            failed = report.failed,
            cancelled = report.cancelled,
            duration_ms = duration.as_millis() as u64,
            "Snapshot cycle finished"
        );

        report
    }

    fn begin_cycle(&self) -> Option<CycleGuard<'_>> {
        let started = self.running_tx.send_if_modified(|running| {
            let idle = !*running;
            *running = true;
            idle
        });

        started.then(|| CycleGuard {
            running: &self.running_tx,
        })
    }

    /// Inter-item delay; `false` if suspended meanwhile
    async fn pause_between_items(&self, suspend_rx: &mut watch::Receiver<bool>) -> bool {
        tokio::select! {
            biased;
            _ = suspended(suspend_rx) => false,
            _ = sleep(self.config.inter_item_delay) => true,
        }
    }

    fn registration(&self, stream_id: &StreamId) -> Option<VisibleStreamRegistration> {
        let state = self.state.lock();
        state
            .position(stream_id)
            .map(|index| state.registrations[index].clone())
    }

    /// Cache and deliver a snapshot, unless its stream left view mid-capture
    fn publish(&self, registration: &VisibleStreamRegistration, snapshot: Snapshot) {
        {
            let mut state = self.state.lock();
            if state.position(&registration.stream_id).is_none() {
                tracing::debug!(
                    stream = %registration.stream_id,
                    "Stream unregistered during capture, dropping snapshot"
                );
                return;
            }
            state
                .latest
                .insert(registration.stream_id.clone(), snapshot.clone());
        }

        tracing::debug!(
            stream = %registration.stream_id,
            bytes = snapshot.data.len(),
            "Snapshot captured"
        );

        // No subscribers is fine
        let _ = self.snapshot_tx.send(snapshot.clone());
        registration.deliver(snapshot);
    }

    fn start_timer(self: &Arc<Self>, state: &mut SchedulerState) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("No async runtime, snapshot timer not started");
            return;
        };

        let stop = Arc::new(Notify::new());
        // The field is public; `interval_at` panics on zero
        let period = self.config.snapshot_interval.max(MIN_SNAPSHOT_INTERVAL);
        runtime.spawn(run_timer(Arc::downgrade(self), Arc::clone(&stop), period));
        state.timer = Some(TimerHandle { stop });

        tracing::info!(
            interval_secs = period.as_secs(),
            registered = state.registrations.len(),
            "Snapshot scheduler active"
        );
    }
}

impl<S: MediaSource> Drop for SnapshotScheduler<S> {
    fn drop(&mut self) {
        if let Some(timer) = self.state.get_mut().timer.take() {
            timer.stop();
        }
    }
}

/// Timer loop: one cycle per tick, first tick one period after activation
async fn run_timer<S: MediaSource>(
    scheduler: Weak<SnapshotScheduler<S>>,
    stop: Arc<Notify>,
    period: Duration,
) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = stop.notified() => break,
            _ = ticker.tick() => {}
        }

        let Some(scheduler) = scheduler.upgrade() else {
            break;
        };
        scheduler.run_cycle().await;
    }
}
