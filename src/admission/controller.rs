//! Preview admission controller
//!
//! Grants, denies and revokes the right to hold a live decode connection.
//! Capacity is tiny on purpose: over-granting on TV hardware crashes the
//! decoder, while a denial only costs a static thumbnail.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use super::slot::{PreviewSlot, SlotListener, SlotStatus};
use crate::config::PreviewConfig;
use crate::media::StreamId;
use crate::stats::AdmissionStats;

struct AdmissionState {
    /// Active slots in grant order; the front is the oldest
    slots: VecDeque<PreviewSlot>,
    suspended: bool,
    next_lease: u64,
    stats: AdmissionStats,
}

impl AdmissionState {
    fn position(&self, stream_id: &StreamId) -> Option<usize> {
        self.slots.iter().position(|s| &s.stream_id == stream_id)
    }
}

/// Capacity-bounded allocator of preview slots
///
/// All operations are synchronous. Revocation listeners are always invoked
/// after the internal lock is released, so a listener may call back into the
/// controller.
pub struct PreviewAdmissionController {
    state: Mutex<AdmissionState>,
    max_concurrent: usize,
}

impl PreviewAdmissionController {
    /// Create a controller with the given slot limit (clamped to at least 1)
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            state: Mutex::new(AdmissionState {
                slots: VecDeque::new(),
                suspended: false,
                next_lease: 1,
                stats: AdmissionStats::new(),
            }),
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Create a controller from configuration
    pub fn with_config(config: &PreviewConfig) -> Self {
        Self::new(config.max_concurrent)
    }

    /// Slot limit
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Request a slot for `stream_id`
    ///
    /// Returns `true` if the stream already holds a slot (no duplicate is
    /// created) or a free slot was granted. Returns `false` without side
    /// effects when full or suspended.
    pub fn request_slot<L>(
        &self,
        stream_id: &StreamId,
        source_url: impl Into<String>,
        listener: L,
    ) -> bool
    where
        L: SlotListener + 'static,
    {
        self.request_slot_shared(stream_id, source_url.into(), Arc::new(listener))
    }

    /// Request a slot with an already shared listener
    pub fn request_slot_shared(
        &self,
        stream_id: &StreamId,
        source_url: String,
        listener: Arc<dyn SlotListener>,
    ) -> bool {
        let mut state = self.state.lock();

        if state.suspended {
            state.stats.denied += 1;
            tracing::debug!(stream = %stream_id, "Slot denied, previews suspended");
            return false;
        }

        if state.position(stream_id).is_some() {
            return true;
        }

        if state.slots.len() >= self.max_concurrent {
            state.stats.denied += 1;
            tracing::debug!(
                stream = %stream_id,
                active = state.slots.len(),
                max_concurrent = self.max_concurrent,
                "Slot denied, at capacity"
            );
            return false;
        }

        let lease = state.next_lease;
        state.next_lease += 1;
        state.stats.granted += 1;
        state
            .slots
            .push_back(PreviewSlot::new(stream_id.clone(), source_url, lease, listener));

        tracing::info!(
            stream = %stream_id,
            lease = lease,
            active = state.slots.len(),
            max_concurrent = self.max_concurrent,
            "Slot granted"
        );

        true
    }

    /// Voluntarily release the slot for `stream_id`
    ///
    /// The listener is not notified; the caller has already torn down its
    /// connection. No-op if the stream holds no slot.
    pub fn release_slot(&self, stream_id: &StreamId) {
        let mut state = self.state.lock();

        if let Some(index) = state.position(stream_id) {
            let slot = state.slots.remove(index);
            state.stats.released += 1;

            tracing::info!(
                stream = %stream_id,
                lease = slot.map(|s| s.lease).unwrap_or_default(),
                active = state.slots.len(),
                "Slot released"
            );
        }
    }

    /// Revoke the oldest slot (first granted, not least recently used)
    ///
    /// The slot is removed first, then exactly its listener is notified once.
    /// Returns `false` if no slot is held.
    pub fn force_release_oldest(&self) -> bool {
        let slot = {
            let mut state = self.state.lock();
            let Some(slot) = state.slots.pop_front() else {
                return false;
            };
            state.stats.evicted += 1;

            tracing::info!(
                stream = %slot.stream_id,
                lease = slot.lease,
                held_ms = slot.granted_at.elapsed().as_millis() as u64,
                active = state.slots.len(),
                "Oldest slot revoked"
            );
            slot
        };

        slot.revoke();
        true
    }

    /// Request a slot, taking one from the oldest holder if full
    ///
    /// Used when user focus moves to a tile that was denied. Never steals
    /// while suspended.
    pub fn steal_slot<L>(
        &self,
        stream_id: &StreamId,
        source_url: impl Into<String>,
        listener: L,
    ) -> bool
    where
        L: SlotListener + 'static,
    {
        let source_url = source_url.into();
        let listener: Arc<dyn SlotListener> = Arc::new(listener);

        if self.request_slot_shared(stream_id, source_url.clone(), Arc::clone(&listener)) {
            return true;
        }

        if self.is_suspended() || !self.force_release_oldest() {
            return false;
        }

        self.request_slot_shared(stream_id, source_url, listener)
    }

    /// Revoke every slot and deny all requests until [`resume`](Self::resume)
    ///
    /// Returns the revoked streams, oldest first. Calling it again while
    /// suspended revokes nothing.
    pub fn suspend_all(&self) -> Vec<StreamId> {
        let evicted: Vec<PreviewSlot> = {
            let mut state = self.state.lock();
            state.suspended = true;
            let evicted: Vec<PreviewSlot> = state.slots.drain(..).collect();
            state.stats.evicted += evicted.len() as u64;
            evicted
        };

        if !evicted.is_empty() {
            tracing::info!(
                evicted = evicted.len(),
                "All slots revoked, admission suspended"
            );
        }

        evicted
            .into_iter()
            .map(|slot| {
                let stream_id = slot.stream_id.clone();
                slot.revoke();
                stream_id
            })
            .collect()
    }

    /// Leave suspended mode
    ///
    /// Harmless when not suspended.
    pub fn resume(&self) {
        let mut state = self.state.lock();
        if state.suspended {
            state.suspended = false;
            tracing::info!(max_concurrent = self.max_concurrent, "Admission resumed");
        }
    }

    /// Whether requests are currently being denied wholesale
    pub fn is_suspended(&self) -> bool {
        self.state.lock().suspended
    }

    /// Whether `stream_id` holds a slot
    pub fn is_active(&self, stream_id: &StreamId) -> bool {
        self.state.lock().position(stream_id).is_some()
    }

    /// Streams holding slots, oldest first
    pub fn active_streams(&self) -> Vec<StreamId> {
        self.state
            .lock()
            .slots
            .iter()
            .map(|s| s.stream_id.clone())
            .collect()
    }

    /// Capacity snapshot
    pub fn status(&self) -> SlotStatus {
        let state = self.state.lock();
        let active = state.slots.len();

        SlotStatus {
            active,
            max_concurrent: self.max_concurrent,
            has_capacity: !state.suspended && active < self.max_concurrent,
            suspended: state.suspended,
        }
    }

    /// Counters since construction
    pub fn stats(&self) -> AdmissionStats {
        self.state.lock().stats.clone()
    }
}

impl Default for PreviewAdmissionController {
    fn default() -> Self {
        Self::with_config(&PreviewConfig::default())
    }
}
