//! Exclusive playback coordination
//!
//! While one stream is watched full-screen, no preview slot or snapshot
//! capture may compete with it for the decoder. The coordinator is the single
//! switch that turns all preview activity off and back on.
//!
//! Suspension is a flag, not a counter: any number of `suspend_all` calls are
//! undone by one `resume_snapshots`, and a resume without a suspend is a no-op.
//! Full-screen playback has several exit paths (closed by the user, failed to
//! connect, superseded) and all of them may call resume.

use std::sync::Arc;

use parking_lot::{Mutex, ReentrantMutex};

use crate::admission::PreviewAdmissionController;
use crate::media::{MediaSource, StreamId};
use crate::snapshot::SnapshotScheduler;

#[derive(Default)]
struct SuspensionState {
    suspended: bool,
    /// Streams whose slots were revoked by the current suspension
    evicted: Vec<StreamId>,
    /// Current exclusive session, if one was opened through `begin_exclusive`
    exclusive: Option<(u64, StreamId)>,
    next_session: u64,
}

/// Observable suspension state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorStatus {
    /// Whether previews are suspended
    pub suspended: bool,
    /// Streams revoked by the current suspension
    pub evicted: Vec<StreamId>,
    /// Stream currently shown full-screen
    pub exclusive: Option<StreamId>,
}

/// Global suspend/resume switch over admission and snapshot capture
pub struct ExclusivePlaybackCoordinator<S: MediaSource> {
    admission: Arc<PreviewAdmissionController>,
    scheduler: Arc<SnapshotScheduler<S>>,
    state: Mutex<SuspensionState>,
    /// Held across a whole suspend or resume, including the calls into both
    /// services. Reentrant because revocation listeners may call back in.
    transition: ReentrantMutex<()>,
}

impl<S: MediaSource> ExclusivePlaybackCoordinator<S> {
    /// Coordinate the given services
    pub fn new(
        admission: Arc<PreviewAdmissionController>,
        scheduler: Arc<SnapshotScheduler<S>>,
    ) -> Self {
        Self {
            admission,
            scheduler,
            state: Mutex::new(SuspensionState::default()),
            transition: ReentrantMutex::new(()),
        }
    }

    /// Turn all preview activity off
    ///
    /// Cancels the in-flight snapshot capture, stops the snapshot timer and
    /// revokes every preview slot. Returns `true` only on the transition.
    /// Use [`suspend_and_drain`](Self::suspend_and_drain) before opening the
    /// exclusive connection.
    pub fn suspend_all(&self) -> bool {
        let _transition = self.transition.lock();
        {
            let mut state = self.state.lock();
            if state.suspended {
                return false;
            }
            state.suspended = true;
        }

        // Listeners run inside admission.suspend_all; our lock is not held
        self.scheduler.suspend();
        let evicted = self.admission.suspend_all();

        tracing::info!(
            evicted = evicted.len(),
            registered = self.scheduler.registered_count(),
            "Preview activity suspended"
        );

        let mut state = self.state.lock();
        // A listener may already have resumed previews
        if state.suspended {
            state.evicted = evicted;
        }
        true
    }

    /// Suspend, then wait until no snapshot connection remains open
    ///
    /// When this returns, the exclusive connection may be opened.
    pub async fn suspend_and_drain(&self) {
        self.suspend_all();
        self.scheduler.wait_idle().await;
    }

    /// Turn preview activity back on
    ///
    /// Re-enables admission and restarts snapshot capture. Returns `true`
    /// only on the transition.
    pub fn resume_snapshots(&self) -> bool {
        let _transition = self.transition.lock();
        let evicted = {
            let mut state = self.state.lock();
            if !state.suspended {
                return false;
            }
            state.suspended = false;
            state.exclusive = None;
            std::mem::take(&mut state.evicted)
        };

        self.admission.resume();
        self.scheduler.resume();

        tracing::info!(
            previously_active = evicted.len(),
            "Preview activity resumed"
        );
        true
    }

    /// Suspend previews for full-screen playback of `stream_id`
    ///
    /// Returns once previews are off and drained. Dropping the returned
    /// session resumes previews, so every exit path restores them. A newer
    /// session supersedes an older one; dropping the older one then does
    /// nothing.
    pub async fn begin_exclusive(self: &Arc<Self>, stream_id: &StreamId) -> ExclusiveSession<S> {
        self.suspend_and_drain().await;

        let session = {
            let mut state = self.state.lock();
            state.next_session += 1;
            let session = state.next_session;
            state.exclusive = Some((session, stream_id.clone()));
            session
        };

        tracing::info!(stream = %stream_id, session = session, "Exclusive playback started");

        ExclusiveSession {
            coordinator: Arc::clone(self),
            stream_id: stream_id.clone(),
            session,
        }
    }

    /// Whether previews are suspended
    pub fn is_suspended(&self) -> bool {
        self.state.lock().suspended
    }

    /// Current suspension state
    pub fn status(&self) -> CoordinatorStatus {
        let state = self.state.lock();
        CoordinatorStatus {
            suspended: state.suspended,
            evicted: state.evicted.clone(),
            exclusive: state.exclusive.as_ref().map(|(_, id)| id.clone()),
        }
    }

    /// The admission controller being coordinated
    pub fn admission(&self) -> &Arc<PreviewAdmissionController> {
        &self.admission
    }

    /// The snapshot scheduler being coordinated
    pub fn scheduler(&self) -> &Arc<SnapshotScheduler<S>> {
        &self.scheduler
    }

    fn end_exclusive(&self, session: u64, stream_id: &StreamId) {
        let current = {
            let state = self.state.lock();
            matches!(state.exclusive, Some((s, _)) if s == session)
        };

        if current {
            tracing::info!(stream = %stream_id, session = session, "Exclusive playback ended");
            self.resume_snapshots();
        } else {
            tracing::debug!(
                stream = %stream_id,
                session = session,
                "Exclusive session already superseded or resumed"
            );
        }
    }
}

/// Guard for one full-screen playback session
///
/// Previews stay suspended while it is alive and resume when it is dropped.
pub struct ExclusiveSession<S: MediaSource> {
    coordinator: Arc<ExclusivePlaybackCoordinator<S>>,
    stream_id: StreamId,
    session: u64,
}

impl<S: MediaSource> ExclusiveSession<S> {
    /// Stream being played exclusively
    pub fn stream_id(&self) -> &StreamId {
        &self.stream_id
    }

    /// End the session now
    pub fn end(self) {
        drop(self);
    }
}

impl<S: MediaSource> Drop for ExclusiveSession<S> {
    fn drop(&mut self) {
        self.coordinator.end_exclusive(self.session, &self.stream_id);
    }
}

impl<S: MediaSource> std::fmt::Debug for ExclusiveSession<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExclusiveSession")
            .field("stream_id", &self.stream_id)
            .field("session", &self.session)
            .finish()
    }
}
