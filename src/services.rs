//! Composition root
//!
//! Builds the one shared instance of each orchestration service for a
//! process. The application owns the returned value and hands clones of the
//! `Arc`s to its views.

use std::sync::Arc;

use crate::admission::PreviewAdmissionController;
use crate::config::PreviewConfig;
use crate::coordinator::ExclusivePlaybackCoordinator;
use crate::device::DeviceProfile;
use crate::media::MediaSource;
use crate::snapshot::SnapshotScheduler;

/// The admission controller, snapshot scheduler and coordinator, wired together
pub struct PreviewServices<S: MediaSource> {
    /// Tile-facing slot allocator
    pub admission: Arc<PreviewAdmissionController>,
    /// Tile-facing snapshot scheduler
    pub scheduler: Arc<SnapshotScheduler<S>>,
    /// Modal-facing suspend/resume switch
    pub coordinator: Arc<ExclusivePlaybackCoordinator<S>>,
}

impl<S: MediaSource> PreviewServices<S> {
    /// Build the services from explicit configuration
    pub fn new(source: S, config: PreviewConfig) -> Self {
        tracing::info!(
            max_concurrent = config.max_concurrent,
            snapshot_interval_secs = config.snapshot_interval.as_secs(),
            constrained = config.device_is_constrained,
            "Preview services created"
        );

        let admission = Arc::new(PreviewAdmissionController::with_config(&config));
        let scheduler = Arc::new(SnapshotScheduler::new(source, config));
        let coordinator = Arc::new(ExclusivePlaybackCoordinator::new(
            Arc::clone(&admission),
            Arc::clone(&scheduler),
        ));

        Self {
            admission,
            scheduler,
            coordinator,
        }
    }

    /// Build the services for a detected device
    pub fn for_device(source: S, profile: &DeviceProfile) -> Self {
        Self::new(source, profile.config())
    }
}

impl<S: MediaSource> Clone for PreviewServices<S> {
    fn clone(&self) -> Self {
        Self {
            admission: Arc::clone(&self.admission),
            scheduler: Arc::clone(&self.scheduler),
            coordinator: Arc::clone(&self.coordinator),
        }
    }
}
