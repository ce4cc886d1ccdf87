//! Live-preview orchestration for walls of stream tiles
//!
//! Decides which of many visible stream tiles may hold a live decode
//! connection, keeps still-frame snapshots of the rest fresh, and switches all
//! of it off while one stream plays full-screen. Built for low-power TV and
//! set-top hardware where too many concurrent decoders crash the device.
//!
//! # Architecture
//!
//! ```text
//!                         PreviewServices (composition root)
//!         ┌──────────────────────────┬──────────────────────────────┐
//!         │                          │                              │
//!         ▼                          ▼                              ▼
//!  PreviewAdmissionController   SnapshotScheduler<S>     ExclusivePlaybackCoordinator<S>
//!  slots: VecDeque (FIFO)       visible set + timer      suspend_all / resume_snapshots
//!  max_concurrent = 1..2        one capture at a time           │
//!         ▲                          │   ▲                      │
//!         │ request/release/steal    │   │ register/unregister  │ suspends both
//!         │                          ▼   │                      │
//!       [Tile]                  MediaSource::open ──► FrameSink ──► JPEG ──► [Tile]
//!                                                                  ▲
//!                                                             [Full-screen modal]
//! ```
//!
//! Transports (WebRTC, HLS, FLV) plug in through [`media::MediaSource`].
//! Device classification happens once at the application edge with
//! [`DeviceProfile`], which produces the [`PreviewConfig`] the services are
//! built from.

pub mod admission;
pub mod config;
pub mod coordinator;
pub mod device;
pub mod error;
pub mod media;
pub mod services;
pub mod snapshot;
pub mod stats;

pub use admission::{PreviewAdmissionController, SlotListener, SlotStatus};
pub use config::{PreviewConfig, SnapshotEncoding};
pub use coordinator::{CoordinatorStatus, ExclusivePlaybackCoordinator, ExclusiveSession};
pub use device::{DeviceClass, DeviceProfile};
pub use error::{Error, Result};
pub use media::StreamId;
pub use services::PreviewServices;
pub use snapshot::{Snapshot, SnapshotScheduler, SnapshotSink};
