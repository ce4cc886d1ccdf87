//! Periodic still-frame snapshots for visible tiles
//!
//! Registration is cheap and uncapped; only the capture itself opens a decode
//! session, and the scheduler never runs more than one at a time.
//!
//! # Capture cycle
//!
//! ```text
//!   tick (every snapshot_interval)
//!     │
//!     ▼
//!   copy visible set ──► for each stream, in registration order:
//!                          open ──► first frame ──► close ──► JPEG ──► sink
//!                          │          (one deadline)                 │
//!                          └── failure: log, count, next stream      └──► broadcast
//!                          (inter_item_delay between streams)
//! ```
//!
//! Suspension cancels the capture in flight at its next await point and
//! closes its connection.

mod capture;
pub mod encode;
pub mod registration;
pub mod scheduler;

pub use encode::{encode_frame, EncodedImage};
pub use registration::{Snapshot, SnapshotSink, VisibleStreamRegistration};
pub use scheduler::SnapshotScheduler;
