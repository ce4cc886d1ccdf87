//! Preview-slot admission control
//!
//! Every visible tile may want a live decode connection, but the device can
//! only sustain one or two. The controller hands out that scarce right.
//!
//! # Slot lifecycle
//!
//! ```text
//!   request_slot ──► granted ──► release_slot          (voluntary, silent)
//!        │              │
//!        │              ├──────► force_release_oldest  (FIFO, listener notified)
//!        │              │
//!        │              └──────► suspend_all           (all, listeners notified)
//!        ▼
//!     denied (full or suspended): tile shows a static thumbnail
//! ```
//!
//! A denied tile that gains focus steals capacity with
//! [`PreviewAdmissionController::steal_slot`], which revokes the slot that has
//! been held the longest.

pub mod controller;
pub mod slot;

pub use controller::PreviewAdmissionController;
pub use slot::{PreviewSlot, SlotListener, SlotStatus};
