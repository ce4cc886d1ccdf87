//! Media capability consumed by the orchestration core

pub mod frame;
pub mod source;

#[cfg(test)]
pub(crate) mod testing;

pub use frame::{PixelFormat, StreamId, VideoFrame};
pub use source::{FrameSink, MediaConnection, MediaSource};
