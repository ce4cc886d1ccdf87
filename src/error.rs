//! Error types
//!
//! Errors only ever describe a failed capture attempt. Capacity denial is a
//! plain `false` from the admission controller and never shows up here.

use std::time::Duration;

/// Error type for media and capture operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The media source could not open a connection
    ConnectionOpen { url: String, reason: String },
    /// The connection dropped its frame sink before delivering a frame
    ConnectionClosed,
    /// No decodable frame arrived before the capture deadline
    Timeout(Duration),
    /// A frame with a zero dimension was delivered
    EmptyFrame { width: u32, height: u32 },
    /// Frame buffer does not match its declared geometry
    InvalidFrame(String),
    /// JPEG encoding failed
    Encode(String),
    /// Capture abandoned because previews were suspended
    Cancelled,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::ConnectionOpen { url, reason } => {
                write!(f, "Failed to open connection to {}: {}", url, reason)
            }
            Error::ConnectionClosed => write!(f, "Connection closed before first frame"),
            Error::Timeout(after) => {
                write!(f, "No frame within {} ms", after.as_millis())
            }
            Error::EmptyFrame { width, height } => {
                write!(f, "Empty frame: {}x{}", width, height)
            }
            Error::InvalidFrame(reason) => write!(f, "Invalid frame: {}", reason),
            Error::Encode(reason) => write!(f, "Snapshot encode error: {}", reason),
            Error::Cancelled => write!(f, "Capture cancelled by suspension"),
        }
    }
}

impl std::error::Error for Error {}

/// Result alias for capture operations
pub type Result<T> = std::result::Result<T, Error>;
