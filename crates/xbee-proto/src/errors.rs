//! Errors for the wire-protocol layer (checksum, framing, escaping).
//!
//! These are codec-level errors. Per the driver's error design, none of them
//! are meant to surface to a command caller unchanged: the Reader logs and
//! drops the offending frame, resyncing on the next start delimiter.

use thiserror::Error;

/// Errors that can occur while decoding or encoding an API frame.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Checksum byte did not match the computed checksum for the frame.
    #[error("bad checksum: expected {expected:#04x}, computed {computed:#04x}")]
    BadChecksum {
        /// Checksum byte present on the wire.
        expected: u8,
        /// Checksum computed over type + payload.
        computed: u8,
    },

    /// Declared frame length was zero (type byte alone can't be omitted).
    #[error("bad length: frame declared zero length")]
    BadLength,

    /// A frame declared `needs_frame_id` but none was supplied at encode time.
    #[error("frame type {frame_type:#04x} requires a frame id")]
    MissingFrameId {
        /// Frame type byte that required an id.
        frame_type: u8,
    },
}

/// Convenience alias for fallible wire-protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;
