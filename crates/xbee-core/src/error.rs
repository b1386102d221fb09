//! Error type for the driver engine.
//!
//! Every fallible operation above the wire codec returns `XBeeError`. Codec
//! errors (`BadChecksum`/`BadLength`) are recovered locally by
//! the Reader and never surface here except inside [`XBeeError::Protocol`]
//! on the rare path where a caller decodes a frame directly; transport I/O
//! failures cross the boundary via `#[from] std::io::Error`.

use std::io;

use thiserror::Error;
use xbee_proto::{at::AtStatus, tx_status::TxStatus, ProtocolError};

/// Errors produced by the driver engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum XBeeError {
    /// The device is not in API or API-escape operating mode.
    #[error("invalid operating mode: command protocol requires API or API-escape mode")]
    InvalidOperatingMode,

    /// An operation was attempted while the transport interface was closed.
    #[error("interface not open")]
    InterfaceNotOpen,

    /// A waiter's deadline elapsed before a matching response arrived.
    #[error("timed out waiting for a response")]
    Timeout,

    /// An AT command returned a non-OK status.
    #[error("AT command {mnemonic} failed: {status:?}")]
    AtCommandError {
        /// The two-character mnemonic that failed, rendered as text.
        mnemonic: String,
        /// The non-OK status returned.
        status: AtStatus,
    },

    /// The requested operation is not supported on this device/protocol.
    #[error("operation not supported")]
    OpNotSupported,

    /// A synchronous send observed a transmit-status frame reporting
    /// anything other than success.
    #[error("transmission failed: {0}")]
    Transmit(TxStatus),

    /// A transport I/O failure.
    #[error("transport I/O error: {0}")]
    IoError(String),

    /// An invalid argument was supplied to a driver call.
    #[error("invalid argument: {0}")]
    InvalidArg(String),

    /// A required argument was null/empty where a value was expected.
    #[error("missing required argument: {0}")]
    NullArg(String),

    /// All 255 usable frame ids are currently held by outstanding waiters.
    #[error("frame id space exhausted")]
    FrameIdExhausted,

    /// The transport was closed (EOF or fatal I/O error) while requests
    /// were outstanding.
    #[error("transport closed")]
    TransportClosed,

    /// A wire-protocol error reached the caller directly (not recovered by
    /// the Reader), e.g. from a caller-driven decode outside the normal
    /// read loop.
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl XBeeError {
    /// True if retrying the same operation might succeed without any other
    /// change in state — timeouts and transport-layer I/O errors, not
    /// protocol violations or invalid arguments.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout | Self::IoError(_) | Self::TransportClosed)
    }
}

impl From<ProtocolError> for XBeeError {
    fn from(err: ProtocolError) -> Self {
        Self::Protocol(err.to_string())
    }
}

impl From<io::Error> for XBeeError {
    fn from(err: io::Error) -> Self {
        Self::IoError(err.to_string())
    }
}

/// Convenience alias for fallible driver operations.
pub type Result<T> = std::result::Result<T, XBeeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_and_io_errors_are_transient() {
        assert!(XBeeError::Timeout.is_transient());
        assert!(XBeeError::IoError("reset".into()).is_transient());
        assert!(XBeeError::TransportClosed.is_transient());
    }

    #[test]
    fn protocol_violations_are_not_transient() {
        assert!(!XBeeError::InvalidOperatingMode.is_transient());
        assert!(!XBeeError::FrameIdExhausted.is_transient());
        assert!(!XBeeError::InvalidArg("bad".into()).is_transient());
    }

    #[test]
    fn protocol_error_converts_with_message_preserved() {
        let proto_err = ProtocolError::BadLength;
        let err: XBeeError = proto_err.clone().into();
        assert_eq!(err, XBeeError::Protocol(proto_err.to_string()));
    }
}
