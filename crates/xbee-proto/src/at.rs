//! AT command request/response payload shapes.
//!
//! These types parse and build the payload bytes carried inside
//! `AT_COMMAND` (`0x08`), `AT_COMMAND_RESPONSE` (`0x88`),
//! `REMOTE_AT_COMMAND_REQUEST` (`0x17`) and `REMOTE_AT_COMMAND_RESPONSE`
//! (`0x97`) frames. The frame-id byte itself is not part of these types —
//! it's already split out onto [`crate::frame::Frame::frame_id`] by the
//! codec.

use bytes::Bytes;

/// A two-character AT command mnemonic, e.g. `NI`, `SH`, `SL`.
pub type AtMnemonic = [u8; 2];

/// Status byte of an AT command response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum AtStatus {
    /// `0x00` — command accepted.
    Ok,
    /// `0x01` — general failure executing the command.
    Error,
    /// `0x02` — command mnemonic not recognized.
    InvalidCommand,
    /// `0x03` — command parameter out of range or malformed.
    InvalidParameter,
    /// `0x04` — command given to a remote that is not a transmit failure,
    /// raised when a remote AT request cannot be delivered.
    TransmitFailure,
    /// Any other status byte not in the table above.
    Other(u8),
}

impl AtStatus {
    /// Classifies a raw status byte.
    #[must_use]
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            0x00 => Self::Ok,
            0x01 => Self::Error,
            0x02 => Self::InvalidCommand,
            0x03 => Self::InvalidParameter,
            0x04 => Self::TransmitFailure,
            other => Self::Other(other),
        }
    }

    /// The wire status byte for this status.
    #[must_use]
    pub fn to_byte(self) -> u8 {
        match self {
            Self::Ok => 0x00,
            Self::Error => 0x01,
            Self::InvalidCommand => 0x02,
            Self::InvalidParameter => 0x03,
            Self::TransmitFailure => 0x04,
            Self::Other(b) => b,
        }
    }

    /// True when the command was accepted.
    #[must_use]
    pub fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

/// Payload of an `AT_COMMAND` / `REMOTE_AT_COMMAND_REQUEST` frame (minus
/// frame id, and minus the remote addressing prefix for the latter, which
/// lives in [`crate::io_sample`] alongside the other address-prefixed
/// frames).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtCommandRequest {
    /// Two-character command mnemonic.
    pub mnemonic: AtMnemonic,
    /// Optional parameter bytes. Empty means "query current value".
    pub parameter: Bytes,
}

impl AtCommandRequest {
    /// Builds a query (parameter-less) request for `mnemonic`.
    #[must_use]
    pub fn query(mnemonic: AtMnemonic) -> Self {
        Self { mnemonic, parameter: Bytes::new() }
    }

    /// Builds a set request carrying `parameter`.
    pub fn set(mnemonic: AtMnemonic, parameter: impl Into<Bytes>) -> Self {
        Self { mnemonic, parameter: parameter.into() }
    }

    /// Serializes to the bytes that follow the frame id on the wire.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(2 + self.parameter.len());
        out.extend_from_slice(&self.mnemonic);
        out.extend_from_slice(&self.parameter);
        out
    }

    /// Parses from the bytes that follow the frame id on the wire.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < 2 {
            return None;
        }
        Some(Self { mnemonic: [bytes[0], bytes[1]], parameter: Bytes::copy_from_slice(&bytes[2..]) })
    }
}

/// Payload of an `AT_COMMAND_RESPONSE` / `REMOTE_AT_COMMAND_RESPONSE` frame
/// (minus frame id and remote source-address prefix).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtCommandResponse {
    /// Echoed command mnemonic.
    pub mnemonic: AtMnemonic,
    /// Execution status.
    pub status: AtStatus,
    /// Returned value. Empty for most `Ok` set responses and all non-`Ok`
    /// responses; populated for query responses.
    pub value: Bytes,
}

impl AtCommandResponse {
    /// Serializes to the bytes that follow the frame id on the wire.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(3 + self.value.len());
        out.extend_from_slice(&self.mnemonic);
        out.push(self.status.to_byte());
        out.extend_from_slice(&self.value);
        out
    }

    /// Parses from the bytes that follow the frame id on the wire.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < 3 {
            return None;
        }
        Some(Self {
            mnemonic: [bytes[0], bytes[1]],
            status: AtStatus::from_byte(bytes[2]),
            value: Bytes::copy_from_slice(&bytes[3..]),
        })
    }
}
