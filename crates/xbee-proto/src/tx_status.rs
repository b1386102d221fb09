//! Transmit-status wire types for `TRANSMIT_STATUS` (`0x8B`) and the legacy
//! `TX_STATUS` (`0x89`) frames.
//!
//! The status vocabulary below is the vendor-documented delivery-status
//! byte, not an XBee-driver invention; only [`TxStatus::Success`] is
//! non-error, everything else (named or [`TxStatus::Other`]) is surfaced by
//! the Correlator as a transmit failure.

use std::fmt;

/// Delivery status carried by a transmit-status frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum TxStatus {
    /// `0x00` — delivered successfully.
    Success,
    /// `0x01` — no acknowledgement received.
    NoAck,
    /// `0x02` — CCA (clear channel assessment) failure.
    CcaFailure,
    /// `0x03` — transmission purged before the stack was up.
    Purged,
    /// `0x21` — network-level ACK failure.
    NetworkAckFailure,
    /// `0x22` — not joined to a network.
    NotJoinedNetwork,
    /// `0x23` — destination is the sending module itself.
    SelfAddressed,
    /// `0x24` — address not found.
    AddressNotFound,
    /// `0x25` — route not found.
    RouteNotFound,
    /// `0x26` — broadcast source failed to hear a neighbor relay.
    BroadcastFailed,
    /// `0x2C` — invalid endpoint.
    InvalidEndpoint,
    /// `0x31` — internal software error.
    InternalError,
    /// `0x32` — resource error (buffers, timers, etc. exhausted).
    ResourceError,
    /// `0x74` — payload too large for the transmission.
    PayloadTooLarge,
    /// Any status byte not named above.
    Other(u8),
}

impl TxStatus {
    /// Classifies a raw status byte.
    #[must_use]
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            0x00 => Self::Success,
            0x01 => Self::NoAck,
            0x02 => Self::CcaFailure,
            0x03 => Self::Purged,
            0x21 => Self::NetworkAckFailure,
            0x22 => Self::NotJoinedNetwork,
            0x23 => Self::SelfAddressed,
            0x24 => Self::AddressNotFound,
            0x25 => Self::RouteNotFound,
            0x26 => Self::BroadcastFailed,
            0x2C => Self::InvalidEndpoint,
            0x31 => Self::InternalError,
            0x32 => Self::ResourceError,
            0x74 => Self::PayloadTooLarge,
            other => Self::Other(other),
        }
    }

    /// The wire status byte for this status.
    #[must_use]
    pub fn to_byte(self) -> u8 {
        match self {
            Self::Success => 0x00,
            Self::NoAck => 0x01,
            Self::CcaFailure => 0x02,
            Self::Purged => 0x03,
            Self::NetworkAckFailure => 0x21,
            Self::NotJoinedNetwork => 0x22,
            Self::SelfAddressed => 0x23,
            Self::AddressNotFound => 0x24,
            Self::RouteNotFound => 0x25,
            Self::BroadcastFailed => 0x26,
            Self::InvalidEndpoint => 0x2C,
            Self::InternalError => 0x31,
            Self::ResourceError => 0x32,
            Self::PayloadTooLarge => 0x74,
            Self::Other(b) => b,
        }
    }

    /// True only for [`TxStatus::Success`]; every other variant, named or
    /// not, is a transmit failure.
    #[must_use]
    pub fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Success => "delivered successfully",
            Self::NoAck => "no acknowledgement received",
            Self::CcaFailure => "CCA failure",
            Self::Purged => "purged before stack was up",
            Self::NetworkAckFailure => "network ACK failure",
            Self::NotJoinedNetwork => "not joined to network",
            Self::SelfAddressed => "self-addressed",
            Self::AddressNotFound => "address not found",
            Self::RouteNotFound => "route not found",
            Self::BroadcastFailed => "broadcast source failed to hear a neighbor relay",
            Self::InvalidEndpoint => "invalid endpoint",
            Self::InternalError => "internal software error",
            Self::ResourceError => "resource error",
            Self::PayloadTooLarge => "payload too large",
            Self::Other(b) => return write!(f, "unrecognized status {b:#04x}"),
        };
        f.write_str(text)
    }
}

/// Payload of the legacy `TX_STATUS` (`0x89`) frame: status byte only (the
/// frame id has already been split off by the codec).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegacyTxStatus {
    /// Delivery status.
    pub status: TxStatus,
}

impl LegacyTxStatus {
    /// Parses from the bytes that follow the frame id on the wire.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let &first = bytes.first()?;
        Some(Self { status: TxStatus::from_byte(first) })
    }
}

/// Payload of the `TRANSMIT_STATUS` (`0x8B`) frame: 16-bit network address,
/// retry count, delivery status, discovery status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransmitStatus {
    /// Network (short) address the transmission ultimately reached, if any.
    pub network_address: [u8; 2],
    /// Number of application transmission retries that occurred.
    pub retry_count: u8,
    /// Delivery status.
    pub status: TxStatus,
    /// Network discovery status byte, passed through unparsed.
    pub discovery_status: u8,
}

impl TransmitStatus {
    /// Parses from the bytes that follow the frame id on the wire.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < 5 {
            return None;
        }
        Some(Self {
            network_address: [bytes[0], bytes[1]],
            retry_count: bytes[2],
            status: TxStatus::from_byte(bytes[3]),
            discovery_status: bytes[4],
        })
    }
}
