//! Static mapping from API frame-type byte to its wire shape.
//!
//! The registry answers exactly one question the codec needs at decode time
//! ("does this frame type's payload start with a frame-id byte?") and one
//! the encoder needs ("is a frame id mandatory for this request type?"). It
//! does not parse payload fields beyond that — typed payload parsing lives
//! in [`crate::at`], [`crate::tx_status`] and [`crate::io_sample`].

/// Well-known API frame types.
///
/// `Opaque` represents any frame type not in this table; the frame still
/// decodes successfully, it just carries a raw payload instead of a typed
/// one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum FrameKind {
    /// `0x08` — AT command request.
    AtCommand,
    /// `0x88` — AT command response.
    AtCommandResponse,
    /// `0x17` — Remote AT command request.
    RemoteAtCommandRequest,
    /// `0x97` — Remote AT command response.
    RemoteAtCommandResponse,
    /// `0x8B` — ZigBee-style transmit status.
    TransmitStatus,
    /// `0x89` — legacy (802.15.4) TX status.
    TxStatus,
    /// `0x92` — ZigBee IO data sample Rx indicator.
    IoDataSampleRxIndicator,
    /// `0x83` — legacy RX indicator carrying a 16-bit-address IO sample.
    RxIo16,
    /// `0x82` — legacy RX indicator carrying a 64-bit-address IO sample.
    RxIo64,
    /// `0x8A` — modem status (reset/join/disassociation notifications).
    ModemStatus,
    /// `0x95` — node identification indicator (node discovery broadcasts).
    NodeIdentification,
    /// Any frame type not in this table.
    Opaque(u8),
}

impl FrameKind {
    /// Classifies a frame-type byte.
    #[must_use]
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            0x08 => Self::AtCommand,
            0x88 => Self::AtCommandResponse,
            0x17 => Self::RemoteAtCommandRequest,
            0x97 => Self::RemoteAtCommandResponse,
            0x8B => Self::TransmitStatus,
            0x89 => Self::TxStatus,
            0x92 => Self::IoDataSampleRxIndicator,
            0x83 => Self::RxIo16,
            0x82 => Self::RxIo64,
            0x8A => Self::ModemStatus,
            0x95 => Self::NodeIdentification,
            other => Self::Opaque(other),
        }
    }

    /// The wire type byte for this kind.
    #[must_use]
    pub fn to_byte(self) -> u8 {
        match self {
            Self::AtCommand => 0x08,
            Self::AtCommandResponse => 0x88,
            Self::RemoteAtCommandRequest => 0x17,
            Self::RemoteAtCommandResponse => 0x97,
            Self::TransmitStatus => 0x8B,
            Self::TxStatus => 0x89,
            Self::IoDataSampleRxIndicator => 0x92,
            Self::RxIo16 => 0x83,
            Self::RxIo64 => 0x82,
            Self::ModemStatus => 0x8A,
            Self::NodeIdentification => 0x95,
            Self::Opaque(b) => b,
        }
    }

    /// True if this frame type's payload begins with a one-byte frame id.
    ///
    /// This drives both decode (split the id off the front of the payload)
    /// and encode (a request of this kind must carry an id before it is
    /// written to the wire).
    #[must_use]
    pub fn has_frame_id(self) -> bool {
        matches!(
            self,
            Self::AtCommand
                | Self::AtCommandResponse
                | Self::RemoteAtCommandRequest
                | Self::RemoteAtCommandResponse
                | Self::TransmitStatus
                | Self::TxStatus
        )
    }

    /// True if sending this frame type elicits an asynchronous response that
    /// the Correlator should wait for.
    #[must_use]
    pub fn elicits_response(self) -> bool {
        matches!(self, Self::AtCommand | Self::RemoteAtCommandRequest)
    }
}

/// Structural presence of a frame-id byte for a raw type byte, independent
/// of whether the type is recognized.
#[must_use]
pub fn has_frame_id(frame_type: u8) -> bool {
    FrameKind::from_byte(frame_type).has_frame_id()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_types_round_trip() {
        for (byte, kind) in [
            (0x08, FrameKind::AtCommand),
            (0x88, FrameKind::AtCommandResponse),
            (0x17, FrameKind::RemoteAtCommandRequest),
            (0x97, FrameKind::RemoteAtCommandResponse),
            (0x8B, FrameKind::TransmitStatus),
            (0x89, FrameKind::TxStatus),
            (0x92, FrameKind::IoDataSampleRxIndicator),
            (0x83, FrameKind::RxIo16),
            (0x82, FrameKind::RxIo64),
            (0x8A, FrameKind::ModemStatus),
            (0x95, FrameKind::NodeIdentification),
        ] {
            assert_eq!(FrameKind::from_byte(byte), kind);
            assert_eq!(kind.to_byte(), byte);
        }
    }

    #[test]
    fn unknown_type_is_opaque() {
        assert_eq!(FrameKind::from_byte(0x42), FrameKind::Opaque(0x42));
        assert!(!FrameKind::Opaque(0x42).has_frame_id());
    }

    #[test]
    fn needs_frame_id_matches_request_response_pairs() {
        assert!(FrameKind::AtCommand.has_frame_id());
        assert!(FrameKind::AtCommandResponse.has_frame_id());
        assert!(FrameKind::RemoteAtCommandRequest.has_frame_id());
        assert!(FrameKind::RemoteAtCommandResponse.has_frame_id());
        assert!(FrameKind::TransmitStatus.has_frame_id());
        assert!(FrameKind::TxStatus.has_frame_id());
        assert!(!FrameKind::IoDataSampleRxIndicator.has_frame_id());
        assert!(!FrameKind::RxIo16.has_frame_id());
        assert!(!FrameKind::RxIo64.has_frame_id());
        assert!(!FrameKind::ModemStatus.has_frame_id());
        assert!(!FrameKind::NodeIdentification.has_frame_id());
    }

    #[test]
    fn elicits_response_only_for_requests() {
        assert!(FrameKind::AtCommand.elicits_response());
        assert!(FrameKind::RemoteAtCommandRequest.elicits_response());
        assert!(!FrameKind::AtCommandResponse.elicits_response());
        assert!(!FrameKind::TxStatus.elicits_response());
    }
}
