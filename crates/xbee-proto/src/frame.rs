//! The [`Frame`] type: a decoded API frame, independent of escape mode.
//!
//! A `Frame` is the boundary between the wire codec and everything above
//! it. Once a frame has been decoded, nothing downstream cares whether it
//! arrived in API mode 1 or API mode 2 (escaped) — that distinction only
//! matters to [`crate::codec`].

use bytes::Bytes;

use crate::{codec, errors::ProtocolError, registry};

/// A decoded (or to-be-encoded) API frame.
///
/// `frame_id` is `None` for frame types whose wire shape has no frame-id
/// byte (per [`registry::has_frame_id`]); it is always `Some` otherwise,
/// including the value `0x00`, which on the wire means "no response
/// expected" rather than "absent".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Raw frame-type byte, e.g. `0x08` for an AT command request.
    pub frame_type: u8,
    /// Frame id, present iff this frame type carries one.
    pub frame_id: Option<u8>,
    /// Frame payload, with the frame-id byte (if any) already split off.
    pub payload: Bytes,
}

impl Frame {
    /// Builds a frame directly from its parts. `frame_id` should be `Some`
    /// exactly when [`registry::has_frame_id`] is true for `frame_type`;
    /// [`encode`](codec::encode) enforces this at write time.
    pub fn new(frame_type: u8, frame_id: Option<u8>, payload: impl Into<Bytes>) -> Self {
        Self { frame_type, frame_id, payload: payload.into() }
    }

    /// Reconstructs a frame from a checksum-verified wire body (type byte
    /// followed by frame-id byte, if any, followed by payload).
    ///
    /// # Panics
    ///
    /// Never panics on an empty body in release builds that reach here
    /// through [`codec::FrameDecoder`], which guarantees at least one byte
    /// (the type byte) via the `BadLength` check before this is called.
    #[must_use]
    pub(crate) fn from_wire_body(body: &[u8]) -> Self {
        let frame_type = body[0];
        let rest = &body[1..];
        if registry::has_frame_id(frame_type) && !rest.is_empty() {
            Self { frame_type, frame_id: Some(rest[0]), payload: Bytes::copy_from_slice(&rest[1..]) }
        } else {
            Self { frame_type, frame_id: None, payload: Bytes::copy_from_slice(rest) }
        }
    }

    /// Encodes this frame to its wire representation.
    ///
    /// # Errors
    ///
    /// See [`codec::encode`].
    pub fn encode(&self, escaped: bool) -> Result<Vec<u8>, ProtocolError> {
        codec::encode(self, escaped)
    }
}
