//! XBee wire protocol
//!
//! Pure, synchronous encode/decode for the XBee API-frame protocol: running
//! checksum, escape/unescape, the frame state machine, the static
//! frame-type registry, and the typed payload shapes for AT commands,
//! transmit status, and IO samples.
//!
//! # Components
//!
//! - [`checksum`]: running checksum accumulator
//! - [`codec`]: escape-aware streaming frame encoder/decoder
//! - [`registry`]: frame-type classification (`FrameKind`)
//! - [`frame::Frame`]: the decoded frame boundary type
//! - [`at`], [`tx_status`], [`io_sample`]: typed payload shapes
//!
//! Nothing in this crate is async; it has no opinion about how bytes
//! arrive. `xbee-core` owns the transport and task model built on top of
//! it.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod at;
pub mod checksum;
pub mod codec;
pub mod errors;
pub mod frame;
pub mod io_sample;
pub mod registry;
pub mod tx_status;

pub use checksum::Checksum;
pub use codec::FrameDecoder;
pub use errors::ProtocolError;
pub use frame::Frame;
pub use registry::FrameKind;
