//! The `Transport` boundary.
//!
//! This crate owns framing, correlation and the device facade; it has no
//! opinion about what carries the bytes. A concrete transport (serial port,
//! TCP socket, in-memory loopback for tests) implements this trait.

use async_trait::async_trait;

use crate::error::Result;

/// A byte-oriented duplex channel to an XBee module.
///
/// Implementations are expected to be cheaply cloneable or already
/// reference-counted internally — the Reader and the Correlator each hold
/// their own handle to the same underlying transport, with writes
/// serialized by the Correlator's write lock rather than by the transport
/// itself.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Opens the underlying channel (e.g. opens the serial port).
    ///
    /// Calling `open` on an already-open transport is a no-op.
    async fn open(&self) -> Result<()>;

    /// Closes the underlying channel. Idempotent.
    async fn close(&self) -> Result<()>;

    /// True if the channel is currently open.
    async fn is_open(&self) -> bool;

    /// Writes `bytes` in full. Only `IoError` is expected here; framing
    /// concerns are the codec's responsibility, not the transport's.
    async fn write(&self, bytes: &[u8]) -> Result<()>;

    /// Reads whatever is available into `buf`, returning the number of
    /// bytes read, or `0` on a clean end-of-stream.
    async fn read(&self, buf: &mut [u8]) -> Result<usize>;
}
