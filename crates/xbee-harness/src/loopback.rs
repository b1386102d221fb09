//! An in-memory loopback [`Transport`] for driving the reader/correlator
//! stack without a real serial port.
//!
//! Tests drive two things independently: what the simulated module "says"
//! ([`LoopbackTransport::inject`]/[`LoopbackTransport::inject_frame`]) and,
//! optionally, serial echo — when constructed with `echo: true`, every
//! byte written is fed straight back into the read side, exactly as a
//! half-duplex serial loopback would.

use std::{
    collections::VecDeque,
    sync::atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};
use xbee_core::{error::Result, Transport};
use xbee_proto::{codec, Frame};

/// In-memory stand-in for a serial/TCP transport.
pub struct LoopbackTransport {
    buffer: Mutex<VecDeque<u8>>,
    notify: Notify,
    closed: AtomicBool,
    open: AtomicBool,
    echo: bool,
    written: Mutex<Vec<Vec<u8>>>,
}

impl LoopbackTransport {
    /// Creates a transport with no echo: writes never loop back on their
    /// own, only [`LoopbackTransport::inject`] delivers inbound bytes.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
            closed: AtomicBool::new(false),
            open: AtomicBool::new(false),
            echo: false,
            written: Mutex::new(Vec::new()),
        }
    }

    /// Creates a transport that echoes every written byte back to the
    /// reader, simulating a half-duplex serial loopback.
    #[must_use]
    pub fn with_echo() -> Self {
        Self { echo: true, ..Self::new() }
    }

    /// Delivers raw bytes to the reader, as if the module had sent them.
    pub async fn inject(&self, bytes: &[u8]) {
        let mut buffer = self.buffer.lock().await;
        buffer.extend(bytes.iter().copied());
        drop(buffer);
        self.notify.notify_waiters();
    }

    /// Encodes `frame` and delivers it to the reader.
    ///
    /// # Panics
    ///
    /// Panics if `frame` can't be encoded (e.g. a frame type requiring a
    /// frame id with none set) — a harness misuse, not a runtime error.
    pub async fn inject_frame(&self, frame: &Frame, escaped: bool) {
        let wire = codec::encode(frame, escaped).expect("harness frame must encode");
        self.inject(&wire).await;
    }

    /// Every byte sequence written to this transport, in write order.
    pub async fn written(&self) -> Vec<Vec<u8>> {
        self.written.lock().await.clone()
    }
}

impl Default for LoopbackTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for LoopbackTransport {
    async fn open(&self) -> Result<()> {
        self.open.store(true, Ordering::Release);
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.open.store(false, Ordering::Release);
        self.closed.store(true, Ordering::Release);
        self.notify.notify_waiters();
        Ok(())
    }

    async fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    async fn write(&self, bytes: &[u8]) -> Result<()> {
        self.written.lock().await.push(bytes.to_vec());
        if self.echo {
            self.inject(bytes).await;
        }
        Ok(())
    }

    async fn read(&self, buf: &mut [u8]) -> Result<usize> {
        loop {
            {
                let mut buffer = self.buffer.lock().await;
                if !buffer.is_empty() {
                    let n = buffer.len().min(buf.len());
                    for slot in buf.iter_mut().take(n) {
                        *slot = buffer.pop_front().expect("checked non-empty above");
                    }
                    return Ok(n);
                }
                if self.closed.load(Ordering::Acquire) {
                    return Ok(0);
                }
            }
            self.notify.notified().await;
        }
    }
}
