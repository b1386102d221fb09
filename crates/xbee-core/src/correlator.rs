//! Correlator / Send Engine: request/response correlation over a shared
//! serial channel via the frame-id scheme.
//!
//! Writers are serialized through a single write lock — one frame on the
//! wire at a time — while waiters are built on top of
//! [`ListenerRegistry::subscribe_keyed`], so a cancelled or timed-out
//! waiter simply drops its subscription and later frames with that id fall
//! through to the global listener path only.

use std::{collections::HashSet, sync::Arc, time::Instant};

use tokio::sync::Mutex;
use xbee_proto::{
    at::AtMnemonic,
    registry::FrameKind,
    tx_status::{LegacyTxStatus, TransmitStatus, TxStatus},
    Frame,
};

use crate::{
    config::DriverConfig,
    error::{Result, XBeeError},
    frame_id::FrameIdAllocator,
    listener::ListenerRegistry,
    transport::Transport,
};

/// Engine that serializes outbound writes and correlates inbound frames to
/// the waiter that sent the matching request.
pub struct Correlator<T: Transport> {
    transport: Arc<T>,
    listener: ListenerRegistry,
    allocator: Mutex<FrameIdAllocator>,
    in_use: Mutex<HashSet<u8>>,
    write_lock: Mutex<()>,
    config: DriverConfig,
}

impl<T: Transport> Correlator<T> {
    /// Builds a correlator over `transport`, delivering every frame the
    /// Reader decodes through `listener`.
    #[must_use]
    pub fn new(transport: Arc<T>, listener: ListenerRegistry, config: DriverConfig) -> Self {
        Self {
            transport,
            listener,
            allocator: Mutex::new(FrameIdAllocator::new()),
            in_use: Mutex::new(HashSet::new()),
            write_lock: Mutex::new(()),
            config,
        }
    }

    /// The listener registry this correlator delivers responses through.
    #[must_use]
    pub fn listener(&self) -> &ListenerRegistry {
        &self.listener
    }

    /// Reserves the next available non-zero frame id.
    ///
    /// # Errors
    ///
    /// Returns [`XBeeError::FrameIdExhausted`] if all 255 ids are held by
    /// live waiters.
    pub async fn reserve_frame_id(&self) -> Result<u8> {
        let mut in_use = self.in_use.lock().await;
        let mut allocator = self.allocator.lock().await;
        let id = allocator.allocate(&in_use)?;
        in_use.insert(id);
        Ok(id)
    }

    async fn release_frame_id(&self, id: u8) {
        self.in_use.lock().await.remove(&id);
    }

    async fn write_frame(&self, frame: &Frame) -> Result<()> {
        let wire = frame.encode(self.config.operating_mode.is_escaped())?;
        let _guard = self.write_lock.lock().await;
        self.transport.write(&wire).await
    }

    /// Sends `frame` without waiting for any response.
    ///
    /// If the frame's type requires a frame-id byte and none was set, the
    /// wire value `0` is used — "no response expected" — rather than
    /// reserving one from the allocator.
    ///
    /// # Errors
    ///
    /// Propagates transport write failures.
    pub async fn send_fire_and_forget(&self, mut frame: Frame) -> Result<()> {
        if FrameKind::from_byte(frame.frame_type).has_frame_id() && frame.frame_id.is_none() {
            frame.frame_id = Some(0);
        }
        self.write_frame(&frame).await
    }

    /// Sends `frame`, allocating a frame id if one isn't already set, and
    /// waits for a correlated response of type `expected_response_type`.
    ///
    /// The match predicate applied to every candidate frame sharing the
    /// allocated id: frames byte-identical to the one just sent (serial
    /// echo) are dropped (they were already delivered to global
    /// listeners by the registry); frames of a type other than
    /// `expected_response_type` are ignored and waited past, since more
    /// than one frame can legitimately share an id in flight (the echo
    /// case above); and, when `frame` is an `AT_COMMAND` or
    /// `REMOTE_AT_COMMAND_REQUEST`, the candidate's embedded mnemonic must
    /// match the one sent (case-insensitive) — otherwise a stale or racing
    /// response for a different mnemonic that happens to reuse this frame
    /// id would be accepted as correlated.
    ///
    /// # Errors
    ///
    /// - [`XBeeError::FrameIdExhausted`] if no id is available.
    /// - [`XBeeError::Timeout`] if `receive_timeout` elapses first.
    /// - Transport write failures.
    pub async fn send_and_wait(&self, mut frame: Frame, expected_response_type: u8) -> Result<Frame> {
        let needs_id = FrameKind::from_byte(frame.frame_type).has_frame_id();
        let frame_id = if needs_id && frame.frame_id.is_none() {
            let id = self.reserve_frame_id().await?;
            frame.frame_id = Some(id);
            Some(id)
        } else {
            frame.frame_id
        };

        let Some(frame_id) = frame_id else {
            // Frame types without an id can't be correlated; the caller
            // should use `send_fire_and_forget` instead.
            return Err(XBeeError::InvalidArg(
                "send_and_wait requires a frame type that carries a frame id".to_owned(),
            ));
        };

        let subscription = self.listener.subscribe_keyed(frame_id).await;
        let sent = frame.clone();
        let expected_mnemonic = sent_mnemonic(&sent);
        let result =
            self.send_and_wait_inner(frame, expected_response_type, expected_mnemonic, &subscription, &sent).await;
        self.release_frame_id(frame_id).await;
        result
    }

    async fn send_and_wait_inner(
        &self,
        frame: Frame,
        expected_response_type: u8,
        expected_mnemonic: Option<AtMnemonic>,
        subscription: &crate::listener::Subscription,
        sent: &Frame,
    ) -> Result<Frame> {
        self.write_frame(&frame).await?;

        let deadline = Instant::now() + self.config.receive_timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(XBeeError::Timeout);
            }
            let candidate = match tokio::time::timeout(remaining, subscription.recv()).await {
                Ok(Some(frame)) => frame,
                Ok(None) => return Err(XBeeError::TransportClosed),
                Err(_) => return Err(XBeeError::Timeout),
            };
            if &candidate == sent {
                continue; // serial echo of our own write
            }
            if candidate.frame_type != expected_response_type {
                continue;
            }
            if let Some(expected) = expected_mnemonic {
                match response_mnemonic(&candidate) {
                    Some(actual) if mnemonics_match(expected, actual) => {},
                    _ => continue, // same frame id, different (or unparseable) mnemonic: not our response
                }
            }
            return Ok(candidate);
        }
    }

    /// Like [`Correlator::send_and_wait`], but additionally requires the
    /// correlated response to be a transmit-status frame reporting
    /// success.
    ///
    /// `expected_response_type` must be `TRANSMIT_STATUS` (`0x8B`) or the
    /// legacy `TX_STATUS` (`0x89`).
    ///
    /// # Errors
    ///
    /// As [`Correlator::send_and_wait`], plus [`XBeeError::Transmit`] if the
    /// status byte reports anything other than success.
    pub async fn send_and_check(&self, frame: Frame, expected_response_type: u8) -> Result<Frame> {
        let response = self.send_and_wait(frame, expected_response_type).await?;
        let status = match expected_response_type {
            0x8B => TransmitStatus::from_bytes(&response.payload).map(|parsed| parsed.status),
            0x89 => LegacyTxStatus::from_bytes(&response.payload).map(|parsed| parsed.status),
            _ => None,
        };
        match status {
            Some(status) if status.is_success() => Ok(response),
            Some(status) => Err(XBeeError::Transmit(status)),
            None => Err(XBeeError::Transmit(TxStatus::Other(0xFF))),
        }
    }
}

/// Extracts the AT mnemonic embedded in an outgoing `AT_COMMAND` or
/// `REMOTE_AT_COMMAND_REQUEST` frame, if `frame` is one of those two kinds.
fn sent_mnemonic(frame: &Frame) -> Option<AtMnemonic> {
    match FrameKind::from_byte(frame.frame_type) {
        FrameKind::AtCommand => mnemonic_at(&frame.payload, 0),
        // addr64(8) + addr16(2) + options(1) precede the mnemonic.
        FrameKind::RemoteAtCommandRequest => mnemonic_at(&frame.payload, 11),
        _ => None,
    }
}

/// Extracts the AT mnemonic embedded in an inbound `AT_COMMAND_RESPONSE` or
/// `REMOTE_AT_COMMAND_RESPONSE` frame, if `frame` is one of those two kinds.
fn response_mnemonic(frame: &Frame) -> Option<AtMnemonic> {
    match FrameKind::from_byte(frame.frame_type) {
        FrameKind::AtCommandResponse => mnemonic_at(&frame.payload, 0),
        // addr64(8) + addr16(2) precede the mnemonic.
        FrameKind::RemoteAtCommandResponse => mnemonic_at(&frame.payload, 10),
        _ => None,
    }
}

fn mnemonic_at(payload: &[u8], offset: usize) -> Option<AtMnemonic> {
    let bytes = payload.get(offset..offset + 2)?;
    Some([bytes[0], bytes[1]])
}

fn mnemonics_match(a: AtMnemonic, b: AtMnemonic) -> bool {
    a[0].eq_ignore_ascii_case(&b[0]) && a[1].eq_ignore_ascii_case(&b[1])
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;

    struct RecordingTransport {
        written: Mutex<Vec<Vec<u8>>>,
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn open(&self) -> Result<()> {
            Ok(())
        }

        async fn close(&self) -> Result<()> {
            Ok(())
        }

        async fn is_open(&self) -> bool {
            true
        }

        async fn write(&self, bytes: &[u8]) -> Result<()> {
            self.written.lock().await.push(bytes.to_vec());
            Ok(())
        }

        async fn read(&self, _buf: &mut [u8]) -> Result<usize> {
            Ok(0)
        }
    }

    #[tokio::test]
    async fn fire_and_forget_assigns_zero_id_when_unset() {
        let transport = Arc::new(RecordingTransport { written: Mutex::new(Vec::new()) });
        let listener = ListenerRegistry::new();
        let correlator = Correlator::new(transport.clone(), listener, DriverConfig::default());

        let frame = Frame::new(0x08, None, &b"NI"[..]);
        correlator.send_fire_and_forget(frame).await.unwrap();

        let written = transport.written.lock().await;
        assert_eq!(written.len(), 1);
        // byte 4 is the frame id slot for an 0x08 frame.
        assert_eq!(written[0][4], 0x00);
    }

    #[tokio::test]
    async fn send_and_wait_times_out_without_a_response() {
        let transport = Arc::new(RecordingTransport { written: Mutex::new(Vec::new()) });
        let listener = ListenerRegistry::new();
        let mut config = DriverConfig::default();
        config.receive_timeout = std::time::Duration::from_millis(20);
        let correlator = Correlator::new(transport, listener, config);

        let frame = Frame::new(0x08, None, &b"NI"[..]);
        let result = correlator.send_and_wait(frame, 0x88).await;
        assert_eq!(result, Err(XBeeError::Timeout));
    }

    #[tokio::test]
    async fn send_and_wait_matches_correlated_response_and_ignores_echo() {
        let transport = Arc::new(RecordingTransport { written: Mutex::new(Vec::new()) });
        let listener = ListenerRegistry::new();
        let correlator =
            Arc::new(Correlator::new(transport, listener.clone(), DriverConfig::default()));

        let sent = Frame::new(0x08, Some(1), &b"NI"[..]);
        let response = Frame::new(0x88, Some(1), &b"NInode1"[..]);

        let correlator_clone = correlator.clone();
        let listener_clone = listener.clone();
        let sent_clone = sent.clone();
        let response_clone = response.clone();
        let driver = tokio::spawn(async move {
            // give send_and_wait a chance to subscribe first.
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            listener_clone.dispatch(sent_clone).await; // echo
            listener_clone.dispatch(response_clone).await; // the real response
        });

        let request = Frame::new(0x08, Some(1), &b"NI"[..]);
        let result = correlator_clone.send_and_wait(request, 0x88).await.unwrap();
        assert_eq!(result, response);
        driver.await.unwrap();
    }

    #[tokio::test]
    async fn send_and_wait_rejects_response_for_a_different_mnemonic_on_the_same_id() {
        let transport = Arc::new(RecordingTransport { written: Mutex::new(Vec::new()) });
        let listener = ListenerRegistry::new();
        let correlator =
            Arc::new(Correlator::new(transport, listener.clone(), DriverConfig::default()));

        // a stale response for a different mnemonic ("SL") reused the same
        // frame id (1) as our "NI" query would; the real response follows.
        let stale = Frame::new(0x88, Some(1), &b"SL\x00\x01\x02\x03\x04"[..]);
        let real_response = Frame::new(0x88, Some(1), &b"NInode1"[..]);

        let listener_clone = listener.clone();
        let stale_clone = stale.clone();
        let real_clone = real_response.clone();
        let driver = tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            listener_clone.dispatch(stale_clone).await;
            listener_clone.dispatch(real_clone).await;
        });

        let request = Frame::new(0x08, Some(1), &b"NI"[..]);
        let result = correlator.send_and_wait(request, 0x88).await.unwrap();
        assert_eq!(result, real_response);
        driver.await.unwrap();
    }

    #[tokio::test]
    async fn send_and_wait_reports_transport_closed_when_registry_closes_first() {
        let transport = Arc::new(RecordingTransport { written: Mutex::new(Vec::new()) });
        let listener = ListenerRegistry::new();
        let correlator =
            Arc::new(Correlator::new(transport, listener.clone(), DriverConfig::default()));

        let correlator_clone = correlator.clone();
        let closer = tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            listener.mark_closed().await;
        });

        let frame = Frame::new(0x08, None, &b"NI"[..]);
        let result = correlator_clone.send_and_wait(frame, 0x88).await;
        assert_eq!(result, Err(XBeeError::TransportClosed));
        closer.await.unwrap();
    }
}
