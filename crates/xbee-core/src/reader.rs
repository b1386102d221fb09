//! The Reader: a dedicated task that owns the inbound half of the
//! transport, feeds bytes to the frame decoder, and delivers decoded
//! frames to the [`ListenerRegistry`].
//!
//! Framing errors (`BadChecksum`, `BadLength`) are logged and dropped —
//! only that one malformed frame is lost, decoding resumes on the next
//! start delimiter. A transport EOF or fatal I/O error ends the task after
//! marking the listener registry closed, so every outstanding waiter wakes
//! immediately rather than running out its full `receive_timeout`.

use std::sync::Arc;

use xbee_proto::FrameDecoder;

use crate::{listener::ListenerRegistry, transport::Transport};

const READ_BUF_SIZE: usize = 512;

/// Runs the Reader loop until the transport reaches EOF or a fatal error.
///
/// Intended to be spawned as its own `tokio` task; the returned
/// `JoinHandle` should be retained by the owning device so `close()` can
/// await its completion rather than just dropping it.
pub async fn run<T: Transport>(transport: Arc<T>, listener: ListenerRegistry, escaped: bool) {
    let mut decoder = FrameDecoder::new(escaped);
    let mut buf = vec![0u8; READ_BUF_SIZE];

    loop {
        let read = match transport.read(&mut buf).await {
            Ok(0) => {
                tracing::info!("transport reached EOF, reader exiting");
                listener.mark_closed().await;
                return;
            },
            Ok(n) => n,
            Err(error) => {
                tracing::warn!(%error, "transport read failed, reader exiting");
                listener.mark_closed().await;
                return;
            },
        };

        for result in decoder.push_bytes(&buf[..read]) {
            match result {
                Ok(frame) => listener.dispatch(frame).await,
                Err(error) => tracing::warn!(%error, "dropping malformed frame"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use tokio::sync::Mutex;
    use xbee_proto::{codec, Frame};

    use super::*;
    use crate::error::Result;

    struct ScriptedTransport {
        chunks: Mutex<Vec<Vec<u8>>>,
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn open(&self) -> Result<()> {
            Ok(())
        }

        async fn close(&self) -> Result<()> {
            Ok(())
        }

        async fn is_open(&self) -> bool {
            true
        }

        async fn write(&self, _bytes: &[u8]) -> Result<()> {
            Ok(())
        }

        async fn read(&self, buf: &mut [u8]) -> Result<usize> {
            let mut chunks = self.chunks.lock().await;
            if chunks.is_empty() {
                return Ok(0);
            }
            let chunk = chunks.remove(0);
            buf[..chunk.len()].copy_from_slice(&chunk);
            Ok(chunk.len())
        }
    }

    #[tokio::test]
    async fn decoded_frames_reach_global_listeners() {
        let frame = Frame::new(0x08, Some(1), &b"NI"[..]);
        let wire = codec::encode(&frame, false).unwrap();
        let transport = Arc::new(ScriptedTransport { chunks: Mutex::new(vec![wire]) });
        let listener = ListenerRegistry::new();
        let sub = listener.subscribe_global().await;

        run(transport, listener, false).await;

        let received = sub.recv().await;
        assert_eq!(received, Some(frame));
    }

    #[tokio::test]
    async fn malformed_frame_is_dropped_but_reader_continues() {
        let good = Frame::new(0x08, Some(1), &b"NI"[..]);
        let mut bad_then_good = codec::encode(&good, false).unwrap();
        let last = bad_then_good.len() - 1;
        bad_then_good[last] ^= 0xFF;
        bad_then_good.extend_from_slice(&codec::encode(&good, false).unwrap());

        let transport = Arc::new(ScriptedTransport { chunks: Mutex::new(vec![bad_then_good]) });
        let listener = ListenerRegistry::new();
        let sub = listener.subscribe_global().await;

        run(transport, listener, false).await;

        let received = sub.recv().await;
        assert_eq!(received, Some(good));
    }

    #[tokio::test]
    async fn eof_marks_the_registry_closed_for_waiting_subscribers() {
        let transport = Arc::new(ScriptedTransport { chunks: Mutex::new(Vec::new()) });
        let listener = ListenerRegistry::new();
        let sub = listener.subscribe_global().await;

        run(transport, listener, false).await;

        assert_eq!(sub.recv().await, None);
    }
}
