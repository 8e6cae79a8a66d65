//! Frame accumulation with a reply deadline
//!
//! The sensor replies to every command with exactly one acknowledgment
//! frame, delivered in however many fragments the serial layer produces.
//! `ResponseReader` polls the transport, appends whatever arrived and
//! retries the decoder until one checksum-valid frame is complete or the
//! deadline passes.

use std::time::Duration;

use bytes::BytesMut;
use r309_core::Packet;
use r309_transport::Transport;
use tokio::time::Instant;
use tracing::{trace, warn};

use crate::error::Result;

/// How long the loop yields when a poll returned nothing
const IDLE_BACKOFF: Duration = Duration::from_millis(1);

/// Accumulates transport bytes into complete protocol frames
#[derive(Default)]
pub struct ResponseReader {
    buf: BytesMut,
}

impl ResponseReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Receive one complete frame within the deadline
    ///
    /// Bytes left over after a decoded frame stay buffered for the next
    /// call. On timeout any partial frame is discarded — a reply split
    /// across two receive attempts cannot be resumed, the device will be
    /// re-commanded anyway. Header and checksum faults empty the buffer
    /// too, since after link corruption the byte stream has no trustable
    /// frame boundary.
    pub async fn receive(
        &mut self,
        transport: &mut dyn Transport,
        timeout: Duration,
    ) -> Result<Packet> {
        let deadline = Instant::now() + timeout;

        loop {
            // A complete frame may already be buffered, either from a
            // previous call or from the chunk appended just below.
            match Packet::decode(&self.buf) {
                Ok(Some((packet, consumed))) => {
                    let _ = self.buf.split_to(consumed);
                    trace!(remaining = self.buf.len(), "Received {}", packet);
                    return Ok(packet);
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(buffered = self.buf.len(), "Dropping corrupt buffer: {}", e);
                    self.buf.clear();
                    return Err(e.into());
                }
            }

            if Instant::now() >= deadline {
                let received = self.buf.len();
                self.buf.clear();
                return Err(r309_core::Error::Timeout {
                    millis: timeout.as_millis() as u64,
                    received,
                }
                .into());
            }

            let chunk = transport.read_available().await?;
            if !chunk.is_empty() {
                self.buf.extend_from_slice(&chunk);
            } else {
                tokio::time::sleep(IDLE_BACKOFF).await;
            }
        }
    }
}
