//! Scripted transport double for exercising the driver without hardware
//!
//! Reads are served from a queue, one chunk per poll, so tests can model
//! fragmented delivery and idle gaps exactly. Writes are logged behind an
//! `Arc` so a test keeps access after the transport moves into the device.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::BytesMut;
use r309_transport::{Error, Result, Transport};

pub(crate) struct ScriptedTransport {
    reads: VecDeque<Vec<u8>>,
    writes: Arc<Mutex<Vec<Vec<u8>>>>,
    connected: bool,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self {
            reads: VecDeque::new(),
            writes: Arc::new(Mutex::new(Vec::new())),
            connected: false,
        }
    }

    pub(crate) fn connected() -> Self {
        let mut transport = Self::new();
        transport.connected = true;
        transport
    }

    /// Queue one chunk to be returned by a single poll
    pub(crate) fn push_read(&mut self, chunk: Vec<u8>) {
        self.reads.push_back(chunk);
    }

    /// Queue one empty poll (line idle)
    pub(crate) fn push_idle(&mut self) {
        self.reads.push_back(Vec::new());
    }

    /// Get a handle on the write log
    pub(crate) fn write_log(&self) -> Arc<Mutex<Vec<Vec<u8>>>> {
        Arc::clone(&self.writes)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn connect(&mut self) -> Result<()> {
        if self.connected {
            return Err(Error::AlreadyConnected);
        }
        self.connected = true;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.connected = false;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn send(&mut self, data: &[u8]) -> Result<()> {
        if !self.connected {
            return Err(Error::NotConnected);
        }
        self.writes.lock().unwrap().push(data.to_vec());
        Ok(())
    }

    async fn read_available(&mut self) -> Result<BytesMut> {
        if !self.connected {
            return Err(Error::NotConnected);
        }
        let chunk = self.reads.pop_front().unwrap_or_default();
        Ok(BytesMut::from(&chunk[..]))
    }

    fn endpoint(&self) -> String {
        "scripted".to_string()
    }
}
