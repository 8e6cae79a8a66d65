//! Transport layer for the r309 driver
//!
//! Provides a byte-stream abstraction over the physical link. The
//! transport moves raw bytes and nothing else; framing, checksums and
//! timeouts live above it.

pub mod error;
pub mod serial;

pub use error::{Error, Result};
pub use serial::SerialTransport;

use async_trait::async_trait;
use bytes::BytesMut;

/// Transport trait for different physical links
#[async_trait]
pub trait Transport: Send {
    /// Open the link
    async fn connect(&mut self) -> Result<()>;

    /// Close the link
    async fn disconnect(&mut self) -> Result<()>;

    /// Check if the link is open
    fn is_connected(&self) -> bool;

    /// Send raw bytes
    async fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Collect whatever bytes are currently available
    ///
    /// Waits at most one poll interval. An empty buffer means the line
    /// was idle, which is the normal state between device replies; it is
    /// never an error. Reply deadlines are enforced by the caller, which
    /// invokes this repeatedly until a full frame has accumulated.
    async fn read_available(&mut self) -> Result<BytesMut>;

    /// Get a printable description of the endpoint
    fn endpoint(&self) -> String;
}
