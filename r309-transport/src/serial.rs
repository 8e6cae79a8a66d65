//! Serial transport for R30x sensor modules
//!
//! The module speaks 8N1 over a UART or a USB-serial bridge, 57600 bps
//! from the factory.

use std::time::Duration;

use async_trait::async_trait;
use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::time::timeout;
use tokio_serial::{DataBits, FlowControl, Parity, SerialPortBuilderExt, SerialStream, StopBits};
use tracing::{debug, trace, warn};

use crate::{error::*, Transport};

/// Serial transport over a local port
pub struct SerialTransport {
    path: String,
    baud: u32,
    stream: Option<SerialStream>,
    poll_interval: Duration,
    write_timeout: Duration,
}

impl SerialTransport {
    /// Create a new serial transport for a port path and line speed
    pub fn new(path: impl Into<String>, baud: u32) -> Self {
        Self {
            path: path.into(),
            baud,
            stream: None,
            poll_interval: Duration::from_millis(20),
            write_timeout: Duration::from_secs(2),
        }
    }

    /// Set how long one `read_available` call waits for bytes
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the write timeout
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }
}

#[async_trait]
impl Transport for SerialTransport {
    async fn connect(&mut self) -> Result<()> {
        if self.is_connected() {
            return Err(Error::AlreadyConnected);
        }

        debug!("Opening {} at {} bps...", self.path, self.baud);

        let stream = tokio_serial::new(&self.path, self.baud)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .open_native_async()?;

        debug!("Opened {}", self.path);

        self.stream = Some(stream);
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        if let Some(mut stream) = self.stream.take() {
            debug!("Closing {}...", self.path);

            let _ = stream.shutdown().await;
        }

        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    async fn send(&mut self, data: &[u8]) -> Result<()> {
        let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;

        trace!("Sending {} bytes: {:02X?}", data.len(), &data[..data.len().min(16)]);

        timeout(self.write_timeout, async {
            stream.write_all(data).await?;
            stream.flush().await
        })
        .await
        .map_err(|_| Error::Io(std::io::ErrorKind::TimedOut.into()))??;

        Ok(())
    }

    async fn read_available(&mut self) -> Result<BytesMut> {
        let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;

        let mut buf = BytesMut::with_capacity(256);

        match timeout(self.poll_interval, stream.read_buf(&mut buf)).await {
            // Line idle for the whole poll interval
            Err(_elapsed) => Ok(BytesMut::new()),
            Ok(Ok(0)) => Err(Error::PortClosed),
            Ok(Ok(n)) => {
                trace!("Received {} bytes: {:02X?}", n, &buf[..n.min(16)]);
                Ok(buf)
            }
            Ok(Err(e)) => Err(Error::Io(e)),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}@{}", self.path, self.baud)
    }
}

impl Drop for SerialTransport {
    fn drop(&mut self) {
        if self.is_connected() {
            warn!("Serial transport dropped while still open");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_serial_transport_create() {
        let transport = SerialTransport::new("/dev/ttyUSB0", 57600);
        assert!(!transport.is_connected());
        assert_eq!(transport.endpoint(), "/dev/ttyUSB0@57600");
    }

    #[tokio::test]
    async fn test_serial_transport_requires_connect() {
        let mut transport = SerialTransport::new("/dev/ttyUSB0", 57600);

        assert!(matches!(
            transport.send(&[0x00]).await,
            Err(Error::NotConnected)
        ));
        assert!(matches!(
            transport.read_available().await,
            Err(Error::NotConnected)
        ));
    }

    #[tokio::test]
    async fn test_serial_transport_invalid_port() {
        let mut transport = SerialTransport::new("/dev/does-not-exist", 57600);

        let result = transport.connect().await;
        assert!(result.is_err());
    }
}
