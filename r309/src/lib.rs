//! # r309
//!
//! Driver for R30x family capacitive fingerprint sensors (R302/R305/R309)
//! attached over a serial link.
//!
//! ## Features
//!
//! - Byte-exact implementation of the sensor's binary frame protocol
//! - Async API using Tokio, one blocking point per round trip
//! - Expected polling states (no finger, no match) as ordinary results
//! - Structured errors carrying the raw device codes
//!
//! ## Quick Start
//!
//! ```no_run
//! use r309::Device;
//!
//! #[tokio::main]
//! async fn main() -> r309::Result<()> {
//!     let mut device = Device::new("/dev/ttyUSB0", 57600);
//!     device.connect().await?;
//!
//!     loop {
//!         if device.scan_finger().await?.is_finger_present() {
//!             println!("{}", device.identify().await?);
//!             break;
//!         }
//!     }
//!
//!     device.disconnect().await?;
//!     Ok(())
//! }
//! ```

pub mod device;
pub mod dispatcher;
pub mod error;
pub mod reader;

#[cfg(test)]
pub(crate) mod test_support;

// Re-exports
pub use device::{Device, IdentifyOutcome, ScanOutcome};
pub use dispatcher::CommandReply;
pub use error::{Error, Result};
pub use reader::ResponseReader;

// Re-export types
pub use r309_core::{ConfirmationCode, Instruction, Packet, PacketKind};
pub use r309_transport::{SerialTransport, Transport};
pub use r309_types::{BaudRate, PacketLength, SecurityLevel, StatusRegister, SysParams};
