//! # r309-core
//!
//! Wire protocol implementation for R30x serial fingerprint sensors.
//!
//! This crate provides the low-level protocol primitives:
//! - Frame structure and encoding/decoding
//! - Checksum calculation
//! - Instruction and confirmation code definitions
//! - Protocol constants

pub mod checksum;
pub mod command;
pub mod constants;
pub mod error;
pub mod packet;

pub use command::{ConfirmationCode, Instruction};
pub use error::{Error, Result};
pub use packet::{Packet, PacketKind};

/// Maximum wire size of one frame
pub const MAX_FRAME_SIZE: usize = Packet::PREFIX_SIZE + u16::MAX as usize;
