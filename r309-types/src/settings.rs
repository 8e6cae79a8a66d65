//! Validated device settings
//!
//! The sensor's writable registers take small integer codes, not natural
//! units. Each setting is a closed enumeration with checked construction,
//! so an out-of-range register value cannot be sent to the device.

use std::fmt;

use crate::error::{Error, Result};

/// Serial baud rate, as a device register code
///
/// The register stores the rate in units of 9600 bps (code N = N * 9600),
/// with only the listed rates supported by the hardware.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BaudRate {
    Baud9600 = 1,
    Baud19200 = 2,
    Baud38400 = 4,
    Baud57600 = 6,
    Baud76800 = 8,
    Baud115200 = 12,
}

impl BaudRate {
    /// Get the device register code
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Get the line speed in bits per second
    pub fn bps(self) -> u32 {
        self.code() as u32 * 9600
    }

    /// Look up a baud rate from its register code
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            1 => Ok(Self::Baud9600),
            2 => Ok(Self::Baud19200),
            4 => Ok(Self::Baud38400),
            6 => Ok(Self::Baud57600),
            8 => Ok(Self::Baud76800),
            12 => Ok(Self::Baud115200),
            other => Err(Error::Validation(format!(
                "unsupported baud rate code: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for BaudRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} bps", self.bps())
    }
}

/// Matching security level (1 = most permissive, 5 = strictest)
///
/// Higher levels lower the false acceptance rate at the cost of a higher
/// false rejection rate.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum SecurityLevel {
    Level1 = 1,
    Level2 = 2,
    Level3 = 3,
    Level4 = 4,
    Level5 = 5,
}

impl SecurityLevel {
    /// Get the device register code
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Look up a security level from its register code
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            1 => Ok(Self::Level1),
            2 => Ok(Self::Level2),
            3 => Ok(Self::Level3),
            4 => Ok(Self::Level4),
            5 => Ok(Self::Level5),
            other => Err(Error::Validation(format!(
                "security level out of range 1-5: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for SecurityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "level {}", self.code())
    }
}

/// Data packet length for bulk transfers, as a device register code
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PacketLength {
    Bytes32 = 0,
    Bytes64 = 1,
    Bytes128 = 2,
    Bytes256 = 3,
}

impl PacketLength {
    /// Get the device register code
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Get the packet length in bytes
    pub fn bytes(self) -> u16 {
        32 << self.code()
    }

    /// Look up a packet length from its register code
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            0 => Ok(Self::Bytes32),
            1 => Ok(Self::Bytes64),
            2 => Ok(Self::Bytes128),
            3 => Ok(Self::Bytes256),
            other => Err(Error::Validation(format!(
                "unsupported packet length code: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for PacketLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} bytes", self.bytes())
    }
}
