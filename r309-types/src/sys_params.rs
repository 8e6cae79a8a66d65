//! Decoded system parameter block
//!
//! ReadSysPara returns a fixed 16-byte register block; every field is
//! big-endian at a fixed offset.

use std::fmt;

use bitflags::bitflags;
use byteorder::{BigEndian, ByteOrder};

use crate::error::{Error, Result};
use crate::settings::{BaudRate, PacketLength, SecurityLevel};

bitflags! {
    /// Contents of the device status register
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct StatusRegister: u16 {
        /// System is busy executing a command
        const BUSY = 0x0001;
        /// A matching finger pair was found
        const MATCH_FOUND = 0x0002;
        /// Handshake password has been verified
        const PASSWORD_VERIFIED = 0x0004;
        /// Image buffer holds a valid image
        const IMAGE_BUFFER_VALID = 0x0008;
    }
}

/// Device configuration snapshot
///
/// Fields are stored raw, exactly as the device reports them; the typed
/// accessors translate register codes into validated settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SysParams {
    /// Status register contents
    pub status: u16,

    /// Sensor type identifier
    pub sys_id: u16,

    /// Template library capacity (number of storable templates)
    pub lib_size: u16,

    /// Matching security level register
    pub security_level: u16,

    /// Device address as echoed by the device
    pub device_addr: u32,

    /// Data packet length register
    pub packet_max_size: u16,

    /// Baud rate register (units of 9600 bps)
    pub baud_code: u16,
}

impl SysParams {
    /// Size of the register block in a ReadSysPara acknowledgment
    pub const REGISTER_BLOCK_SIZE: usize = 16;

    /// Decode the 16-byte register block
    ///
    /// # Errors
    ///
    /// Returns a `Parse` error unless exactly 16 bytes are supplied.
    pub fn from_registers(regs: &[u8]) -> Result<Self> {
        if regs.len() != Self::REGISTER_BLOCK_SIZE {
            return Err(Error::Parse(format!(
                "system parameter block must be {} bytes, got {}",
                Self::REGISTER_BLOCK_SIZE,
                regs.len()
            )));
        }

        Ok(Self {
            status: BigEndian::read_u16(&regs[0..2]),
            sys_id: BigEndian::read_u16(&regs[2..4]),
            lib_size: BigEndian::read_u16(&regs[4..6]),
            security_level: BigEndian::read_u16(&regs[6..8]),
            device_addr: BigEndian::read_u32(&regs[8..12]),
            packet_max_size: BigEndian::read_u16(&regs[12..14]),
            baud_code: BigEndian::read_u16(&regs[14..16]),
        })
    }

    /// Get the status register as flags
    pub fn status_flags(&self) -> StatusRegister {
        StatusRegister::from_bits_truncate(self.status)
    }

    /// Get the security level as a validated setting
    pub fn security(&self) -> Option<SecurityLevel> {
        u8::try_from(self.security_level)
            .ok()
            .and_then(|code| SecurityLevel::from_code(code).ok())
    }

    /// Get the baud rate as a validated setting
    pub fn baud(&self) -> Option<BaudRate> {
        u8::try_from(self.baud_code)
            .ok()
            .and_then(|code| BaudRate::from_code(code).ok())
    }

    /// Get the data packet length as a validated setting
    ///
    /// The device reports this register as a byte count on some firmware
    /// revisions and as a 0-3 code on others; both forms are accepted.
    pub fn packet_length(&self) -> Option<PacketLength> {
        match self.packet_max_size {
            32 => Some(PacketLength::Bytes32),
            64 => Some(PacketLength::Bytes64),
            128 => Some(PacketLength::Bytes128),
            256 => Some(PacketLength::Bytes256),
            code => u8::try_from(code)
                .ok()
                .and_then(|code| PacketLength::from_code(code).ok()),
        }
    }
}

impl fmt::Display for SysParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SysParams[id: 0x{:04X}, capacity: {}, security: {}, addr: 0x{:08X}]",
            self.sys_id, self.lib_size, self.security_level, self.device_addr
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // Register block from a factory-default module
    const REGS: [u8; 16] = [
        0x00, 0x00, // status
        0x00, 0x01, // sys_id
        0x27, 0x10, // lib_size = 10000
        0x00, 0x03, // security_level
        0xFF, 0xFF, 0xFF, 0xFF, // device_addr
        0x00, 0x80, // packet_max_size = 128
        0x00, 0x06, // baud code = 6 (57600)
    ];

    #[test]
    fn test_decode_register_block() {
        let params = SysParams::from_registers(&REGS).unwrap();

        assert_eq!(params.status, 0);
        assert_eq!(params.sys_id, 1);
        assert_eq!(params.lib_size, 10000);
        assert_eq!(params.security_level, 3);
        assert_eq!(params.device_addr, 0xFFFFFFFF);
        assert_eq!(params.packet_max_size, 0x0080);
        assert_eq!(params.baud_code, 6);
    }

    #[test]
    fn test_typed_accessors() {
        let params = SysParams::from_registers(&REGS).unwrap();

        assert_eq!(params.status_flags(), StatusRegister::empty());
        assert_eq!(params.security(), Some(SecurityLevel::Level3));
        assert_eq!(params.baud(), Some(BaudRate::Baud57600));
        assert_eq!(params.packet_length(), Some(PacketLength::Bytes128));
    }

    #[test]
    fn test_packet_length_code_form() {
        let mut regs = REGS;
        regs[12] = 0x00;
        regs[13] = 0x02; // code form instead of byte count

        let params = SysParams::from_registers(&regs).unwrap();
        assert_eq!(params.packet_length(), Some(PacketLength::Bytes128));
    }

    #[test]
    fn test_status_flags() {
        let mut regs = REGS;
        regs[1] = 0x05; // busy + password verified

        let params = SysParams::from_registers(&regs).unwrap();
        let flags = params.status_flags();

        assert!(flags.contains(StatusRegister::BUSY));
        assert!(flags.contains(StatusRegister::PASSWORD_VERIFIED));
        assert!(!flags.contains(StatusRegister::MATCH_FOUND));
    }

    #[test]
    fn test_wrong_block_size() {
        assert!(SysParams::from_registers(&REGS[..15]).is_err());
        assert!(SysParams::from_registers(&[0u8; 17]).is_err());
    }

    #[test]
    fn test_out_of_range_registers_stay_raw() {
        let mut regs = REGS;
        regs[7] = 0x09; // security level 9 does not exist

        let params = SysParams::from_registers(&regs).unwrap();
        assert_eq!(params.security_level, 9);
        assert_eq!(params.security(), None);
    }
}
