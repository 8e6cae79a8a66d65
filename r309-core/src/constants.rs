//! Protocol constants

/// Frame header constant (big-endian on the wire)
pub const FRAME_HEADER: u16 = 0xEF01;

/// Factory default device address
pub const DEFAULT_ADDRESS: u32 = 0xFFFF_FFFF;

/// Factory default device password
pub const DEFAULT_PASSWORD: u32 = 0x0000_0000;

/// Default reply timeout (milliseconds)
pub const DEFAULT_TIMEOUT_MS: u64 = 1000;

/// Default serial line speed (bits per second)
pub const DEFAULT_BPS: u32 = 57_600;

/// System parameter register ids (for SetSysPara)
pub mod sysparam {
    /// Baud rate control register
    pub const BAUD_RATE: u8 = 0x04;

    /// Matching security level register
    pub const SECURITY_LEVEL: u8 = 0x05;

    /// Data packet length register
    pub const PACKET_LENGTH: u8 = 0x06;
}

/// Character buffer ids (template scratch slots on the device)
pub mod char_buffer {
    pub const BUFFER_1: u8 = 1;
    pub const BUFFER_2: u8 = 2;
}
