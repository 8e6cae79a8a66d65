//! Error types for r309-core

/// Result type alias for protocol operations
pub type Result<T> = std::result::Result<T, Error>;

/// Framing-level protocol errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Buffer does not start with the 0xEF01 header constant
    #[error("Unknown packet header: 0x{found:04X}")]
    BadHeader {
        found: u16,
    },

    /// Checksum verification failed
    #[error("Checksum error: computed 0x{computed:04X}, expected 0x{expected:04X}")]
    ChecksumMismatch {
        expected: u16,
        computed: u16,
    },

    /// Packet type byte is not CMD/DATA/ACK/END
    #[error("Unknown packet type: 0x{0:02X}")]
    UnknownPacketKind(u8),

    /// Payload would overflow the 16-bit length field
    #[error("Payload too large: {size} bytes (max: {max} bytes)")]
    PayloadTooLarge {
        size: usize,
        max: usize,
    },

    /// Frame decoded cleanly but its contents make no sense for the caller
    #[error("Malformed response: {0}")]
    MalformedResponse(&'static str),

    /// No complete frame arrived before the deadline
    #[error("Timed out after {millis}ms waiting for a reply ({received} bytes received)")]
    Timeout {
        millis: u64,
        received: usize,
    },
}

impl Error {
    /// Check if error is recoverable (retry might succeed)
    ///
    /// A timeout while polling for a finger is an expected state; header
    /// and checksum faults indicate link corruption and should abort.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
