//! High-level error types

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Protocol error: {0}")]
    Protocol(#[from] r309_core::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] r309_transport::Error),

    #[error("Type error: {0}")]
    Types(#[from] r309_types::Error),

    #[error("Device not connected")]
    NotConnected,

    #[error("Device rejected the password")]
    AuthenticationFailed,

    /// The device answered with its generic "error receiving packet" code
    /// (0x01), which means the command frame itself never got through.
    #[error("Device failed to receive the command packet")]
    DeviceCommError,

    #[error("Device fault while {0}")]
    DeviceFault(&'static str),

    #[error("Device rejected write to parameter 0x{param:02X} (code 0x{code:02X})")]
    DeviceRejected {
        param: u8,
        code: u8,
    },

    #[error("Unexpected response from device (code 0x{code:02X})")]
    UnexpectedResponse {
        code: u8,
    },
}

impl Error {
    /// Check if a retry of the same operation makes sense
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Protocol(e) => e.is_recoverable(),
            _ => false,
        }
    }
}
