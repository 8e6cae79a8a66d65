//! R30x instruction and confirmation code vocabulary

use std::fmt;

/// Instruction codes understood by the sensor
///
/// Only the subset exercised by this driver is listed; the first payload
/// byte of every command frame carries one of these.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Instruction {
    /// Capture a finger image into the image buffer
    GenImage = 0x01,

    /// Convert the image buffer into a character file (template)
    ImageToTemplate = 0x02,

    /// Search the template library with a character buffer
    Search = 0x04,

    /// Write one system parameter register
    SetSysParam = 0x0E,

    /// Read the 16-byte system parameter block
    ReadSysParams = 0x0F,

    /// Check the 4-byte device password
    VerifyPassword = 0x13,

    /// Read the number of valid (stored) templates
    TemplateCount = 0x1D,
}

impl Instruction {
    /// Get instruction name as printed in the datasheet
    pub fn name(self) -> &'static str {
        match self {
            Self::GenImage => "GenImg",
            Self::ImageToTemplate => "Img2Tz",
            Self::Search => "Search",
            Self::SetSysParam => "SetSysPara",
            Self::ReadSysParams => "ReadSysPara",
            Self::VerifyPassword => "VfyPwd",
            Self::TemplateCount => "TempleteNum",
        }
    }
}

impl From<Instruction> for u8 {
    fn from(ins: Instruction) -> u8 {
        ins as u8
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(0x{:02X})", self.name(), *self as u8)
    }
}

/// Confirmation codes returned in the first byte of an ACK payload
///
/// The device's code space is wider than what this driver branches on, so
/// unrecognized values are preserved in `Other` instead of being rejected
/// at decode time.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ConfirmationCode {
    /// Command executed
    Ok,

    /// Device failed to receive the command packet
    PacketFault,

    /// No finger on the sensor window
    NoFinger,

    /// Finger present but the image could not be captured
    ImageFail,

    /// Image too disordered to build a template
    ImageDisorder,

    /// Too few feature points in the image
    ImageTooSmall,

    /// No stored template matched the search
    NoMatch,

    /// Password verification failed
    WrongPassword,

    /// No valid primary image in the buffer
    InvalidImage,

    /// Any code this driver does not branch on
    Other(u8),
}

impl ConfirmationCode {
    /// Check for the success code
    pub fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }

    /// Get a short human-readable tag for the code
    pub fn name(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::PacketFault => "error receiving packet",
            Self::NoFinger => "no finger on sensor",
            Self::ImageFail => "failed to capture image",
            Self::ImageDisorder => "image too disordered",
            Self::ImageTooSmall => "image too small",
            Self::NoMatch => "no matching template",
            Self::WrongPassword => "wrong password",
            Self::InvalidImage => "no valid image",
            Self::Other(_) => "unrecognized code",
        }
    }
}

impl From<u8> for ConfirmationCode {
    fn from(code: u8) -> Self {
        match code {
            0x00 => Self::Ok,
            0x01 => Self::PacketFault,
            0x02 => Self::NoFinger,
            0x03 => Self::ImageFail,
            0x06 => Self::ImageDisorder,
            0x07 => Self::ImageTooSmall,
            0x09 => Self::NoMatch,
            0x13 => Self::WrongPassword,
            0x15 => Self::InvalidImage,
            other => Self::Other(other),
        }
    }
}

impl From<ConfirmationCode> for u8 {
    fn from(code: ConfirmationCode) -> u8 {
        match code {
            ConfirmationCode::Ok => 0x00,
            ConfirmationCode::PacketFault => 0x01,
            ConfirmationCode::NoFinger => 0x02,
            ConfirmationCode::ImageFail => 0x03,
            ConfirmationCode::ImageDisorder => 0x06,
            ConfirmationCode::ImageTooSmall => 0x07,
            ConfirmationCode::NoMatch => 0x09,
            ConfirmationCode::WrongPassword => 0x13,
            ConfirmationCode::InvalidImage => 0x15,
            ConfirmationCode::Other(raw) => raw,
        }
    }
}

impl fmt::Display for ConfirmationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:02X})", self.name(), u8::from(*self))
    }
}
