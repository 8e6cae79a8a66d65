//! Type definitions for the r309 driver

pub mod error;
pub mod settings;
pub mod sys_params;

pub use error::{Error, Result};
pub use settings::{BaudRate, PacketLength, SecurityLevel};
pub use sys_params::{StatusRegister, SysParams};
