//! High-level device interface

use std::fmt;
use std::time::Duration;

use bytes::{BufMut, BytesMut};
use tracing::{debug, info, warn};

use r309_core::constants::{char_buffer, sysparam, DEFAULT_ADDRESS, DEFAULT_PASSWORD};
use r309_core::{ConfirmationCode, Instruction};
use r309_transport::{SerialTransport, Transport};
use r309_types::{BaudRate, PacketLength, SecurityLevel, SysParams};

use crate::dispatcher::CommandDispatcher;
use crate::error::{Error, Result};

/// Result of one finger scan attempt
///
/// An empty sensor window is a normal polling state, so it is a variant
/// here and never an error.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// A finger was captured into the image buffer
    FingerDetected,

    /// Nothing on the sensor window
    NoFinger,

    /// Finger present but no usable image could be taken
    TemplateUnreadable,
}

impl ScanOutcome {
    /// Check whether a finger image was captured
    pub fn is_finger_present(self) -> bool {
        matches!(self, Self::FingerDetected)
    }
}

impl fmt::Display for ScanOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::FingerDetected => "finger detected",
            Self::NoFinger => "no finger on sensor",
            Self::TemplateUnreadable => "template was not read",
        };
        write!(f, "{}", msg)
    }
}

/// Result of the capture-convert-search workflow
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum IdentifyOutcome {
    /// A stored template matched the captured finger
    Matched {
        /// Library page (template slot) of the match
        page: u16,
        /// Matching accuracy score
        score: u16,
    },

    /// The whole library was searched without a match
    NotMatched,

    /// The captured image could not be converted to a template; the code
    /// says why (too small, too disordered, no valid image)
    Rejected {
        code: ConfirmationCode,
    },
}

impl IdentifyOutcome {
    /// Get the matched page, if any
    pub fn page(&self) -> Option<u16> {
        match self {
            Self::Matched { page, .. } => Some(*page),
            _ => None,
        }
    }
}

impl fmt::Display for IdentifyOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Matched { page, score } => {
                write!(f, "matched template #{} (score {})", page, score)
            }
            Self::NotMatched => write!(f, "no matching template"),
            Self::Rejected { code } => write!(f, "capture rejected: {}", code),
        }
    }
}

/// R30x fingerprint sensor
///
/// High-level interface sequencing protocol round trips into the
/// documented device operations. The device address, password and reply
/// timeout have builder-style overrides; defaults match a factory module.
///
/// # Examples
///
/// ```no_run
/// use r309::Device;
///
/// #[tokio::main]
/// async fn main() -> r309::Result<()> {
///     let mut device = Device::new("/dev/ttyUSB0", 57600);
///
///     device.connect().await?;
///     println!("Capacity: {} templates", device.storage_capacity()?);
///
///     if device.scan_finger().await?.is_finger_present() {
///         println!("{}", device.identify().await?);
///     }
///
///     device.disconnect().await?;
///     Ok(())
/// }
/// ```
pub struct Device {
    dispatcher: CommandDispatcher,
    sys_params: Option<SysParams>,
}

impl Device {
    /// Create a device on a serial port
    pub fn new(path: impl Into<String>, baud: u32) -> Self {
        Self::with_transport(Box::new(SerialTransport::new(path, baud)))
    }

    /// Create a device over an already-built transport
    pub fn with_transport(transport: Box<dyn Transport>) -> Self {
        Self {
            dispatcher: CommandDispatcher::new(
                transport,
                DEFAULT_ADDRESS,
                DEFAULT_PASSWORD,
                Duration::from_millis(r309_core::constants::DEFAULT_TIMEOUT_MS),
            ),
            sys_params: None,
        }
    }

    /// Set the device address (factory default: 0xFFFFFFFF)
    pub fn with_address(mut self, address: u32) -> Self {
        self.dispatcher.address = address;
        self
    }

    /// Set the handshake password (factory default: 0)
    pub fn with_password(mut self, password: u32) -> Self {
        self.dispatcher.password = password;
        self
    }

    /// Set the reply timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.dispatcher.timeout = timeout;
        self
    }

    /// Check if the transport is open
    pub fn is_connected(&self) -> bool {
        self.dispatcher.is_open()
    }

    /// Get the cached system parameters, if connected
    pub fn sys_params(&self) -> Option<SysParams> {
        self.sys_params
    }

    /// Open the link and authenticate to the device
    ///
    /// Verifies the password, then caches the system parameter block that
    /// the read accessors serve from.
    ///
    /// # Errors
    ///
    /// `AuthenticationFailed` if the device rejects the password; this is
    /// fatal and no further command is attempted. `DeviceFault` if the
    /// parameter read after a successful handshake fails.
    pub async fn connect(&mut self) -> Result<()> {
        info!("Connecting to {}...", self.dispatcher.endpoint());

        self.dispatcher.open().await?;

        let reply = self.dispatcher.call(Instruction::VerifyPassword, &[]).await?;
        if !reply.ok() {
            warn!("Password verification answered {}", reply.code);
            let _ = self.dispatcher.close().await;
            return Err(Error::AuthenticationFailed);
        }

        match self.refresh_sys_params().await {
            Ok(params) => {
                info!("Connected: {}", params);
                Ok(())
            }
            Err(e) => {
                warn!("Parameter read after handshake failed: {}", e);
                let _ = self.dispatcher.close().await;
                Err(Error::DeviceFault("reading system parameters after connect"))
            }
        }
    }

    /// Close the link and drop the cached parameters
    pub async fn disconnect(&mut self) -> Result<()> {
        if !self.is_connected() {
            return Ok(());
        }

        info!("Disconnecting from {}...", self.dispatcher.endpoint());

        self.dispatcher.close().await?;
        self.sys_params = None;

        Ok(())
    }

    /// Re-read the system parameter block from the device
    ///
    /// The cache is replaced wholesale. Call this if the library capacity
    /// or other registers may have changed out of band; `identify` sizes
    /// its search from the cache and does not refresh it.
    pub async fn refresh_sys_params(&mut self) -> Result<SysParams> {
        let reply = self.dispatcher.call(Instruction::ReadSysParams, &[]).await?;

        if !reply.ok() {
            return Err(Error::DeviceFault("reading system parameters"));
        }

        if reply.payload.len() < 1 + SysParams::REGISTER_BLOCK_SIZE {
            return Err(r309_core::Error::MalformedResponse("short system parameter block").into());
        }

        let params = SysParams::from_registers(
            &reply.payload[1..1 + SysParams::REGISTER_BLOCK_SIZE],
        )?;

        debug!("Refreshed {}", params);
        self.sys_params = Some(params);

        Ok(params)
    }

    /// Get the matching security level register (1-5), from cache
    pub fn security_level(&self) -> Result<u16> {
        Ok(self.cached()?.security_level)
    }

    /// Get the template library capacity, from cache
    pub fn storage_capacity(&self) -> Result<u16> {
        Ok(self.cached()?.lib_size)
    }

    /// Get the data packet length register, from cache
    pub fn packet_length(&self) -> Result<u16> {
        Ok(self.cached()?.packet_max_size)
    }

    /// Set the serial baud rate
    ///
    /// The device answers at the old rate and switches afterwards;
    /// reopening the port at the new rate is the caller's job.
    pub async fn set_baud_rate(&mut self, baud: BaudRate) -> Result<()> {
        self.set_sys_param(sysparam::BAUD_RATE, baud.code()).await
    }

    /// Set the matching security level
    pub async fn set_security_level(&mut self, level: SecurityLevel) -> Result<()> {
        self.set_sys_param(sysparam::SECURITY_LEVEL, level.code()).await
    }

    /// Set the data packet length
    pub async fn set_packet_length(&mut self, length: PacketLength) -> Result<()> {
        self.set_sys_param(sysparam::PACKET_LENGTH, length.code()).await
    }

    /// Get the next free template slot number
    pub async fn next_template_number(&mut self) -> Result<u16> {
        self.ensure_connected()?;

        let reply = self.dispatcher.call(Instruction::TemplateCount, &[]).await?;

        if !reply.ok() {
            return Err(Error::DeviceFault("reading the valid template number"));
        }

        if reply.payload.len() < 3 {
            return Err(r309_core::Error::MalformedResponse("short template number reply").into());
        }

        Ok(u16::from_be_bytes([reply.payload[1], reply.payload[2]]))
    }

    /// Try to capture a finger image
    ///
    /// An empty sensor window is an expected polling state and comes back
    /// as [`ScanOutcome::NoFinger`], not as an error.
    pub async fn scan_finger(&mut self) -> Result<ScanOutcome> {
        self.ensure_connected()?;

        let reply = self.dispatcher.call(Instruction::GenImage, &[]).await?;

        if !reply.is_ack() {
            return Err(Error::UnexpectedResponse {
                code: reply.code.into(),
            });
        }

        match reply.code {
            ConfirmationCode::Ok => Ok(ScanOutcome::FingerDetected),
            ConfirmationCode::NoFinger => Ok(ScanOutcome::NoFinger),
            ConfirmationCode::ImageFail => Ok(ScanOutcome::TemplateUnreadable),
            other => Err(Error::UnexpectedResponse { code: other.into() }),
        }
    }

    /// Identify the captured finger against the template library
    ///
    /// Converts the image buffer into character buffer 1 and searches the
    /// whole library. Call [`Device::scan_finger`] first.
    pub async fn identify(&mut self) -> Result<IdentifyOutcome> {
        self.identify_with(char_buffer::BUFFER_1).await
    }

    /// Identify using a specific character buffer (1 or 2)
    ///
    /// The search covers pages `0..lib_size` with the capacity taken from
    /// the parameter cache; a capacity changed out of band needs a
    /// [`Device::refresh_sys_params`] first. The cache is never written
    /// here.
    pub async fn identify_with(&mut self, buffer: u8) -> Result<IdentifyOutcome> {
        let lib_size = self.cached()?.lib_size;

        let reply = self
            .dispatcher
            .call(Instruction::ImageToTemplate, &[buffer])
            .await?;

        if !reply.is_ack() {
            return Err(Error::UnexpectedResponse {
                code: reply.code.into(),
            });
        }

        if !reply.code.is_ok() {
            // Conversion failures end the workflow; the code tells the
            // caller whether another scan is worth trying.
            debug!("Template conversion answered {}", reply.code);
            return Ok(IdentifyOutcome::Rejected { code: reply.code });
        }

        let mut args = BytesMut::with_capacity(9);
        args.put_u8(buffer);
        args.put_u32(0); // first page
        args.put_u32(lib_size as u32); // page count

        let reply = self.dispatcher.call(Instruction::Search, &args).await?;

        if !reply.is_ack() {
            return Err(Error::UnexpectedResponse {
                code: reply.code.into(),
            });
        }

        match reply.code {
            ConfirmationCode::Ok => {
                if reply.payload.len() < 5 {
                    return Err(
                        r309_core::Error::MalformedResponse("short search reply").into()
                    );
                }

                let page = u16::from_be_bytes([reply.payload[1], reply.payload[2]]);
                let score = u16::from_be_bytes([reply.payload[3], reply.payload[4]]);

                debug!("Search matched page {} with score {}", page, score);
                Ok(IdentifyOutcome::Matched { page, score })
            }
            ConfirmationCode::NoMatch
            | ConfirmationCode::ImageDisorder
            | ConfirmationCode::ImageTooSmall
            | ConfirmationCode::InvalidImage => {
                debug!("Search answered {}", reply.code);
                Ok(IdentifyOutcome::NotMatched)
            }
            other => Err(Error::UnexpectedResponse { code: other.into() }),
        }
    }

    // Helper methods

    fn ensure_connected(&self) -> Result<()> {
        if !self.is_connected() {
            return Err(Error::NotConnected);
        }
        Ok(())
    }

    fn cached(&self) -> Result<&SysParams> {
        self.sys_params.as_ref().ok_or(Error::NotConnected)
    }

    async fn set_sys_param(&mut self, param: u8, value: u8) -> Result<()> {
        self.ensure_connected()?;

        let reply = self
            .dispatcher
            .call(Instruction::SetSysParam, &[param, value])
            .await?;

        if !reply.ok() {
            return Err(Error::DeviceRejected {
                param,
                code: reply.code.into(),
            });
        }

        // The device is authoritative for the new register contents
        self.refresh_sys_params().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedTransport;
    use r309_core::{Packet, PacketKind};

    const REGS: [u8; 16] = [
        0x00, 0x00, // status
        0x00, 0x01, // sys_id
        0x27, 0x10, // lib_size = 10000
        0x00, 0x03, // security_level
        0xFF, 0xFF, 0xFF, 0xFF, // device_addr
        0x00, 0x80, // packet_max_size
        0x00, 0x06, // baud code
    ];

    fn ack(payload: &[u8]) -> Vec<u8> {
        Packet::with_payload(PacketKind::Ack, DEFAULT_ADDRESS, payload.to_vec())
            .unwrap()
            .encode()
            .to_vec()
    }

    fn sys_params_ack() -> Vec<u8> {
        let mut payload = vec![0x00];
        payload.extend_from_slice(&REGS);
        ack(&payload)
    }

    /// Scripted transport preloaded with a successful connect exchange
    fn connectable() -> ScriptedTransport {
        let mut transport = ScriptedTransport::new();
        transport.push_read(ack(&[0x00])); // VfyPwd
        transport.push_read(sys_params_ack()); // ReadSysPara
        transport
    }

    fn sent_opcodes(log: &std::sync::Arc<std::sync::Mutex<Vec<Vec<u8>>>>) -> Vec<u8> {
        log.lock()
            .unwrap()
            .iter()
            .map(|frame| Packet::decode(frame).unwrap().unwrap().0.payload[0])
            .collect()
    }

    #[test]
    fn test_device_create() {
        let device = Device::new("/dev/ttyUSB0", 57600);
        assert!(!device.is_connected());
        assert!(device.sys_params().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_caches_sys_params() {
        let transport = connectable();
        let log = transport.write_log();

        let mut device = Device::with_transport(Box::new(transport));
        device.connect().await.unwrap();

        assert!(device.is_connected());
        assert_eq!(device.security_level().unwrap(), 3);
        assert_eq!(device.storage_capacity().unwrap(), 10000);
        assert_eq!(device.packet_length().unwrap(), 0x0080);

        // VfyPwd then ReadSysPara, nothing else
        assert_eq!(sent_opcodes(&log), vec![0x13, 0x0F]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wrong_password_aborts_connect() {
        let mut transport = ScriptedTransport::new();
        transport.push_read(ack(&[0x13])); // wrong password
        let log = transport.write_log();

        let mut device = Device::with_transport(Box::new(transport));
        let result = device.connect().await;

        assert!(matches!(result, Err(Error::AuthenticationFailed)));
        assert!(!device.is_connected());

        // The parameter read must never have been issued
        assert_eq!(sent_opcodes(&log), vec![0x13]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_accessors_require_connect() {
        let device = Device::with_transport(Box::new(ScriptedTransport::new()));

        assert!(matches!(device.security_level(), Err(Error::NotConnected)));
        assert!(matches!(device.storage_capacity(), Err(Error::NotConnected)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_scan_finger_code_mapping() {
        for (code, expected) in [
            (0x00, ScanOutcome::FingerDetected),
            (0x02, ScanOutcome::NoFinger),
            (0x03, ScanOutcome::TemplateUnreadable),
        ] {
            let mut transport = connectable();
            transport.push_read(ack(&[code]));

            let mut device = Device::with_transport(Box::new(transport));
            device.connect().await.unwrap();

            assert_eq!(device.scan_finger().await.unwrap(), expected);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_scan_finger_unknown_code() {
        let mut transport = connectable();
        transport.push_read(ack(&[0x42]));

        let mut device = Device::with_transport(Box::new(transport));
        device.connect().await.unwrap();

        assert!(matches!(
            device.scan_finger().await,
            Err(Error::UnexpectedResponse { code: 0x42 })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_identify_match() {
        let mut transport = connectable();
        transport.push_read(ack(&[0x00])); // Img2Tz
        transport.push_read(ack(&[0x00, 0x00, 0x05, 0x01, 0x2C])); // Search
        let log = transport.write_log();

        let mut device = Device::with_transport(Box::new(transport));
        device.connect().await.unwrap();

        let outcome = device.identify().await.unwrap();
        assert_eq!(outcome, IdentifyOutcome::Matched { page: 5, score: 300 });

        // Search arguments: buffer 1, page 0, count = cached lib_size
        let writes = log.lock().unwrap();
        let (search, _) = Packet::decode(writes.last().unwrap()).unwrap().unwrap();
        assert_eq!(
            &search.payload[5..],
            &[0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x27, 0x10]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_identify_no_match_is_not_an_error() {
        let mut transport = connectable();
        transport.push_read(ack(&[0x00])); // Img2Tz
        transport.push_read(ack(&[0x09])); // Search: no match
        let mut device = Device::with_transport(Box::new(transport));
        device.connect().await.unwrap();

        let outcome = device.identify().await.unwrap();
        assert_eq!(outcome, IdentifyOutcome::NotMatched);
    }

    #[tokio::test(start_paused = true)]
    async fn test_identify_conversion_rejection_short_circuits() {
        let mut transport = connectable();
        transport.push_read(ack(&[0x07])); // Img2Tz: image too small
        let log = transport.write_log();

        let mut device = Device::with_transport(Box::new(transport));
        device.connect().await.unwrap();

        let outcome = device.identify().await.unwrap();
        assert_eq!(
            outcome,
            IdentifyOutcome::Rejected {
                code: ConfirmationCode::ImageTooSmall
            }
        );

        // No Search command after the rejected conversion
        assert_eq!(sent_opcodes(&log), vec![0x13, 0x0F, 0x02]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_security_level_refreshes_cache() {
        let mut transport = connectable();
        transport.push_read(ack(&[0x00])); // SetSysPara

        let mut updated = vec![0x00];
        let mut regs = REGS;
        regs[7] = 0x05;
        updated.extend_from_slice(&regs);
        transport.push_read(ack(&updated)); // ReadSysPara after the write

        let mut device = Device::with_transport(Box::new(transport));
        device.connect().await.unwrap();

        device
            .set_security_level(SecurityLevel::Level5)
            .await
            .unwrap();

        assert_eq!(device.security_level().unwrap(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_sys_param_rejection() {
        let mut transport = connectable();
        transport.push_read(ack(&[0x1A])); // invalid register

        let mut device = Device::with_transport(Box::new(transport));
        device.connect().await.unwrap();

        let result = device.set_packet_length(PacketLength::Bytes256).await;
        assert!(matches!(
            result,
            Err(Error::DeviceRejected {
                param: 0x06,
                code: 0x1A
            })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_next_template_number() {
        let mut transport = connectable();
        transport.push_read(ack(&[0x00, 0x00, 0x2A]));

        let mut device = Device::with_transport(Box::new(transport));
        device.connect().await.unwrap();

        assert_eq!(device.next_template_number().await.unwrap(), 42);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_clears_cache() {
        let transport = connectable();

        let mut device = Device::with_transport(Box::new(transport));
        device.connect().await.unwrap();
        device.disconnect().await.unwrap();

        assert!(!device.is_connected());
        assert!(device.sys_params().is_none());
    }
}
