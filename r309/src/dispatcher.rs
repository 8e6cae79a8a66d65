//! Command/acknowledgment round trips
//!
//! Every driver operation is one synchronous exchange: one command frame
//! out, one acknowledgment frame back. The protocol is half-duplex with a
//! single outstanding command, which this type enforces by owning the
//! transport exclusively.

use std::time::Duration;

use bytes::{BufMut, Bytes, BytesMut};
use r309_core::{ConfirmationCode, Instruction, Packet, PacketKind};
use r309_transport::Transport;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::reader::ResponseReader;

/// Decoded result of one command round trip
#[derive(Debug, Clone)]
pub struct CommandReply {
    /// Packet type of the reply frame
    pub kind: PacketKind,

    /// Confirmation code from the first payload byte
    pub code: ConfirmationCode,

    /// Full reply payload, confirmation code included
    pub payload: Bytes,
}

impl CommandReply {
    /// Check that the reply is an acknowledgment frame
    pub fn is_ack(&self) -> bool {
        self.kind == PacketKind::Ack
    }

    /// Check for an acknowledgment carrying the success code
    pub fn ok(&self) -> bool {
        self.is_ack() && self.code.is_ok()
    }
}

/// Builds command frames and collects their acknowledgments
pub(crate) struct CommandDispatcher {
    transport: Box<dyn Transport>,
    reader: ResponseReader,
    pub(crate) address: u32,
    pub(crate) password: u32,
    pub(crate) timeout: Duration,
}

impl CommandDispatcher {
    pub(crate) fn new(
        transport: Box<dyn Transport>,
        address: u32,
        password: u32,
        timeout: Duration,
    ) -> Self {
        Self {
            transport,
            reader: ResponseReader::new(),
            address,
            password,
            timeout,
        }
    }

    pub(crate) async fn open(&mut self) -> Result<()> {
        self.transport.connect().await?;
        Ok(())
    }

    pub(crate) async fn close(&mut self) -> Result<()> {
        self.transport.disconnect().await?;
        Ok(())
    }

    pub(crate) fn is_open(&self) -> bool {
        self.transport.is_connected()
    }

    pub(crate) fn endpoint(&self) -> String {
        self.transport.endpoint()
    }

    /// Execute one command round trip
    ///
    /// The command payload is `[opcode][password:4][args...]`, password in
    /// big-endian. The device's generic "error receiving packet" code is
    /// mapped to `DeviceCommError` here because it is a link-level fault,
    /// not an answer to the specific command.
    pub(crate) async fn call(
        &mut self,
        instruction: Instruction,
        args: &[u8],
    ) -> Result<CommandReply> {
        let mut payload = BytesMut::with_capacity(5 + args.len());
        payload.put_u8(instruction.into());
        payload.put_u32(self.password);
        payload.put_slice(args);

        let packet = Packet::with_payload(PacketKind::Command, self.address, payload.freeze())
            .map_err(Error::Protocol)?;

        debug!("Sending {}", instruction);
        self.transport.send(&packet.encode()).await?;

        let reply = self
            .reader
            .receive(self.transport.as_mut(), self.timeout)
            .await?;

        if reply.payload.is_empty() {
            return Err(r309_core::Error::MalformedResponse("empty acknowledgment payload").into());
        }

        let code = ConfirmationCode::from(reply.payload[0]);
        trace!("{} answered {}", instruction, code);

        if code == ConfirmationCode::PacketFault {
            return Err(Error::DeviceCommError);
        }

        Ok(CommandReply {
            kind: reply.kind,
            code,
            payload: reply.payload,
        })
    }
}
