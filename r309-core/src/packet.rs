//! R30x protocol packet structure and encoding/decoding

use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;
use tracing::trace;

use crate::{
    checksum,
    constants::FRAME_HEADER,
    error::{Error, Result},
};

/// Packet type byte
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PacketKind {
    /// Command packet (host to device)
    Command = 0x01,

    /// Data packet (follow-up chunks of a transfer)
    Data = 0x02,

    /// Acknowledgment packet (all command replies)
    Ack = 0x07,

    /// Final data packet of a transfer
    End = 0x08,
}

impl From<PacketKind> for u8 {
    fn from(kind: PacketKind) -> u8 {
        kind as u8
    }
}

impl TryFrom<u8> for PacketKind {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0x01 => Ok(Self::Command),
            0x02 => Ok(Self::Data),
            0x07 => Ok(Self::Ack),
            0x08 => Ok(Self::End),
            other => Err(Error::UnknownPacketKind(other)),
        }
    }
}

impl fmt::Display for PacketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Command => "CMD",
            Self::Data => "DATA",
            Self::Ack => "ACK",
            Self::End => "END",
        };
        write!(f, "{}", name)
    }
}

/// R30x protocol packet
///
/// # Frame Structure
///
/// ```text
/// ┌──────────┬──────────┬────────┬──────────┬──────────┬──────────┐
/// │  Header  │ Address  │  Type  │  Length  │ Payload  │ Checksum │
/// │  2 bytes │  4 bytes │ 1 byte │  2 bytes │  N bytes │  2 bytes │
/// │  0xEF01  │ (BE u32) │        │ (BE u16) │          │ (BE u16) │
/// └──────────┴──────────┴────────┴──────────┴──────────┴──────────┘
/// ```
///
/// All multi-byte values are big-endian. The length field counts the
/// payload plus the two checksum bytes; the checksum covers the type byte,
/// both length bytes and the payload.
///
/// # Examples
///
/// ```
/// use r309_core::{Packet, PacketKind};
///
/// let packet = Packet::with_payload(PacketKind::Command, 0xFFFFFFFF, vec![0x01]).unwrap();
/// let encoded = packet.encode();
///
/// let (decoded, consumed) = Packet::decode(&encoded).unwrap().unwrap();
/// assert_eq!(decoded, packet);
/// assert_eq!(consumed, encoded.len());
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Packet {
    /// Packet type
    pub kind: PacketKind,

    /// Device address
    pub address: u32,

    /// Packet payload
    pub payload: Bytes,
}

impl Packet {
    /// Fixed bytes before the payload: header + address + type + length
    pub const PREFIX_SIZE: usize = 9;

    /// Checksum width
    pub const CHECKSUM_SIZE: usize = 2;

    /// Maximum payload size (length field is u16 and counts the checksum)
    pub const MAX_PAYLOAD_SIZE: usize = u16::MAX as usize - Self::CHECKSUM_SIZE;

    /// Create a new packet with empty payload
    pub fn new(kind: PacketKind, address: u32) -> Self {
        Self {
            kind,
            address,
            payload: Bytes::new(),
        }
    }

    /// Create a packet with payload
    ///
    /// # Errors
    ///
    /// Returns `PayloadTooLarge` when the payload would overflow the
    /// 16-bit length field (more than 65533 bytes).
    pub fn with_payload(
        kind: PacketKind,
        address: u32,
        payload: impl Into<Bytes>,
    ) -> Result<Self> {
        let payload = payload.into();

        if payload.len() > Self::MAX_PAYLOAD_SIZE {
            return Err(Error::PayloadTooLarge {
                size: payload.len(),
                max: Self::MAX_PAYLOAD_SIZE,
            });
        }

        Ok(Self {
            kind,
            address,
            payload,
        })
    }

    /// Calculate the wire checksum for this packet
    pub fn checksum(&self) -> u16 {
        checksum::calculate(self.kind.into(), &self.payload)
    }

    /// Encode packet to wire bytes
    pub fn encode(&self) -> BytesMut {
        let mut buf = BytesMut::with_capacity(self.size());

        buf.put_u16(FRAME_HEADER);
        buf.put_u32(self.address);
        buf.put_u8(self.kind.into());
        buf.put_u16((self.payload.len() + Self::CHECKSUM_SIZE) as u16);
        buf.put_slice(&self.payload);
        buf.put_u16(self.checksum());

        trace!(frame = hex::encode(&buf), "Encoded frame");

        buf
    }

    /// Try to decode one packet from the front of a byte buffer
    ///
    /// Returns `Ok(None)` while the buffer holds less than one complete
    /// frame — that is a request for more bytes, not a fault. On success
    /// returns the packet together with the number of bytes consumed, so
    /// the caller can drop exactly one frame and keep any trailing bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The buffer does not start with the 0xEF01 header
    /// - The checksum over the declared region does not match
    /// - The packet type byte is unknown
    pub fn decode(buf: &[u8]) -> Result<Option<(Packet, usize)>> {
        if buf.len() < Self::PREFIX_SIZE {
            return Ok(None);
        }

        let header = u16::from_be_bytes([buf[0], buf[1]]);
        if header != FRAME_HEADER {
            return Err(Error::BadHeader { found: header });
        }

        let address = u32::from_be_bytes([buf[2], buf[3], buf[4], buf[5]]);
        let kind_raw = buf[6];
        let length = u16::from_be_bytes([buf[7], buf[8]]) as usize;

        let total = Self::PREFIX_SIZE + length;
        if buf.len() < total {
            return Ok(None);
        }

        if length < Self::CHECKSUM_SIZE {
            return Err(Error::MalformedResponse("length field below checksum width"));
        }

        let payload = &buf[Self::PREFIX_SIZE..total - Self::CHECKSUM_SIZE];

        let expected = u16::from_be_bytes([buf[total - 2], buf[total - 1]]);
        let computed = checksum::calculate(kind_raw, payload);
        if computed != expected {
            return Err(Error::ChecksumMismatch { expected, computed });
        }

        let kind = PacketKind::try_from(kind_raw)?;

        trace!(frame = hex::encode(&buf[..total]), "Decoded frame");

        Ok(Some((
            Self {
                kind,
                address,
                payload: Bytes::copy_from_slice(payload),
            },
            total,
        )))
    }

    /// Get total wire size of this packet
    pub fn size(&self) -> usize {
        Self::PREFIX_SIZE + self.payload.len() + Self::CHECKSUM_SIZE
    }
}

impl fmt::Debug for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Packet")
            .field("kind", &self.kind)
            .field("address", &format!("0x{:08X}", self.address))
            .field("checksum", &format!("0x{:04X}", self.checksum()))
            .field("payload", &hex::encode(&self.payload))
            .finish()
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Packet[{}](addr=0x{:08X}, len={})",
            self.kind,
            self.address,
            self.payload.len()
        )
    }
}
