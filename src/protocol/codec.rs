//! Packet framing over a byte stream.
//!
//! # Responsibilities
//! - Split an arbitrary byte stream into packets
//! - Keep partial headers and payloads buffered until complete
//! - Serialize outgoing packets
//!
//! # Design Decisions
//! - Built on `tokio_util::codec` so the connection driver gets a
//!   `Stream`/`Sink` pair for free
//! - The decode buffer is the resumable state: nothing is consumed until a
//!   whole packet is available

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::protocol::packet::Packet;

/// Size of the packet header: `u16` length + `u16` command.
pub const HEADER_SIZE: usize = 4;

/// Errors that corrupt the packet stream.
///
/// Any of these terminates the connection.
#[derive(Debug, thiserror::Error)]
pub enum FramingError {
    /// A header announced a payload above the configured limit.
    #[error("packet payload of {length} bytes exceeds limit of {max} bytes")]
    Oversized { length: usize, max: usize },

    /// An outgoing payload does not fit the 16-bit length field.
    #[error("payload of {length} bytes cannot be encoded")]
    PayloadTooLarge { length: usize },

    /// A known command carried a payload that cannot be parsed.
    #[error("malformed payload for command {command}: {reason}")]
    MalformedPayload { command: u16, reason: &'static str },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Codec for translation packets.
#[derive(Debug, Clone, Copy)]
pub struct PacketCodec {
    max_payload: usize,
}

impl PacketCodec {
    /// Create a codec accepting payloads up to `max_payload` bytes.
    pub fn new(max_payload: usize) -> Self {
        Self {
            max_payload: max_payload.min(u16::MAX as usize),
        }
    }

    /// Configured payload limit.
    pub fn max_payload(&self) -> usize {
        self.max_payload
    }
}

impl Default for PacketCodec {
    fn default() -> Self {
        Self::new(u16::MAX as usize)
    }
}

impl Decoder for PacketCodec {
    type Item = Packet;
    type Error = FramingError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Packet>, FramingError> {
        if src.len() < HEADER_SIZE {
            src.reserve(HEADER_SIZE - src.len());
            return Ok(None);
        }

        let length = u16::from_le_bytes([src[0], src[1]]) as usize;
        let command = u16::from_le_bytes([src[2], src[3]]);

        if length > self.max_payload {
            return Err(FramingError::Oversized {
                length,
                max: self.max_payload,
            });
        }

        let total = HEADER_SIZE + length;
        if src.len() < total {
            src.reserve(total - src.len());
            return Ok(None);
        }

        src.advance(HEADER_SIZE);
        let payload = src.split_to(length).freeze();
        Ok(Some(Packet { command, payload }))
    }
}

impl Encoder<Packet> for PacketCodec {
    type Error = FramingError;

    fn encode(&mut self, packet: Packet, dst: &mut BytesMut) -> Result<(), FramingError> {
        let length = packet.payload.len();
        let length = u16::try_from(length).map_err(|_| FramingError::PayloadTooLarge { length })?;

        dst.reserve(HEADER_SIZE + packet.payload.len());
        dst.put_u16_le(length);
        dst.put_u16_le(packet.command);
        dst.extend_from_slice(&packet.payload);
        Ok(())
    }
}

/// Serialize a packet sequence into one contiguous buffer.
pub fn encode_all(packets: &[Packet]) -> Result<BytesMut, FramingError> {
    let mut codec = PacketCodec::default();
    let mut buf = BytesMut::new();
    for packet in packets {
        codec.encode(packet.clone(), &mut buf)?;
    }
    Ok(buf)
}
