//! A single translation packet.

use bytes::{BufMut, Bytes, BytesMut};

use crate::protocol::codec::FramingError;
use crate::protocol::command::Command;

/// One `(command, payload)` unit of the translation stream.
///
/// The command is kept as its raw wire code so that packets carrying
/// commands unknown to this server survive decoding untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub command: u16,
    pub payload: Bytes,
}

impl Packet {
    /// Create a packet with a payload.
    pub fn new(command: Command, payload: impl Into<Bytes>) -> Self {
        Self {
            command: command.code(),
            payload: payload.into(),
        }
    }

    /// Create a flag packet without payload.
    pub fn empty(command: Command) -> Self {
        Self {
            command: command.code(),
            payload: Bytes::new(),
        }
    }

    /// Create a packet from a raw wire code.
    pub fn raw(command: u16, payload: impl Into<Bytes>) -> Self {
        Self {
            command,
            payload: payload.into(),
        }
    }

    /// Packet carrying a string payload.
    pub fn string(command: Command, value: &str) -> Self {
        Self::new(command, Bytes::copy_from_slice(value.as_bytes()))
    }

    /// Packet carrying a little-endian `u16`.
    pub fn u16(command: Command, value: u16) -> Self {
        Self::new(command, Bytes::copy_from_slice(&value.to_le_bytes()))
    }

    /// Packet carrying a little-endian `u32`.
    pub fn u32(command: Command, value: u32) -> Self {
        Self::new(command, Bytes::copy_from_slice(&value.to_le_bytes()))
    }

    /// Packet carrying an array of command codes (VARY, INVALIDATE, WANT).
    pub fn commands(command: Command, values: &[Command]) -> Self {
        let mut buf = BytesMut::with_capacity(values.len() * 2);
        for value in values {
            buf.put_u16_le(value.code());
        }
        Self::new(command, buf.freeze())
    }

    /// The known command, if any.
    pub fn command(&self) -> Option<Command> {
        Command::from_u16(self.command)
    }

    /// Payload decoded as text. Invalid UTF-8 is replaced, never rejected.
    pub fn payload_string(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }

    /// Payload decoded as a little-endian `u16`.
    pub fn payload_u16(&self) -> Result<u16, FramingError> {
        let bytes = <[u8; 2]>::try_from(&self.payload[..])
            .map_err(|_| self.malformed("expected 2 bytes"))?;
        Ok(u16::from_le_bytes(bytes))
    }

    /// Payload decoded as a little-endian `u32`.
    pub fn payload_u32(&self) -> Result<u32, FramingError> {
        let bytes = <[u8; 4]>::try_from(&self.payload[..])
            .map_err(|_| self.malformed("expected 4 bytes"))?;
        Ok(u32::from_le_bytes(bytes))
    }

    /// Payload decoded as an array of command codes.
    ///
    /// Codes this server does not know are skipped.
    pub fn payload_commands(&self) -> Result<Vec<Command>, FramingError> {
        if self.payload.len() % 2 != 0 {
            return Err(self.malformed("odd length for command array"));
        }
        Ok(self
            .payload
            .chunks_exact(2)
            .filter_map(|pair| Command::from_u16(u16::from_le_bytes([pair[0], pair[1]])))
            .collect())
    }

    fn malformed(&self, reason: &'static str) -> FramingError {
        FramingError::MalformedPayload {
            command: self.command,
            reason,
        }
    }
}

impl std::fmt::Display for Packet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.command() {
            Some(command) => write!(f, "{}({} bytes)", command, self.payload.len()),
            None => write!(f, "#{}({} bytes)", self.command, self.payload.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_payloads() {
        let status = Packet::u16(Command::Status, 404);
        assert_eq!(&status.payload[..], &[0x94, 0x01]);
        assert_eq!(status.payload_u16().unwrap(), 404);

        let max_age = Packet::u32(Command::MaxAge, 20);
        assert_eq!(max_age.payload_u32().unwrap(), 20);
        assert!(max_age.payload_u16().is_err());
    }

    #[test]
    fn command_arrays() {
        let vary = Packet::commands(Command::Vary, &[Command::Host, Command::Param]);
        assert_eq!(&vary.payload[..], &[3, 0, 13, 0]);
        assert_eq!(
            vary.payload_commands().unwrap(),
            vec![Command::Host, Command::Param]
        );
    }

    #[test]
    fn unknown_codes_in_arrays_are_skipped() {
        let want = Packet::raw(Command::Want.code(), vec![35u8, 0, 0xff, 0xff]);
        assert_eq!(want.payload_commands().unwrap(), vec![Command::UserAgent]);
    }

    #[test]
    fn odd_command_array_is_malformed() {
        let want = Packet::raw(Command::Want.code(), vec![35u8, 0, 1]);
        assert!(matches!(
            want.payload_commands(),
            Err(FramingError::MalformedPayload { command: 115, .. })
        ));
    }
}
