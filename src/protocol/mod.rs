//! Translation protocol wire layer.
//!
//! # Data Flow
//! ```text
//! bytes from the proxy
//!     → codec.rs (4-byte header + payload, resumable)
//!     → packet.rs (command code + payload accessors)
//!     → command.rs (stable numeric command space)
//!     → Hand off to the request assembler
//! ```
//!
//! # Design Decisions
//! - Header is `u16 length` followed by `u16 command`, both little-endian
//! - Unknown command codes are carried as raw `u16`, never rejected here
//! - Only a corrupt stream fails: oversized headers and unparsable payloads

pub mod codec;
pub mod command;
pub mod packet;

pub use codec::{FramingError, PacketCodec, HEADER_SIZE};
pub use command::Command;
pub use packet::Packet;
