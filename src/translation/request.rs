//! Translation requests and their per-connection assembly.
//!
//! # Responsibilities
//! - Hold every attribute the proxy can supply for one routing question
//! - Build a request from the packet stream (`BEGIN` ... `END`)
//! - Recover from a restarted request instead of failing the connection
//!
//! # Design Decisions
//! - Every attribute is an `Option`: absent and empty are different things
//! - Unknown packets inside a request are skipped for forward compatibility
//! - Opaque tokens (`CHECK`, `WANT_FULL_URI`, ...) stay as raw bytes

use bytes::Bytes;
use percent_encoding::percent_decode_str;

use crate::protocol::{Command, FramingError, Packet};

/// One fully assembled routing question.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslateRequest {
    /// Protocol version announced in the `BEGIN` payload.
    pub protocol_version: Option<u8>,
    /// URI exactly as received.
    pub raw_uri: Option<String>,
    /// Percent-decoded URI.
    pub uri: Option<String>,
    pub host: Option<String>,
    pub session: Option<String>,
    pub param: Option<String>,
    pub authorization: Option<String>,
    pub user_agent: Option<String>,
    pub ua_class: Option<String>,
    pub accept_language: Option<String>,
    pub remote_host: Option<String>,
    pub query_string: Option<String>,
    pub content_type_lookup: Option<Bytes>,
    pub suffix: Option<String>,
    pub widget_type: Option<String>,
    pub error_document: bool,
    pub error_document_payload: Option<Bytes>,
    pub status: Option<u16>,
    /// Revalidation token echoed from an earlier `CHECK` answer.
    pub check: Option<Bytes>,
    /// Token echoed from an earlier `WANT_FULL_URI` answer.
    pub want_full_uri: Option<Bytes>,
    /// Attributes the proxy supplied because an earlier answer asked for them.
    pub want: Vec<Command>,
    pub file_not_found: Option<Bytes>,
    pub directory_index: Option<Bytes>,
}

impl TranslateRequest {
    /// Set the URI, keeping the raw form and a percent-decoded copy.
    pub fn set_uri(&mut self, raw: impl Into<String>) {
        let raw = raw.into();
        self.uri = Some(decode_uri(&raw));
        self.raw_uri = Some(raw);
    }

    /// Whether the proxy declared that it supplies `command`.
    pub fn wants(&self, command: Command) -> bool {
        self.want.contains(&command)
    }

    /// Apply one attribute packet.
    ///
    /// Returns `Ok(false)` for packets that carry no request attribute.
    fn apply(&mut self, packet: &Packet) -> Result<bool, FramingError> {
        let Some(command) = packet.command() else {
            return Ok(false);
        };

        match command {
            Command::Uri => self.set_uri(packet.payload_string()),
            Command::Host => self.host = Some(packet.payload_string()),
            Command::Session => self.session = Some(packet.payload_string()),
            Command::Param => self.param = Some(packet.payload_string()),
            Command::Authorization => self.authorization = Some(packet.payload_string()),
            Command::UserAgent => self.user_agent = Some(packet.payload_string()),
            Command::UaClass => self.ua_class = Some(packet.payload_string()),
            Command::Language => self.accept_language = Some(packet.payload_string()),
            Command::RemoteHost => self.remote_host = Some(packet.payload_string()),
            Command::QueryString => self.query_string = Some(packet.payload_string()),
            Command::ContentTypeLookup => self.content_type_lookup = Some(packet.payload.clone()),
            Command::Suffix => self.suffix = Some(packet.payload_string()),
            Command::WidgetType => self.widget_type = Some(packet.payload_string()),
            Command::ErrorDocument => {
                self.error_document = true;
                self.error_document_payload = Some(packet.payload.clone());
            }
            Command::Status => self.status = Some(packet.payload_u16()?),
            Command::Check => self.check = Some(packet.payload.clone()),
            Command::WantFullUri => self.want_full_uri = Some(packet.payload.clone()),
            Command::Want => self.want = packet.payload_commands()?,
            Command::FileNotFound => self.file_not_found = Some(packet.payload.clone()),
            Command::DirectoryIndex => self.directory_index = Some(packet.payload.clone()),
            _ => return Ok(false),
        }

        Ok(true)
    }
}

/// Percent-decode a request URI. Invalid UTF-8 sequences are replaced.
pub fn decode_uri(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

/// Observable assembler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblerState {
    /// No request in flight.
    Idle,
    /// `BEGIN` seen, waiting for `END`.
    Accumulating,
}

/// Builds [`TranslateRequest`]s from the packets of one connection.
///
/// A completed request is handed out by [`RequestAssembler::push`], which
/// leaves the assembler `Idle` again.
#[derive(Debug, Default)]
pub struct RequestAssembler {
    current: Option<TranslateRequest>,
}

impl RequestAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> AssemblerState {
        if self.current.is_some() {
            AssemblerState::Accumulating
        } else {
            AssemblerState::Idle
        }
    }

    /// Feed one packet.
    ///
    /// Returns the finished request once `END` arrives. Only a payload that
    /// cannot be parsed is an error; it means the stream is corrupt.
    pub fn push(&mut self, packet: Packet) -> Result<Option<TranslateRequest>, FramingError> {
        match packet.command() {
            Some(Command::Begin) => {
                if self.current.is_some() {
                    tracing::warn!("BEGIN while a request is in flight, discarding partial request");
                }

                self.current = Some(TranslateRequest {
                    protocol_version: packet.payload.first().copied(),
                    ..Default::default()
                });
                Ok(None)
            }
            Some(Command::End) => match self.current.take() {
                Some(request) => Ok(Some(request)),
                None => {
                    tracing::debug!("END without request, ignoring");
                    Ok(None)
                }
            },
            _ => {
                let Some(request) = self.current.as_mut() else {
                    tracing::debug!(packet = %packet, "Invalid command without request");
                    return Ok(None);
                };

                if !request.apply(&packet)? {
                    tracing::trace!(packet = %packet, "Ignoring packet");
                }
                Ok(None)
            }
        }
    }

    /// Drop any partial request.
    pub fn reset(&mut self) {
        self.current = None;
    }
}
