//! Multi-round negotiation helpers.
//!
//! # Responsibilities
//! - Ask the proxy for attributes a route depends on (`WANT`)
//! - Tell first rounds from second rounds carrying an echoed token
//! - Reject echoed tokens this server never handed out
//!
//! # Design Decisions
//! - Pure functions over the request: replaying a first-round request
//!   always produces the same follow-up question
//! - Tokens are compared as raw bytes

use bytes::Bytes;

use crate::protocol::Command;
use crate::routing::RouteError;
use crate::translation::request::TranslateRequest;
use crate::translation::response::TranslateResponse;

/// Whether the proxy supplied every attribute in `attrs`.
///
/// Missing attributes are added to `response.want`; the route must then
/// return without producing anything else.
pub fn require_want(
    request: &TranslateRequest,
    response: &mut TranslateResponse,
    attrs: &[Command],
) -> bool {
    let missing: Vec<Command> = attrs
        .iter()
        .copied()
        .filter(|attr| !request.wants(*attr))
        .collect();

    if missing.is_empty() {
        return true;
    }

    tracing::debug!(missing = ?missing, "Asking proxy for more attributes");
    response.want(&missing);
    false
}

/// Which round of a token-based negotiation a request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Round<'a> {
    /// No token echoed yet.
    First,
    /// The proxy echoed this token.
    Second(&'a [u8]),
}

/// Classify a request by its echoed token.
pub fn round(token: Option<&Bytes>) -> Round<'_> {
    match token {
        Some(token) => Round::Second(&token[..]),
        None => Round::First,
    }
}

/// Accept only the token this server handed out.
pub fn expect_echo(command: Command, provided: &[u8], expected: &[u8]) -> Result<(), RouteError> {
    if provided == expected {
        Ok(())
    } else {
        Err(RouteError::InvalidNegotiationReply {
            command,
            provided: String::from_utf8_lossy(provided).into_owned(),
        })
    }
}
