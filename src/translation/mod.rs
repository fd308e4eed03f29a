//! Translation requests, decisions and their wire encoding.
//!
//! # Data Flow
//! ```text
//! Packets from one connection
//!     → request.rs (RequestAssembler: BEGIN ... END)
//!     → engine.rs (Dispatch::Ready or Dispatch::Pending)
//!     → negotiation.rs (WANT / token rounds, used by routes)
//!     → response.rs (TranslateResponse record)
//!     → encoder.rs (ordered packet sequence, BEGIN ... END)
//! ```
//!
//! # Design Decisions
//! - Request and response are plain records; all policy lives in routing
//! - The encoder owns packet order, never the handlers

pub mod encoder;
pub mod engine;
pub mod negotiation;
pub mod request;
pub mod response;

pub use encoder::encode_response;
pub use engine::{Dispatch, Engine};
pub use request::{AssemblerState, RequestAssembler, TranslateRequest};
pub use response::{
    CgiAddress, FileAddress, ForwardMode, HeaderForward, HeaderGroup, HttpAddress, LhttpAddress,
    NfsAddress, ResourceAddress, TranslateResponse,
};
