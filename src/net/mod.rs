//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Unix or TCP connection
//!     → listener.rs (accept loop, connection limits)
//!     → connection.rs (packet loop, lifecycle tracking)
//!     → Hand off to the translation engine
//!
//! Connection States:
//!     Reading → Dispatching (→ Pending) → Writing → Reading ... → Closed
//! ```
//!
//! # Design Decisions
//! - Bounded accept queue prevents resource exhaustion
//! - Each connection tracked for graceful shutdown
//! - Transport is chosen by the address: a path means a Unix socket

pub mod connection;
pub mod listener;

pub use connection::{Connection, ConnectionGuard, ConnectionId, ConnectionTracker};
pub use listener::{ConnectionPermit, Incoming, ListenAddress, Listener, ListenerError};
