//! Translation server for a beng-proxy style reverse proxy.
//!
//! The proxy asks one routing question per request over a packet protocol;
//! this crate decides where the request goes and how it is processed.

// Wire format
pub mod protocol;

// Decision engine
pub mod routing;
pub mod translation;

// Collaborators and configuration
pub mod config;
pub mod providers;

// Serving
pub mod net;
pub mod server;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::TranslationConfig;
pub use lifecycle::Shutdown;
pub use server::TranslationServer;
pub use translation::{Dispatch, Engine};
