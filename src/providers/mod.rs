//! Collaborators injected into the engine.
//!
//! # Data Flow
//! ```text
//! Engine::dispatch
//!     → widget.rs      (WIDGET_TYPE requests, async, off the dispatch path)
//!     → stat.rs        (COMA config readability, VALIDATE_MTIME)
//!     → credentials.rs (Basic auth below /auth/)
//! ```
//!
//! # Design Decisions
//! - Each collaborator is a trait object so tests substitute fakes
//! - Implementations read configuration once at construction

pub mod credentials;
pub mod stat;
pub mod widget;

pub use credentials::{authenticate, parse_basic, CredentialCheck, StaticCredentials};
pub use stat::{FileStat, LocalFileStat};
pub use widget::{DirectoryWidgetRegistry, WidgetClass, WidgetError, WidgetRegistry};
