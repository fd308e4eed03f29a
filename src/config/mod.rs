//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → TranslationConfig (validated, immutable)
//!     → CLI overrides applied in main
//!     → shared via Arc with the engine and the listener
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Route table constants (paths, upstream URLs, credentials) live here,
//!   never as literals in the route handlers

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    AuthConfig, ContentTypes, ListenerConfig, LogFormat, ObservabilityConfig, PathsConfig,
    ProtocolConfig, TranslationConfig, UpstreamConfig,
};
pub use validation::{validate_config, ValidationError};
