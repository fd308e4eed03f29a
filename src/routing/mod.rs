//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! TranslateRequest (uri, raw_uri, negotiation echoes)
//!     → router.rs (first route whose predicate matches)
//!     → matcher.rs (prefix / exact / one-of / catch-all)
//!     → handlers/ (fill in the TranslateResponse)
//!     → Return: route name, or RouteError mapped to a status
//!
//! Table construction (at startup):
//!     table.rs default_routes()
//!     → Freeze as immutable Router
//! ```
//!
//! # Design Decisions
//! - Routes built at startup, immutable at runtime
//! - No regex in predicates (prefix and exact matching only)
//! - Deterministic: same request always matches the same route
//! - First match wins (table order is priority)

pub mod handlers;
pub mod matcher;
pub mod router;
pub mod table;

pub use matcher::{
    CatchAllMatcher, ExactMatcher, Matcher, OneOfMatcher, PrefixMatcher, RouteTarget, UriForm,
};
pub use router::{Handler, Route, RouteContext, RouteError, Router};
pub use table::default_routes;
