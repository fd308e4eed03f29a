//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Store the ordered route table
//! - Look up the first route whose predicate matches
//! - Run its handler against the response under construction
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) scan in table order; first match wins
//! - Explicit NoRouteMatched rather than silent default

use crate::config::TranslationConfig;
use crate::protocol::Command;
use crate::providers::{CredentialCheck, FileStat};
use crate::routing::matcher::{Matcher, RouteTarget};
use crate::translation::request::TranslateRequest;
use crate::translation::response::TranslateResponse;

/// Business-logic failures. Each one degrades to an error status.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    /// A second round echoed a token this server never hands out.
    #[error("unexpected {command} reply: {provided:?}")]
    InvalidNegotiationReply { command: Command, provided: String },

    /// A collaborator could not answer.
    #[error("{what} lookup failed: {reason}")]
    LookupFailure { what: String, reason: String },

    #[error("no route matched {0}")]
    NoRouteMatched(String),
}

impl RouteError {
    /// Status code sent to the proxy.
    pub fn status(&self) -> u16 {
        match self {
            RouteError::InvalidNegotiationReply { .. } => 400,
            RouteError::LookupFailure { .. } | RouteError::NoRouteMatched(_) => 500,
        }
    }
}

/// Everything a handler may look at.
#[derive(Debug, Clone, Copy)]
pub struct RouteContext<'a> {
    pub request: &'a TranslateRequest,
    /// Decoded URI after `/site/` rewriting.
    pub uri: &'a str,
    /// Raw URI after `/site/` rewriting.
    pub raw_uri: &'a str,
    pub config: &'a TranslationConfig,
    pub stat: &'a dyn FileStat,
    pub credentials: &'a dyn CredentialCheck,
}

impl<'a> RouteContext<'a> {
    pub fn target(&self) -> RouteTarget<'a> {
        RouteTarget::new(self.uri, self.raw_uri)
    }
}

/// Fills in a response for a matched request.
pub type Handler = fn(&RouteContext<'_>, &mut TranslateResponse) -> Result<(), RouteError>;

/// One `(name, predicate, handler)` table entry.
#[derive(Debug)]
pub struct Route {
    name: &'static str,
    matcher: Box<dyn Matcher>,
    handler: Handler,
}

impl Route {
    pub fn new(name: &'static str, matcher: impl Matcher + 'static, handler: Handler) -> Self {
        Self {
            name,
            matcher: Box::new(matcher),
            handler,
        }
    }

    /// Route identifier for logging and metrics.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// The ordered route table.
#[derive(Debug)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    pub fn new(routes: Vec<Route>) -> Self {
        Self { routes }
    }

    /// First route matching `target`.
    pub fn lookup(&self, target: &RouteTarget<'_>) -> Option<&Route> {
        self.routes.iter().find(|route| route.matcher.matches(target))
    }

    /// Run the first matching handler, returning the route name.
    pub fn dispatch(
        &self,
        ctx: &RouteContext<'_>,
        response: &mut TranslateResponse,
    ) -> Result<&'static str, RouteError> {
        let route = self
            .lookup(&ctx.target())
            .ok_or_else(|| RouteError::NoRouteMatched(ctx.uri.to_string()))?;

        tracing::debug!(route = route.name, uri = %ctx.uri, "Route matched");
        (route.handler)(ctx, response)?;
        Ok(route.name)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new(crate::routing::table::default_routes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{LocalFileStat, StaticCredentials};
    use crate::routing::matcher::{CatchAllMatcher, ExactMatcher, PrefixMatcher};

    fn first(_: &RouteContext<'_>, response: &mut TranslateResponse) -> Result<(), RouteError> {
        response.status(201);
        Ok(())
    }

    fn second(_: &RouteContext<'_>, response: &mut TranslateResponse) -> Result<(), RouteError> {
        response.status(202);
        Ok(())
    }

    fn failing(_: &RouteContext<'_>, _: &mut TranslateResponse) -> Result<(), RouteError> {
        Err(RouteError::LookupFailure {
            what: "stamp".to_string(),
            reason: "gone".to_string(),
        })
    }

    fn run(router: &Router, uri: &str) -> (Result<&'static str, RouteError>, TranslateResponse) {
        let request = TranslateRequest::default();
        let config = TranslationConfig::default();
        let ctx = RouteContext {
            request: &request,
            uri,
            raw_uri: uri,
            config: &config,
            stat: &LocalFileStat,
            credentials: &StaticCredentials::default(),
        };
        let mut response = TranslateResponse::new();
        let result = router.dispatch(&ctx, &mut response);
        (result, response)
    }

    #[test]
    fn first_match_wins() {
        let router = Router::new(vec![
            Route::new("exact", ExactMatcher::new("/a/b"), first),
            Route::new("prefix", PrefixMatcher::new("/a/"), second),
        ]);

        let (result, response) = run(&router, "/a/b");
        assert_eq!(result.unwrap(), "exact");
        assert_eq!(response.status, Some(201));

        let (result, response) = run(&router, "/a/c");
        assert_eq!(result.unwrap(), "prefix");
        assert_eq!(response.status, Some(202));
    }

    #[test]
    fn no_match_is_explicit() {
        let router = Router::new(vec![Route::new("a", PrefixMatcher::new("/a/"), first)]);
        let (result, _) = run(&router, "/b");
        let err = result.unwrap_err();
        assert!(matches!(err, RouteError::NoRouteMatched(ref uri) if uri == "/b"));
        assert_eq!(err.status(), 500);
    }

    #[test]
    fn handler_errors_propagate() {
        let router = Router::new(vec![Route::new("fail", CatchAllMatcher, failing)]);
        let (result, _) = run(&router, "/");
        assert_eq!(result.unwrap_err().status(), 500);
    }
}
