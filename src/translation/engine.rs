//! Translation engine: one request in, one decision out.
//!
//! # Responsibilities
//! - Answer content-type lookups, widget lookups and error documents
//! - Reject path traversal before any route sees the URI
//! - Add the session/host preamble and run the route table
//! - Degrade every business-logic failure to an error status
//!
//! # Data Flow
//! ```text
//! TranslateRequest
//!     → content_type_lookup?  → CONTENT_TYPE from the suffix table
//!     → widget_type?          → Dispatch::Pending(registry lookup)
//!     → error_document?       → PATH <document_root>/<status>.html
//!     → traversal guard       → STATUS 400
//!     → /site/ rewrite + preamble (USER, SESSION, UNTRUSTED, SITE, VARY)
//!     → Router::dispatch      → TranslateResponse
//! ```
//!
//! # Design Decisions
//! - The engine is immutable and shared between connections (`Arc<Engine>`)
//! - Collaborators (widgets, stat, credentials) are trait objects injected
//!   at construction so tests can replace them
//! - Only widget lookups suspend; everything else answers synchronously

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use futures_util::future::{BoxFuture, FutureExt};

use crate::config::TranslationConfig;
use crate::observability::metrics;
use crate::protocol::Command;
use crate::providers::{
    CredentialCheck, DirectoryWidgetRegistry, FileStat, LocalFileStat, StaticCredentials,
    WidgetRegistry,
};
use crate::routing::handlers::join;
use crate::routing::{RouteContext, Router};
use crate::translation::request::TranslateRequest;
use crate::translation::response::TranslateResponse;

/// Result of dispatching one request.
pub enum Dispatch {
    /// The answer is known now.
    Ready(TranslateResponse),
    /// The answer needs a collaborator round trip; the future never fails.
    Pending(BoxFuture<'static, TranslateResponse>),
}

impl fmt::Debug for Dispatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dispatch::Ready(response) => f.debug_tuple("Ready").field(response).finish(),
            Dispatch::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

/// The routing decision engine.
#[derive(Debug)]
pub struct Engine {
    config: Arc<TranslationConfig>,
    router: Router,
    widgets: Arc<dyn WidgetRegistry>,
    stat: Arc<dyn FileStat>,
    credentials: Arc<dyn CredentialCheck>,
}

impl Engine {
    /// Engine with the default route table and filesystem-backed collaborators.
    pub fn new(config: TranslationConfig) -> Self {
        Self {
            widgets: Arc::new(DirectoryWidgetRegistry::new(config.paths.widgets.as_str())),
            stat: Arc::new(LocalFileStat),
            credentials: Arc::new(StaticCredentials::from_config(&config.auth)),
            router: Router::default(),
            config: Arc::new(config),
        }
    }

    pub fn with_widgets(mut self, widgets: Arc<dyn WidgetRegistry>) -> Self {
        self.widgets = widgets;
        self
    }

    pub fn with_stat(mut self, stat: Arc<dyn FileStat>) -> Self {
        self.stat = stat;
        self
    }

    pub fn with_credentials(mut self, credentials: Arc<dyn CredentialCheck>) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_router(mut self, router: Router) -> Self {
        self.router = router;
        self
    }

    pub fn config(&self) -> &TranslationConfig {
        &self.config
    }

    /// Decide how the proxy should handle `request`.
    pub fn dispatch(&self, request: &TranslateRequest) -> Dispatch {
        let start = Instant::now();

        if let Some(payload) = &request.content_type_lookup {
            let response = self.content_type_lookup(request.suffix.as_deref());
            tracing::debug!(
                payload = %String::from_utf8_lossy(payload),
                suffix = ?request.suffix,
                "Content type lookup"
            );
            return self.ready("content_type_lookup", response, start);
        }

        if let Some(widget_type) = &request.widget_type {
            return Dispatch::Pending(self.widget_lookup(widget_type.clone()));
        }

        if request.error_document {
            return self.ready("error_document", self.error_document(request), start);
        }

        let (route, response) = self.translate(request);
        self.ready(route, response, start)
    }

    fn ready(&self, route: &'static str, response: TranslateResponse, start: Instant) -> Dispatch {
        metrics::record_request(route, response.status);
        metrics::record_dispatch_duration(start);
        Dispatch::Ready(response)
    }

    fn content_type_lookup(&self, suffix: Option<&str>) -> TranslateResponse {
        let mut response = TranslateResponse::new();
        response.content_type = suffix
            .and_then(|suffix| self.config.content_types.lookup(suffix))
            .map(str::to_string);
        response
    }

    fn widget_lookup(&self, widget_type: String) -> BoxFuture<'static, TranslateResponse> {
        let registry = Arc::clone(&self.widgets);

        async move {
            let start = Instant::now();
            let response = match registry.lookup(&widget_type).await {
                Ok(Some(class)) => class.to_response(),
                Ok(None) => {
                    tracing::warn!(widget_type = %widget_type, "No such widget type");
                    failure()
                }
                Err(e) => {
                    tracing::error!(widget_type = %widget_type, error = %e, "Widget lookup failed");
                    failure()
                }
            };
            metrics::record_request("widget", response.status);
            metrics::record_dispatch_duration(start);
            response
        }
        .boxed()
    }

    fn error_document(&self, request: &TranslateRequest) -> TranslateResponse {
        let status = request.status.unwrap_or(500);
        tracing::info!(
            uri = ?request.uri,
            payload = ?request.error_document_payload,
            status,
            "Error document"
        );

        let mut response = TranslateResponse::unversioned();
        response.path(join(
            &self.config.paths.document_root,
            &format!("{}.html", status),
        ));
        response.content_type = Some("text/html".to_string());
        response
    }

    fn translate(&self, request: &TranslateRequest) -> (&'static str, TranslateResponse) {
        let Some(uri) = request.uri.as_deref() else {
            let mut response = TranslateResponse::new();
            apply_preamble(request, None, &mut response);
            return ("none", response);
        };

        if is_traversal(uri) {
            tracing::warn!(uri = %uri, "Rejecting path traversal");
            return ("traversal", TranslateResponse::with_status(400));
        }

        let raw_uri = request.raw_uri.as_deref().unwrap_or(uri);
        let (site, uri, raw_uri) = strip_site(uri, raw_uri);

        let ctx = RouteContext {
            request,
            uri,
            raw_uri,
            config: &self.config,
            stat: self.stat.as_ref(),
            credentials: self.credentials.as_ref(),
        };

        let mut response = TranslateResponse::new();
        match self.router.dispatch(&ctx, &mut response) {
            Ok(route) if response.is_negotiation() => {
                metrics::record_negotiation(route);
                (route, response)
            }
            Ok(route) => {
                apply_preamble(request, site, &mut response);
                (route, response)
            }
            Err(e) => {
                let status = e.status();
                if status >= 500 {
                    tracing::error!(uri = %uri, error = %e, "Route failed");
                } else {
                    tracing::warn!(uri = %uri, error = %e, "Rejected negotiation reply");
                }
                ("error", TranslateResponse::with_status(status))
            }
        }
    }
}

fn failure() -> TranslateResponse {
    let mut response = TranslateResponse::unversioned();
    response.status(500);
    response
}

/// `/./`, `/../`, `//`, NUL, or a trailing `/.` or `/..`.
pub fn is_traversal(uri: &str) -> bool {
    uri.contains("/./")
        || uri.contains("/../")
        || uri.contains("//")
        || uri.contains('\0')
        || uri.ends_with("/.")
        || uri.ends_with("/..")
}

/// Split `/site/<name>/rest` into the site name and `/rest` in both forms.
fn strip_site<'a>(uri: &'a str, raw_uri: &'a str) -> (Option<&'a str>, &'a str, &'a str) {
    let Some((name, tail)) = uri
        .strip_prefix("/site/")
        .and_then(|rest| rest.find('/').map(|i| rest.split_at(i)))
    else {
        return (None, uri, raw_uri);
    };

    let raw_tail = raw_uri
        .strip_prefix("/site/")
        .and_then(|rest| rest.find('/').map(|i| &rest[i..]))
        .unwrap_or(tail);
    (Some(name), tail, raw_tail)
}

/// Session and host attributes every routed answer carries.
fn apply_preamble(request: &TranslateRequest, site: Option<&str>, response: &mut TranslateResponse) {
    // An empty PARAM logs out.
    let (user, session) = match (&request.param, &request.session) {
        (Some(param), _) => (Some(param.clone()), Some(param.clone())),
        (None, Some(session)) => (Some(session.clone()), None),
        (None, None) => (None, None),
    };
    response.user = user;
    response.session = session;

    if let Some(host) = request.host.as_ref().filter(|host| host.contains("untrusted")) {
        response.untrusted = Some(host.clone());
    }
    response.site = site.map(str::to_string);

    let routed = std::mem::take(&mut response.vary);
    response.vary(&[Command::Host, Command::Param]).vary(&routed);
}
