//! Static files, jails and session/caching variations of them.

use std::path::Path;

use crate::protocol::Command;
use crate::providers::authenticate;
use crate::routing::handlers::{document, join, rest, LocalFile};
use crate::routing::router::{RouteContext, RouteError};
use crate::translation::response::{CgiAddress, ResourceAddress, TranslateResponse};

type HandlerResult = Result<(), RouteError>;

/// `/cm4all-beng-proxy/...`: the proxy's own JavaScript.
pub fn proxy_js(ctx: &RouteContext<'_>, response: &mut TranslateResponse) -> HandlerResult {
    let path = join(&ctx.config.paths.js, rest(ctx.uri, "/cm4all-beng-proxy/"));
    LocalFile::default().apply(ctx, &path, response);
    Ok(())
}

/// `/null`, `/zero`, `/urandom`.
pub fn device(ctx: &RouteContext<'_>, response: &mut TranslateResponse) -> HandlerResult {
    response.path(format!("/dev{}", ctx.uri));
    Ok(())
}

pub fn discard(_ctx: &RouteContext<'_>, response: &mut TranslateResponse) -> HandlerResult {
    response.discard_session = true;
    response.status(204);
    Ok(())
}

pub fn delegate(ctx: &RouteContext<'_>, response: &mut TranslateResponse) -> HandlerResult {
    let path = join(&ctx.config.paths.document_root, rest(ctx.uri, "/delegate"));
    LocalFile {
        delegate: true,
        ..LocalFile::default()
    }
    .apply(ctx, &path, response);
    Ok(())
}

pub fn jail_delegate(ctx: &RouteContext<'_>, response: &mut TranslateResponse) -> HandlerResult {
    let path = join(&ctx.config.paths.jail_root, rest(ctx.uri, "/jail-delegate"));
    LocalFile {
        delegate: true,
        jail: true,
        ..LocalFile::default()
    }
    .apply(ctx, &path, response);
    Ok(())
}

pub fn jail(ctx: &RouteContext<'_>, response: &mut TranslateResponse) -> HandlerResult {
    let path = join(&ctx.config.paths.jail_root, rest(ctx.uri, "/jail"));
    LocalFile {
        jail: true,
        ..LocalFile::default()
    }
    .apply(ctx, &path, response);
    Ok(())
}

/// Like `/jail/`, but PHP runs as CGI.
pub fn jail_slow(ctx: &RouteContext<'_>, response: &mut TranslateResponse) -> HandlerResult {
    let path = join(&ctx.config.paths.jail_root, rest(ctx.uri, "/jail-slow"));
    LocalFile {
        jail: true,
        fastcgi: false,
        ..LocalFile::default()
    }
    .apply(ctx, &path, response);
    Ok(())
}

/// PHP in the jail with the document root below `HOME`.
pub fn jail_home(ctx: &RouteContext<'_>, response: &mut TranslateResponse) -> HandlerResult {
    let paths = &ctx.config.paths;
    let root = &paths.jail_home_document_root;
    let mut script = CgiAddress::new(join(root, rest(ctx.uri, "/jail-home")))
        .action(paths.jail_php_action.as_str())
        .jail(true);
    script.home = Some(paths.jail_home.clone());

    response.document_root(root.as_str());
    response.address(ResourceAddress::FastCgi(script));
    Ok(())
}

pub fn demo(ctx: &RouteContext<'_>, response: &mut TranslateResponse) -> HandlerResult {
    let path = join(&ctx.config.paths.demo, rest(ctx.uri, "/demo"));
    LocalFile::default().apply(ctx, &path, response);
    Ok(())
}

pub fn auth(ctx: &RouteContext<'_>, response: &mut TranslateResponse) -> HandlerResult {
    if authenticate(ctx.credentials, ctx.request.authorization.as_deref()) {
        document(ctx, rest(ctx.uri, "/auth"), response);
    } else {
        tracing::debug!(uri = %ctx.uri, "Authentication required");
        response.www_authenticate = Some(format!("Basic realm=\"{}\"", ctx.config.auth.realm));
    }
    Ok(())
}

pub fn header(ctx: &RouteContext<'_>, response: &mut TranslateResponse) -> HandlerResult {
    response.header("X-Foo", "Bar");
    document(ctx, rest(ctx.uri, "/header"), response);
    Ok(())
}

fn hello(ctx: &RouteContext<'_>) -> String {
    join(&ctx.config.paths.demo, "hello.txt")
}

pub fn validate_mtime(ctx: &RouteContext<'_>, response: &mut TranslateResponse) -> HandlerResult {
    let stamp = &ctx.config.paths.stamp;
    let mtime = ctx
        .stat
        .modified(Path::new(stamp))
        .map_err(|e| RouteError::LookupFailure {
            what: stamp.clone(),
            reason: e.to_string(),
        })?;

    response.path(hello(ctx));
    response.validate_mtime = Some((mtime, stamp.clone()));
    Ok(())
}

pub fn per_host_invalidate(
    ctx: &RouteContext<'_>,
    response: &mut TranslateResponse,
) -> HandlerResult {
    response
        .path(hello(ctx))
        .invalidate(&[Command::Host])
        .max_age(0);
    Ok(())
}

pub fn per_host(ctx: &RouteContext<'_>, response: &mut TranslateResponse) -> HandlerResult {
    response.path(hello(ctx)).vary(&[Command::Host]);
    Ok(())
}

/// File plus a `CONTENT_TYPE_LOOKUP` probe.
pub fn content_type_lookup(
    ctx: &RouteContext<'_>,
    response: &mut TranslateResponse,
) -> HandlerResult {
    document(ctx, rest(ctx.uri, "/ctl"), response);
    response.content_type_lookup = Some(bytes::Bytes::from_static(b"xyz"));
    Ok(())
}

/// Everything else: a file below the document root with error documents.
pub fn catch_all(ctx: &RouteContext<'_>, response: &mut TranslateResponse) -> HandlerResult {
    let path = join(&ctx.config.paths.document_root, ctx.uri);
    LocalFile {
        error_document: true,
        ..LocalFile::default()
    }
    .apply(ctx, &path, response);
    Ok(())
}
