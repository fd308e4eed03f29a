//! Shared hosting: one document root served through regex-cached answers.
//!
//! The first answer for a path is generalized with `REGEX`/`EASY_BASE` so
//! the proxy can reuse it for sibling URIs. Missing files come back as a
//! `FILE_NOT_FOUND`/`DIRECTORY_INDEX` second round.

use bytes::Bytes;

use crate::protocol::Command;
use crate::routing::handlers::negotiation::directory_listing;
use crate::routing::handlers::{document, join, rest};
use crate::routing::router::{RouteContext, RouteError};
use crate::translation::negotiation::expect_echo;
use crate::translation::response::{CgiAddress, FileAddress, ResourceAddress, TranslateResponse};

type HandlerResult = Result<(), RouteError>;

const HOSTING_BASE: &str = "/hosting/";
const NOT_FOUND_STATUS: &[u8] = b"404";
const NOT_FOUND_INDEX: &[u8] = b"index.html";
const DIRECTORY_TOKEN: &[u8] = b"foo";

/// Script executor on the easy base, the script chosen by `REGEX_TAIL`.
fn script(
    response: &mut TranslateResponse,
    root: &str,
    regex: &str,
    action: &str,
    upload_buffer: bool,
) {
    let mut address = CgiAddress::new(format!("{}/", root))
        .expand_path(format!(r"{}/\1", root))
        .action(action);
    if upload_buffer {
        address = address.pair("UPLOAD_BUFFER_SIZE", "4M");
    }

    response.easy_base = true;
    response
        .regex_tail(regex)
        .address(ResourceAddress::FastCgi(address));
    response.file_not_found = Some(Bytes::from_static(NOT_FOUND_STATUS));
}

pub fn hosting(ctx: &RouteContext<'_>, response: &mut TranslateResponse) -> HandlerResult {
    let root = ctx.config.paths.document_root.as_str();
    let tail = rest(ctx.raw_uri, HOSTING_BASE);
    response.base(HOSTING_BASE).document_root(root);

    if let Some(token) = ctx.request.file_not_found.as_deref() {
        return match token {
            NOT_FOUND_STATUS => {
                response.status(404);
                Ok(())
            }
            NOT_FOUND_INDEX => {
                response
                    .regex_tail("^(.*)$")
                    .address(ResourceAddress::Cgi(directory_listing(ctx, "/dummy", true)));
                Ok(())
            }
            other => expect_echo(Command::FileNotFound, other, NOT_FOUND_INDEX),
        };
    }

    if let Some(token) = ctx.request.directory_index.as_deref() {
        expect_echo(Command::DirectoryIndex, token, DIRECTORY_TOKEN)?;
        response.regex = Some("^(.*)$".to_string());
        response.redirect("dummy");
        response.expand_redirect = Some(r"\1/".to_string());
        return Ok(());
    }

    let paths = &ctx.config.paths;
    if tail.ends_with(".cls") {
        script(response, root, r"^(.*\.cls)$", &paths.coma_fastcgi, true);
    } else if tail.ends_with(".php") {
        script(response, root, r"^(.*\.php)$", &paths.php_action, false);
    } else if tail.is_empty() || tail.ends_with('/') {
        let mut index = FileAddress::new("/dummy");
        index.expand_path = Some(format!(r"{}/\1index.html", root));
        response
            .regex_tail("^(.*)$")
            .address(ResourceAddress::Local(index));
        response.file_not_found = Some(Bytes::from_static(NOT_FOUND_INDEX));
    } else {
        response.easy_base = true;
        response.inverse_regex = Some(r"(\.(cls|php)|/)$".to_string());
        response.path(format!("{}/", root));
        response.directory_index = Some(Bytes::from_static(DIRECTORY_TOKEN));
    }
    Ok(())
}

/// The proxy rewrites the request onto another scheme, host and URI.
pub fn base(ctx: &RouteContext<'_>, response: &mut TranslateResponse) -> HandlerResult {
    let upstream = &ctx.config.upstream;
    response.base("/base/");
    response.scheme = Some("https".to_string());
    response.host = Some(upstream.rewrite_host.clone());
    response.uri = Some(format!("/foo/{}", rest(ctx.uri, "/base/")));
    document(ctx, rest(ctx.uri, "/base"), response);
    Ok(())
}

pub fn easy_base(ctx: &RouteContext<'_>, response: &mut TranslateResponse) -> HandlerResult {
    response.base("/easy-base/");
    response.easy_base = true;
    response.scheme = Some("https".to_string());
    response.host = Some(ctx.config.upstream.rewrite_host.clone());
    response.path(join(&ctx.config.paths.document_root, ""));
    Ok(())
}
