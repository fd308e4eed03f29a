//! Routes that need a second round before they can answer.

use bytes::Bytes;

use crate::protocol::Command;
use crate::routing::handlers::upstream::remote;
use crate::routing::handlers::{join, rest, LocalFile};
use crate::routing::router::{RouteContext, RouteError};
use crate::translation::negotiation::{expect_echo, require_want, round, Round};
use crate::translation::response::{CgiAddress, ResourceAddress, TranslateResponse};

type HandlerResult = Result<(), RouteError>;

const CHECK_TOKEN: &[u8] = b"ok";
const FULL_URI_TOKEN: &[u8] = b"foo";
const FILE_NOT_FOUND_TOKEN: &[u8] = b"hansi";
const DIRECTORY_INDEX_TOKEN: &[u8] = b"abc";

fn env_script(ctx: &RouteContext<'_>) -> CgiAddress {
    CgiAddress::new(join(&ctx.config.paths.cgi, "env.py")).script_name(ctx.uri)
}

/// CGI listing a directory, selected by regex capture.
pub(crate) fn directory_listing(ctx: &RouteContext<'_>, directory: &str, path_info: bool) -> CgiAddress {
    let script = join(&ctx.config.paths.cgi, "directory_index.py");
    let mut address = CgiAddress::new(script.as_str())
        .pair("DIRECTORY", directory)
        .expand_pair(format!(r"DIRECTORY={}", join(&ctx.config.paths.document_root, r"\1")));
    if path_info {
        address = address.path_info(script);
    }
    address
}

pub fn vary_user_agent_remote(
    ctx: &RouteContext<'_>,
    response: &mut TranslateResponse,
) -> HandlerResult {
    if !require_want(ctx.request, response, &[Command::UserAgent]) {
        return Ok(());
    }

    response.vary(&[Command::UserAgent]);
    remote(ctx, "/vary-user-agent/remote/", response);
    Ok(())
}

pub fn vary_user_agent_local(
    ctx: &RouteContext<'_>,
    response: &mut TranslateResponse,
) -> HandlerResult {
    if !require_want(ctx.request, response, &[Command::UserAgent]) {
        return Ok(());
    }

    response.vary(&[Command::UserAgent]);
    let path = join(
        &ctx.config.paths.document_root,
        rest(ctx.uri, "/vary-user-agent/local"),
    );
    LocalFile {
        error_document: true,
        ..LocalFile::default()
    }
    .apply(ctx, &path, response);
    Ok(())
}

pub fn ua_class(ctx: &RouteContext<'_>, response: &mut TranslateResponse) -> HandlerResult {
    if !require_want(ctx.request, response, &[Command::UaClass]) {
        return Ok(());
    }

    let mut script = env_script(ctx);
    if let Some(ua_class) = &ctx.request.ua_class {
        script = script.path_info(ua_class.as_str());
    }
    response
        .vary(&[Command::UaClass, Command::Want])
        .address(ResourceAddress::Cgi(script));
    Ok(())
}

/// Revalidation: the first answer carries a token, a second round holding
/// it reuses the cached answer.
pub fn check(ctx: &RouteContext<'_>, response: &mut TranslateResponse) -> HandlerResult {
    match round(ctx.request.check.as_ref()) {
        Round::First => {
            response.check = Some(Bytes::from_static(CHECK_TOKEN));
            let path = join(&ctx.config.paths.demo, "hello.txt");
            LocalFile::default().apply(ctx, &path, response);
        }
        Round::Second(token) => {
            expect_echo(Command::Check, token, CHECK_TOKEN)?;
            response.max_age(20);
            response.previous = true;
        }
    }
    Ok(())
}

pub fn want_full_uri(ctx: &RouteContext<'_>, response: &mut TranslateResponse) -> HandlerResult {
    match round(ctx.request.want_full_uri.as_ref()) {
        Round::First => {
            response.want_full_uri = Some(Bytes::from_static(FULL_URI_TOKEN));
        }
        Round::Second(token) => {
            expect_echo(Command::WantFullUri, token, FULL_URI_TOKEN)?;
            response
                .max_age(20)
                .address(ResourceAddress::Cgi(env_script(ctx)));
        }
    }
    Ok(())
}

pub fn file_not_found(ctx: &RouteContext<'_>, response: &mut TranslateResponse) -> HandlerResult {
    match round(ctx.request.file_not_found.as_ref()) {
        Round::First => {
            let path = join(&ctx.config.paths.document_root, rest(ctx.uri, "/file_not_found"));
            LocalFile::default().apply(ctx, &path, response);
            response.file_not_found = Some(Bytes::from_static(FILE_NOT_FOUND_TOKEN));
        }
        Round::Second(token) => {
            expect_echo(Command::FileNotFound, token, FILE_NOT_FOUND_TOKEN)?;
            response.base("/file_not_found/").status(204);
        }
    }
    Ok(())
}

pub fn directory_index(ctx: &RouteContext<'_>, response: &mut TranslateResponse) -> HandlerResult {
    match round(ctx.request.directory_index.as_ref()) {
        Round::First => {
            let path = join(&ctx.config.paths.document_root, rest(ctx.uri, "/directory_index"));
            LocalFile::default().apply(ctx, &path, response);
            response.directory_index = Some(Bytes::from_static(DIRECTORY_INDEX_TOKEN));
        }
        Round::Second(token) => {
            expect_echo(Command::DirectoryIndex, token, DIRECTORY_INDEX_TOKEN)?;
            response
                .base("/directory_index/")
                .regex_tail("^(.*)$")
                .address(ResourceAddress::Cgi(directory_listing(ctx, "dummy", false)));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TranslationConfig;
    use crate::routing::handlers::test_support::{call, request};
    use crate::translation::request::TranslateRequest;
    use pretty_assertions::assert_eq;

    fn with_want(uri: &str, want: &[Command]) -> TranslateRequest {
        let mut request = request(uri);
        request.want = want.to_vec();
        request
    }

    #[test]
    fn user_agent_is_requested_first() {
        let config = TranslationConfig::default();
        let first = call(
            vary_user_agent_remote,
            &request("/vary-user-agent/remote/x"),
            &config,
        )
        .unwrap();
        assert_eq!(first.want, vec![Command::UserAgent]);
        assert!(first.is_negotiation());

        let second = call(
            vary_user_agent_remote,
            &with_want("/vary-user-agent/remote/x", &[Command::UserAgent]),
            &config,
        )
        .unwrap();
        assert!(second.want.is_empty());
        assert_eq!(second.vary, vec![Command::UserAgent]);
        assert_eq!(
            second.address,
            Some(ResourceAddress::http("http://cfatest01.intern.cm-ag/x"))
        );
    }

    #[test]
    fn ua_class_second_round() {
        let config = TranslationConfig::default();
        let mut request = with_want("/ua_class", &[Command::UaClass]);
        request.ua_class = Some("bot".to_string());

        let response = call(ua_class, &request, &config).unwrap();
        assert_eq!(response.vary, vec![Command::UaClass, Command::Want]);
        assert_eq!(
            response.address,
            Some(ResourceAddress::Cgi(
                CgiAddress::new("/usr/lib/cgi-bin/env.py")
                    .script_name("/ua_class")
                    .path_info("bot")
            ))
        );
    }

    #[test]
    fn check_rounds() {
        let config = TranslationConfig::default();
        let first = call(check, &request("/check"), &config).unwrap();
        assert_eq!(first.check.as_deref(), Some(&b"ok"[..]));
        assert!(first.address.is_some());

        let mut again = request("/check");
        again.check = Some(Bytes::from_static(b"ok"));
        let second = call(check, &again, &config).unwrap();
        assert_eq!(second.max_age, Some(20));
        assert!(second.previous);
        assert_eq!(second.address, None);

        again.check = Some(Bytes::from_static(b"stale"));
        assert_eq!(call(check, &again, &config).unwrap_err().status(), 400);
    }

    #[test]
    fn want_full_uri_rounds() {
        let config = TranslationConfig::default();
        let first = call(want_full_uri, &request("/want_full_uri/x"), &config).unwrap();
        assert_eq!(first.want_full_uri.as_deref(), Some(&b"foo"[..]));
        assert!(first.is_negotiation());

        let mut again = request("/want_full_uri/x");
        again.want_full_uri = Some(Bytes::from_static(b"foo"));
        let second = call(want_full_uri, &again, &config).unwrap();
        assert_eq!(second.max_age, Some(20));
        assert_eq!(
            second.address,
            Some(ResourceAddress::Cgi(
                CgiAddress::new("/usr/lib/cgi-bin/env.py").script_name("/want_full_uri/x")
            ))
        );
    }

    #[test]
    fn probes_and_invalid_replies() {
        let config = TranslationConfig::default();
        let first = call(file_not_found, &request("/file_not_found/x.html"), &config).unwrap();
        assert_eq!(first.file_not_found.as_deref(), Some(&b"hansi"[..]));

        let mut again = request("/file_not_found/x.html");
        again.file_not_found = Some(Bytes::from_static(b"hansi"));
        let second = call(file_not_found, &again, &config).unwrap();
        assert_eq!(second.status, Some(204));
        assert_eq!(second.base.as_deref(), Some("/file_not_found/"));

        again.file_not_found = Some(Bytes::from_static(b"other"));
        assert_eq!(call(file_not_found, &again, &config).unwrap_err().status(), 400);

        let mut index = request("/directory_index/dir");
        index.directory_index = Some(Bytes::from_static(b"abc"));
        let response = call(directory_index, &index, &config).unwrap();
        match response.address {
            Some(ResourceAddress::Cgi(listing)) => {
                assert_eq!(listing.path, "/usr/lib/cgi-bin/directory_index.py");
                assert_eq!(listing.expand_pairs, vec![r"DIRECTORY=/var/www/\1".to_string()]);
            }
            other => panic!("unexpected address {other:?}"),
        }

        index.directory_index = Some(Bytes::from_static(b"xyz"));
        assert_eq!(call(directory_index, &index, &config).unwrap_err().status(), 400);
    }
}
