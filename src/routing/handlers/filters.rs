//! Filter chains.

use crate::routing::handlers::join;
use crate::routing::router::{RouteContext, RouteError};
use crate::translation::response::{CgiAddress, ResourceAddress, TranslateResponse};

type HandlerResult = Result<(), RouteError>;

fn demo(ctx: &RouteContext<'_>, name: &str) -> String {
    join(&ctx.config.paths.demo, name)
}

fn cgi(ctx: &RouteContext<'_>, name: &str) -> String {
    join(&ctx.config.paths.cgi, name)
}

fn sed(ctx: &RouteContext<'_>, script: &str) -> ResourceAddress {
    ResourceAddress::FastCgi(
        CgiAddress::new(cgi(ctx, script)).action(ctx.config.paths.sed_fastcgi.as_str()),
    )
}

/// Two pipe filters chained.
pub fn pipes(ctx: &RouteContext<'_>, response: &mut TranslateResponse) -> HandlerResult {
    response
        .document_root(ctx.config.paths.demo.as_str())
        .path(demo(ctx, "hello.txt"))
        .filter(ResourceAddress::Pipe(CgiAddress::new(cgi(ctx, "pipe.sed"))))
        .filter(ResourceAddress::Pipe(CgiAddress::new(cgi(ctx, "pipe2.sed"))));
    Ok(())
}

pub fn xslt(ctx: &RouteContext<'_>, response: &mut TranslateResponse) -> HandlerResult {
    response.address(ResourceAddress::FastCgi(
        CgiAddress::new(ctx.config.paths.xslt_fastcgi.as_str())
            .pair("STYLESHEET_PATH", demo(ctx, "../filter.xsl"))
            .pair("DOCUMENT_PATH", demo(ctx, "../filter.xml")),
    ));
    Ok(())
}

pub fn xslt_filter(ctx: &RouteContext<'_>, response: &mut TranslateResponse) -> HandlerResult {
    response.path(demo(ctx, "../filter.xml")).filter(ResourceAddress::FastCgi(
        CgiAddress::new(ctx.config.paths.xslt_fastcgi.as_str())
            .pair("STYLESHEET_PATH", demo(ctx, "../filter.xsl")),
    ));
    Ok(())
}

pub fn xmlstrip(ctx: &RouteContext<'_>, response: &mut TranslateResponse) -> HandlerResult {
    response
        .path(demo(ctx, "xmlstrip2.html"))
        .filter(ResourceAddress::Was(CgiAddress::new(
            ctx.config.paths.xmlstrip.as_str(),
        )));
    Ok(())
}

pub fn sed_pipe(ctx: &RouteContext<'_>, response: &mut TranslateResponse) -> HandlerResult {
    response
        .path(demo(ctx, "xmlstrip2.html"))
        .filter(ResourceAddress::Pipe(CgiAddress::new(cgi(ctx, "xmlstrip.sed"))));
    Ok(())
}

pub fn sed_filter(ctx: &RouteContext<'_>, response: &mut TranslateResponse) -> HandlerResult {
    response
        .path(demo(ctx, "hello.txt"))
        .filter(sed(ctx, "pipe.sed"))
        .filter(sed(ctx, "pipe2.sed"));
    Ok(())
}

/// The first stage talks to an already running sed server.
pub fn remote_sed(ctx: &RouteContext<'_>, response: &mut TranslateResponse) -> HandlerResult {
    let mut first = CgiAddress::new(cgi(ctx, "pipe.sed")).pair("DOCUMENT_PATH", demo(ctx, "hello.txt"));
    first.address = Some(ctx.config.paths.sed_socket.clone());

    response
        .address(ResourceAddress::FastCgi(first))
        .filter(sed(ctx, "pipe2.sed"));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TranslationConfig;
    use crate::routing::handlers::test_support::{call, request};
    use pretty_assertions::assert_eq;

    #[test]
    fn two_pipes_in_order() {
        let config = TranslationConfig::default();
        let response = call(pipes, &request("/filter"), &config).unwrap();
        assert_eq!(
            response.filters,
            vec![
                ResourceAddress::Pipe(CgiAddress::new("/usr/lib/cgi-bin/pipe.sed")),
                ResourceAddress::Pipe(CgiAddress::new("/usr/lib/cgi-bin/pipe2.sed")),
            ]
        );
        assert_eq!(
            response.address,
            Some(ResourceAddress::local(
                "/usr/share/cm4all/beng-proxy/demo/htdocs/hello.txt"
            ))
        );
    }

    #[test]
    fn sed_is_a_pipe_filter() {
        let config = TranslationConfig::default();
        let response = call(sed_pipe, &request("/sed"), &config).unwrap();
        assert_eq!(
            response.filters,
            vec![ResourceAddress::Pipe(CgiAddress::new(
                "/usr/lib/cgi-bin/xmlstrip.sed"
            ))]
        );
    }

    #[test]
    fn remote_sed_connects_to_socket() {
        let config = TranslationConfig::default();
        let response = call(remote_sed, &request("/remote-sed"), &config).unwrap();
        match response.address {
            Some(ResourceAddress::FastCgi(first)) => {
                assert_eq!(first.address.as_deref(), Some("/tmp/sed.socket"));
                assert_eq!(first.action, None);
            }
            other => panic!("unexpected address {other:?}"),
        }
        assert_eq!(response.filters.len(), 1);
    }
}
