//! Remote servers, redirects and bounces.

use crate::routing::handlers::rest;
use crate::routing::router::{RouteContext, RouteError};
use crate::translation::response::{
    ForwardMode, HeaderForward, HttpAddress, NfsAddress, ResourceAddress, TranslateResponse,
};

type HandlerResult = Result<(), RouteError>;

/// Upstream base URL followed by the raw URI tail.
fn upstream_url(ctx: &RouteContext<'_>, prefix: &str) -> String {
    format!("{}{}", ctx.config.upstream.http_base, rest(ctx.raw_uri, prefix))
}

fn forward_all(response: &mut TranslateResponse, mode: ForwardMode) {
    response.request_header_forward = vec![HeaderForward::all(mode)];
    response.response_header_forward = vec![HeaderForward::all(mode)];
}

pub fn cfatest(ctx: &RouteContext<'_>, response: &mut TranslateResponse) -> HandlerResult {
    response.address(ResourceAddress::http(upstream_url(ctx, "/cfatest01/")));
    Ok(())
}

pub fn transparent(ctx: &RouteContext<'_>, response: &mut TranslateResponse) -> HandlerResult {
    response.address(ResourceAddress::http(upstream_url(ctx, "/transparent/")));
    response.transparent = true;
    Ok(())
}

pub fn proxy(ctx: &RouteContext<'_>, response: &mut TranslateResponse) -> HandlerResult {
    response.address(ResourceAddress::http(upstream_url(ctx, "/proxy/")));
    forward_all(response, ForwardMode::Yes);
    Ok(())
}

pub fn mangle(ctx: &RouteContext<'_>, response: &mut TranslateResponse) -> HandlerResult {
    response.address(ResourceAddress::http(upstream_url(ctx, "/mangle/")));
    forward_all(response, ForwardMode::Mangle);
    Ok(())
}

/// Plain HTTP proxy to the upstream base, used after negotiation.
pub(crate) fn remote(ctx: &RouteContext<'_>, prefix: &str, response: &mut TranslateResponse) {
    response.address(ResourceAddress::http(upstream_url(ctx, prefix)));
}

pub fn ajp(ctx: &RouteContext<'_>, response: &mut TranslateResponse) -> HandlerResult {
    let upstream = &ctx.config.upstream;
    let url = format!("{}{}", upstream.ajp_base, rest(ctx.raw_uri, "/ajp"));
    response.address(ResourceAddress::Ajp(
        HttpAddress::new(url).pool([upstream.ajp_address.as_str()]),
    ));
    Ok(())
}

pub fn nfs(ctx: &RouteContext<'_>, response: &mut TranslateResponse) -> HandlerResult {
    let upstream = &ctx.config.upstream;
    response.address(ResourceAddress::Nfs(NfsAddress {
        server: upstream.nfs_server.clone(),
        export: upstream.nfs_export.clone(),
        path: rest(ctx.raw_uri, "/nfs").to_string(),
    }));
    Ok(())
}

fn pool(ctx: &RouteContext<'_>, host: &str, prefix: &str) -> HttpAddress {
    HttpAddress::new(format!("http://{}/{}", host, rest(ctx.raw_uri, prefix)))
        .pool(ctx.config.upstream.pool.iter().cloned())
}

pub fn balancer(ctx: &RouteContext<'_>, response: &mut TranslateResponse) -> HandlerResult {
    response.address(ResourceAddress::Http(pool(ctx, "balancer", "/balancer/")));
    Ok(())
}

pub fn sticky(ctx: &RouteContext<'_>, response: &mut TranslateResponse) -> HandlerResult {
    let mut address = pool(ctx, "sticky", "/sticky/");
    address.sticky = true;
    response.address(ResourceAddress::Http(address));
    Ok(())
}

pub fn redirect(ctx: &RouteContext<'_>, response: &mut TranslateResponse) -> HandlerResult {
    response.redirect(ctx.config.upstream.http_base.as_str());
    Ok(())
}

pub fn redirect_query_string(
    ctx: &RouteContext<'_>,
    response: &mut TranslateResponse,
) -> HandlerResult {
    response.redirect(ctx.config.upstream.http_base.as_str());
    response.redirect_query_string = true;
    Ok(())
}

fn redirect_with(ctx: &RouteContext<'_>, status: u16, response: &mut TranslateResponse) {
    response
        .status(status)
        .redirect(ctx.config.upstream.http_base.as_str());
}

pub fn redirect_permanent(ctx: &RouteContext<'_>, response: &mut TranslateResponse) -> HandlerResult {
    redirect_with(ctx, 301, response);
    Ok(())
}

pub fn redirect_found(ctx: &RouteContext<'_>, response: &mut TranslateResponse) -> HandlerResult {
    redirect_with(ctx, 302, response);
    Ok(())
}

pub fn redirect_temporary(ctx: &RouteContext<'_>, response: &mut TranslateResponse) -> HandlerResult {
    redirect_with(ctx, 307, response);
    Ok(())
}

pub fn bounce(ctx: &RouteContext<'_>, response: &mut TranslateResponse) -> HandlerResult {
    response.bounce = Some(ctx.config.upstream.bounce.clone());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TranslationConfig;
    use crate::routing::handlers::test_support::{call, request};
    use pretty_assertions::assert_eq;

    #[test]
    fn raw_tail_is_forwarded_undecoded() {
        let config = TranslationConfig::default();
        let response = call(cfatest, &request("/cfatest01/a%20b"), &config).unwrap();
        assert_eq!(
            response.address,
            Some(ResourceAddress::http("http://cfatest01.intern.cm-ag/a%20b"))
        );
    }

    #[test]
    fn transparent_strips_its_own_prefix() {
        let config = TranslationConfig::default();
        let response = call(transparent, &request("/transparent/foo"), &config).unwrap();
        assert_eq!(
            response.address,
            Some(ResourceAddress::http("http://cfatest01.intern.cm-ag/foo"))
        );
        assert!(response.transparent);
    }

    #[test]
    fn header_forwarding() {
        let config = TranslationConfig::default();
        let response = call(mangle, &request("/mangle/x"), &config).unwrap();
        assert_eq!(
            response.request_header_forward,
            vec![HeaderForward::all(ForwardMode::Mangle)]
        );
        assert_eq!(
            response.response_header_forward,
            vec![HeaderForward::all(ForwardMode::Mangle)]
        );
    }

    #[test]
    fn ajp_and_nfs() {
        let config = TranslationConfig::default();
        let response = call(ajp, &request("/ajp/servlet"), &config).unwrap();
        assert_eq!(
            response.address,
            Some(ResourceAddress::Ajp(
                HttpAddress::new("ajp://cfatest01.intern.cm-ag:8009/servlet")
                    .pool(["cfatest01.intern.cm-ag:8009"])
            ))
        );

        let response = call(nfs, &request("/nfs/dir/file"), &config).unwrap();
        assert_eq!(
            response.address,
            Some(ResourceAddress::Nfs(NfsAddress {
                server: "172.28.0.8".to_string(),
                export: "/srv/nfs4/foo".to_string(),
                path: "/dir/file".to_string(),
            }))
        );
    }

    #[test]
    fn pools() {
        let config = TranslationConfig::default();
        let response = call(sticky, &request("/sticky/x"), &config).unwrap();
        let mut expected = HttpAddress::new("http://sticky/x")
            .pool(["172.30.0.23:80", "172.30.0.23:8080"]);
        expected.sticky = true;
        assert_eq!(response.address, Some(ResourceAddress::Http(expected)));
    }

    #[test]
    fn redirects() {
        let config = TranslationConfig::default();
        let response = call(redirect_temporary, &request("/redirect/temporary"), &config).unwrap();
        assert_eq!(response.status, Some(307));
        assert_eq!(response.redirect.as_deref(), Some("http://cfatest01.intern.cm-ag/"));

        let response = call(redirect_query_string, &request("/redirect/query_string"), &config)
            .unwrap();
        assert!(response.redirect_query_string);
        assert_eq!(response.status, None);
    }
}
