//! CGI, FastCGI, WAS and LHTTP programs.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::routing::handlers::{join, rest, Coma};
use crate::routing::router::{RouteContext, RouteError};
use crate::translation::response::{
    CgiAddress, FileAddress, LhttpAddress, ResourceAddress, TranslateResponse,
};

type HandlerResult = Result<(), RouteError>;

static COMA_APPS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^/coma-apps/([-\w]+)/(\w+\.cls(?:/.*)?)$").expect("valid regex")
});

/// `<prefix><script>[/<path_info>]` below the CGI directory.
fn cgi_script(ctx: &RouteContext<'_>, prefix: &str, response: &mut TranslateResponse) {
    let tail = rest(ctx.uri, prefix);
    let (script, path_info) = match tail.find('/') {
        Some(i) => (&tail[..i], Some(&tail[i..])),
        None => (tail, None),
    };
    let script_name = &ctx.uri[..ctx.uri.len() - path_info.map_or(0, str::len)];

    let mut address = CgiAddress::new(join(&ctx.config.paths.cgi, script)).script_name(script_name);
    if let Some(path_info) = path_info {
        address = address.path_info(path_info);
        response.auto_base = true;
    }
    response.address(ResourceAddress::Cgi(address));
}

pub fn cgi_bin(ctx: &RouteContext<'_>, response: &mut TranslateResponse) -> HandlerResult {
    cgi_script(ctx, "/cgi-bin/", response);
    Ok(())
}

pub fn cgi_transparent(ctx: &RouteContext<'_>, response: &mut TranslateResponse) -> HandlerResult {
    cgi_script(ctx, "/cgi-transparent/", response);
    response.transparent = true;
    Ok(())
}

pub fn fcgi_rb(ctx: &RouteContext<'_>, response: &mut TranslateResponse) -> HandlerResult {
    response.address(ResourceAddress::FastCgi(CgiAddress::new(join(
        &ctx.config.paths.test,
        "fcgi.rb",
    ))));
    Ok(())
}

pub fn coma(ctx: &RouteContext<'_>, response: &mut TranslateResponse) -> HandlerResult {
    Coma {
        base_uri: "/coma/",
        base_path: &ctx.config.paths.coma_source,
        config_file: None,
        was: false,
    }
    .apply(ctx, rest(ctx.uri, "/coma/"), response);
    Ok(())
}

pub fn coma_was(ctx: &RouteContext<'_>, response: &mut TranslateResponse) -> HandlerResult {
    Coma {
        base_uri: "/coma-was/",
        base_path: &ctx.config.paths.coma_source,
        config_file: None,
        was: true,
    }
    .apply(ctx, rest(ctx.uri, "/coma-was/"), response);
    Ok(())
}

/// `/coma-apps/<name>/<class>.cls[/<path_info>]`.
pub fn coma_apps(ctx: &RouteContext<'_>, response: &mut TranslateResponse) -> HandlerResult {
    let Some(m) = COMA_APPS_RE.captures(ctx.uri) else {
        response.status(404);
        return Ok(());
    };
    let (name, relative_uri) = (&m[1], &m[2]);
    let paths = &ctx.config.paths;

    let base_path = join(&join(&paths.coma_apps, name), "htdocs");
    let config_file = join(&join(&paths.coma_apps_config, name), "coma.config");
    let config_file = ctx
        .stat
        .is_readable(Path::new(&config_file))
        .then_some(config_file);
    let base_uri = format!("/coma-apps/{}/", name);

    Coma {
        base_uri: &base_uri,
        base_path: &base_path,
        config_file,
        was: false,
    }
    .apply(ctx, relative_uri, response);
    Ok(())
}

pub fn image_processor(ctx: &RouteContext<'_>, response: &mut TranslateResponse) -> HandlerResult {
    let paths = &ctx.config.paths;
    Coma {
        base_uri: "/imageprocessor/",
        base_path: &paths.image_processor,
        config_file: Some(paths.image_processor_config.clone()),
        was: false,
    }
    .apply(ctx, rest(ctx.uri, "/imageprocessor/"), response);
    Ok(())
}

pub fn image_processor_was(
    ctx: &RouteContext<'_>,
    response: &mut TranslateResponse,
) -> HandlerResult {
    let paths = &ctx.config.paths;
    Coma {
        base_uri: "/imageprocessor-was/",
        base_path: &paths.image_processor,
        config_file: Some(paths.image_processor_config.clone()),
        was: true,
    }
    .apply(ctx, rest(ctx.uri, "/imageprocessor-was/"), response);
    Ok(())
}

/// Static image piped through the image processor's filter class.
pub fn image_processor_filter(
    ctx: &RouteContext<'_>,
    response: &mut TranslateResponse,
) -> HandlerResult {
    let paths = &ctx.config.paths;
    let tail = rest(ctx.uri, "/imageprocessor-filter");
    let Some(i) = tail.rfind(".jpg/") else {
        response.status(404);
        return Ok(());
    };
    let (file, path_info) = tail.split_at(i + ".jpg".len());

    let root = &paths.document_root;
    let mut image = FileAddress::new(join(root, file));
    image.expand_path = Some(join(root, r"\1"));

    let mut filter = CgiAddress::new(join(&paths.image_processor, "filter.cls"))
        .action(paths.coma_fastcgi.as_str())
        .path_info(path_info);
    filter.expand_path_info = Some(r"/\2".to_string());

    response
        .base("/imageprocessor-filter/")
        .regex_tail(r"^(.+\.(?:jpe?g|png|gif|bmp))/([^/]+(?:/[^/])?)")
        .document_root(root.as_str())
        .address(ResourceAddress::Local(image))
        .filter(ResourceAddress::FastCgi(filter));
    Ok(())
}

fn lhttp_server(ctx: &RouteContext<'_>, mode: &str, response: &mut TranslateResponse) {
    response.address(ResourceAddress::Lhttp(LhttpAddress {
        path: join(&ctx.config.paths.test, "run_http_server"),
        args: vec!["accept".to_string(), "0".to_string(), mode.to_string()],
        uri: ctx.uri.to_string(),
        concurrency: Some(4),
    }));
}

pub fn lhttp(ctx: &RouteContext<'_>, response: &mut TranslateResponse) -> HandlerResult {
    lhttp_server(ctx, "fixed", response);
    Ok(())
}

pub fn lhttp_mirror(ctx: &RouteContext<'_>, response: &mut TranslateResponse) -> HandlerResult {
    lhttp_server(ctx, "mirror", response);
    Ok(())
}

fn ticket_program(ctx: &RouteContext<'_>, name: &str) -> CgiAddress {
    let paths = &ctx.config.paths;
    CgiAddress::new(join(&paths.ticket_fastcgi, name))
        .pair("TICKET_VAR", paths.ticket_database.as_str())
}

pub fn ticket_create(ctx: &RouteContext<'_>, response: &mut TranslateResponse) -> HandlerResult {
    let program = ticket_program(ctx, "create")
        .path_info(rest(ctx.uri, "/ticket/create"))
        .pair("TICKET_MAX_SIZE", (4 * 1024 * 1024).to_string());
    response
        .document_root(ctx.config.paths.document_root.as_str())
        .base("/ticket/create/")
        .address(ResourceAddress::FastCgi(program));
    Ok(())
}

/// Upload from an FTP URI taken from the request path.
pub fn ticket_create2(ctx: &RouteContext<'_>, response: &mut TranslateResponse) -> HandlerResult {
    let program = ticket_program(ctx, "create")
        .pair("TICKET_URI", format!("ftp://{}", rest(ctx.uri, "/ticket/create2/")))
        .expand_pair(r"TICKET_URI=ftp://\1");
    response
        .base("/ticket/create2/")
        .regex_tail("^(.*)$")
        .address(ResourceAddress::FastCgi(program));
    Ok(())
}

pub fn ticket_upload(ctx: &RouteContext<'_>, response: &mut TranslateResponse) -> HandlerResult {
    let program = ticket_program(ctx, "upload").path_info(rest(ctx.uri, "/ticket/upload"));
    response
        .document_root(ctx.config.paths.document_root.as_str())
        .base("/ticket/upload/")
        .address(ResourceAddress::FastCgi(program));
    Ok(())
}

pub fn ticket_control(ctx: &RouteContext<'_>, response: &mut TranslateResponse) -> HandlerResult {
    let program = ticket_program(ctx, "control").path_info(rest(ctx.uri, "/ticket/control"));
    response
        .base("/ticket/control/")
        .address(ResourceAddress::FastCgi(program));
    Ok(())
}

pub fn ticket_cleanup(ctx: &RouteContext<'_>, response: &mut TranslateResponse) -> HandlerResult {
    let program = ticket_program(ctx, "cleanup").path_info("");
    response.address(ResourceAddress::FastCgi(program));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TranslationConfig;
    use crate::routing::handlers::test_support::{call, request};
    use pretty_assertions::assert_eq;

    #[test]
    fn cgi_bin_with_and_without_path_info() {
        let config = TranslationConfig::default();

        let response = call(cgi_bin, &request("/cgi-bin/env.py/a/b"), &config).unwrap();
        assert_eq!(
            response.address,
            Some(ResourceAddress::Cgi(
                CgiAddress::new("/usr/lib/cgi-bin/env.py")
                    .script_name("/cgi-bin/env.py")
                    .path_info("/a/b")
            ))
        );
        assert!(response.auto_base);

        let response = call(cgi_bin, &request("/cgi-bin/env.py"), &config).unwrap();
        assert_eq!(
            response.address,
            Some(ResourceAddress::Cgi(
                CgiAddress::new("/usr/lib/cgi-bin/env.py").script_name("/cgi-bin/env.py")
            ))
        );
        assert!(!response.auto_base);

        let response = call(cgi_transparent, &request("/cgi-transparent/x.sh"), &config).unwrap();
        assert!(response.transparent);
    }

    #[test]
    fn coma_with_path_info_sets_base() {
        let config = TranslationConfig::default();
        let response = call(coma, &request("/coma/app.cls/x/y"), &config).unwrap();
        assert_eq!(
            response.address,
            Some(ResourceAddress::FastCgi(
                CgiAddress::new("/usr/share/cm4all/coma/src/app.cls")
                    .action("/usr/bin/cm4all-coma-fastcgi")
                    .script_name("/coma/app.cls")
                    .path_info("/x/y")
            ))
        );
        assert_eq!(response.base.as_deref(), Some("/coma/app.cls/"));
        assert_eq!(
            response.document_root.as_deref(),
            Some("/usr/share/cm4all/coma/src")
        );
    }

    #[test]
    fn coma_was_passes_class_as_pair() {
        let config = TranslationConfig::default();
        let response = call(coma_was, &request("/coma-was/app.cls"), &config).unwrap();
        assert_eq!(
            response.address,
            Some(ResourceAddress::Was(
                CgiAddress::new("/usr/lib/cm4all/was/bin/coma-was")
                    .pair("COMA_CLASS", "/usr/share/cm4all/coma/src/app.cls")
                    .script_name("/coma-was/app.cls")
                    .path_info("")
            ))
        );
        assert_eq!(response.base, None);
    }

    #[test]
    fn coma_apps_config_file() {
        let config = TranslationConfig::default();
        let response = call(super::coma_apps, &request("/coma-apps/shop/index.cls"), &config).unwrap();
        match response.address {
            Some(ResourceAddress::FastCgi(script)) => {
                assert_eq!(script.path, "/usr/share/cm4all/coma/apps/shop/htdocs/index.cls");
                assert_eq!(script.script_name.as_deref(), Some("/coma-apps/shop/index.cls"));
                assert_eq!(
                    script.pairs,
                    vec![(
                        "COMA_CONFIG_FILE".to_string(),
                        "/etc/cm4all/coma/apps/shop/coma.config".to_string()
                    )]
                );
            }
            other => panic!("unexpected address {other:?}"),
        }

        let mut config = TranslationConfig::default();
        config.paths.coma_apps_config = "/missing".to_string();
        let response = call(super::coma_apps, &request("/coma-apps/shop/index.cls"), &config).unwrap();
        match response.address {
            Some(ResourceAddress::FastCgi(script)) => assert!(script.pairs.is_empty()),
            other => panic!("unexpected address {other:?}"),
        }

        let response = call(super::coma_apps, &request("/coma-apps/shop/index.html"), &config).unwrap();
        assert_eq!(response.status, Some(404));
        assert_eq!(response.address, None);
    }

    #[test]
    fn image_filter() {
        let config = TranslationConfig::default();
        let response = call(
            image_processor_filter,
            &request("/imageprocessor-filter/pics/a.jpg/scale/10"),
            &config,
        )
        .unwrap();

        match &response.address {
            Some(ResourceAddress::Local(file)) => {
                assert_eq!(file.path, "/var/www/pics/a.jpg");
                assert_eq!(file.expand_path.as_deref(), Some(r"/var/www/\1"));
            }
            other => panic!("unexpected address {other:?}"),
        }
        match response.filters.as_slice() {
            [ResourceAddress::FastCgi(filter)] => {
                assert_eq!(filter.path_info.as_deref(), Some("/scale/10"));
                assert_eq!(filter.expand_path_info.as_deref(), Some(r"/\2"));
            }
            other => panic!("unexpected filters {other:?}"),
        }
        assert!(response.regex_tail);

        let response = call(
            image_processor_filter,
            &request("/imageprocessor-filter/a.png/scale"),
            &config,
        )
        .unwrap();
        assert_eq!(response.status, Some(404));
    }

    #[test]
    fn lhttp_servers() {
        let config = TranslationConfig::default();
        let response = call(lhttp_mirror, &request("/lhttp/mirror"), &config).unwrap();
        assert_eq!(
            response.address,
            Some(ResourceAddress::Lhttp(LhttpAddress {
                path: "test/run_http_server".to_string(),
                args: vec!["accept".into(), "0".into(), "mirror".into()],
                uri: "/lhttp/mirror".to_string(),
                concurrency: Some(4),
            }))
        );
    }

    #[test]
    fn tickets() {
        let config = TranslationConfig::default();
        let response = call(ticket_create2, &request("/ticket/create2/host/file"), &config).unwrap();
        match response.address {
            Some(ResourceAddress::FastCgi(program)) => {
                assert_eq!(program.path, "/usr/lib/cm4all/ticket/cgi-bin/create");
                assert_eq!(
                    program.pairs[1],
                    ("TICKET_URI".to_string(), "ftp://host/file".to_string())
                );
                assert_eq!(program.expand_pairs, vec![r"TICKET_URI=ftp://\1".to_string()]);
            }
            other => panic!("unexpected address {other:?}"),
        }

        let response = call(ticket_create, &request("/ticket/create/x"), &config).unwrap();
        match response.address {
            Some(ResourceAddress::FastCgi(program)) => {
                assert_eq!(program.path_info.as_deref(), Some("/x"));
                assert!(program
                    .pairs
                    .contains(&("TICKET_MAX_SIZE".to_string(), "4194304".to_string())));
            }
            other => panic!("unexpected address {other:?}"),
        }
    }
}
