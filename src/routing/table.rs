//! The default route table.
//!
//! Order matters: several prefixes overlap (`/jail/` vs `/jail-home/`,
//! `/per_host/invalidate` vs `/per_host/`) and the first match wins.

use crate::routing::handlers::{files, filters, hosting, negotiation, scripts, upstream};
use crate::routing::matcher::{CatchAllMatcher, ExactMatcher, OneOfMatcher, PrefixMatcher};
use crate::routing::router::Route;

/// Build the route list in priority order, ending with the catch-all.
pub fn default_routes() -> Vec<Route> {
    vec![
        Route::new("proxy_js", PrefixMatcher::new("/cm4all-beng-proxy/"), files::proxy_js),
        Route::new("cgi_bin", PrefixMatcher::new("/cgi-bin/"), scripts::cgi_bin),
        Route::new(
            "cgi_transparent",
            PrefixMatcher::new("/cgi-transparent/"),
            scripts::cgi_transparent,
        ),
        Route::new("cfatest", PrefixMatcher::raw("/cfatest01/"), upstream::cfatest),
        Route::new("transparent", PrefixMatcher::raw("/transparent/"), upstream::transparent),
        Route::new("proxy", PrefixMatcher::raw("/proxy/"), upstream::proxy),
        Route::new("mangle", PrefixMatcher::raw("/mangle/"), upstream::mangle),
        Route::new(
            "vary_user_agent_remote",
            PrefixMatcher::raw("/vary-user-agent/remote/"),
            negotiation::vary_user_agent_remote,
        ),
        Route::new("ajp", PrefixMatcher::raw("/ajp/"), upstream::ajp),
        Route::new("nfs", PrefixMatcher::raw("/nfs/"), upstream::nfs),
        Route::new("fcgi_rb", PrefixMatcher::new("/fcgi.rb"), scripts::fcgi_rb),
        Route::new("discard", ExactMatcher::new("/discard"), files::discard),
        Route::new(
            "device",
            OneOfMatcher::new(["/null", "/zero", "/urandom"]),
            files::device,
        ),
        Route::new("delegate", PrefixMatcher::new("/delegate/"), files::delegate),
        Route::new("jail_delegate", PrefixMatcher::new("/jail-delegate/"), files::jail_delegate),
        Route::new("jail", PrefixMatcher::new("/jail/"), files::jail),
        Route::new("jail_slow", PrefixMatcher::new("/jail-slow/"), files::jail_slow),
        Route::new("jail_home", PrefixMatcher::new("/jail-home/"), files::jail_home),
        Route::new("demo", PrefixMatcher::new("/demo/"), files::demo),
        Route::new("base", PrefixMatcher::new("/base/"), hosting::base),
        Route::new("easy_base", PrefixMatcher::new("/easy-base/"), hosting::easy_base),
        Route::new("coma", PrefixMatcher::new("/coma/"), scripts::coma),
        Route::new("coma_was", PrefixMatcher::new("/coma-was/"), scripts::coma_was),
        Route::new("coma_apps", PrefixMatcher::new("/coma-apps/"), scripts::coma_apps),
        Route::new(
            "image_processor",
            PrefixMatcher::new("/imageprocessor/"),
            scripts::image_processor,
        ),
        Route::new(
            "image_processor_was",
            PrefixMatcher::new("/imageprocessor-was/"),
            scripts::image_processor_was,
        ),
        Route::new(
            "image_processor_filter",
            PrefixMatcher::new("/imageprocessor-filter/"),
            scripts::image_processor_filter,
        ),
        Route::new("lhttp", ExactMatcher::new("/lhttp/"), scripts::lhttp),
        Route::new("lhttp_mirror", ExactMatcher::new("/lhttp/mirror"), scripts::lhttp_mirror),
        Route::new("ticket_create", PrefixMatcher::new("/ticket/create/"), scripts::ticket_create),
        Route::new(
            "ticket_create2",
            PrefixMatcher::new("/ticket/create2/"),
            scripts::ticket_create2,
        ),
        Route::new("ticket_upload", PrefixMatcher::new("/ticket/upload/"), scripts::ticket_upload),
        Route::new(
            "ticket_control",
            PrefixMatcher::new("/ticket/control/"),
            scripts::ticket_control,
        ),
        Route::new("ticket_cleanup", ExactMatcher::new("/ticket/cleanup"), scripts::ticket_cleanup),
        Route::new("filter", ExactMatcher::new("/filter"), filters::pipes),
        Route::new("redirect", ExactMatcher::new("/redirect"), upstream::redirect),
        Route::new(
            "redirect_query_string",
            ExactMatcher::new("/redirect/query_string"),
            upstream::redirect_query_string,
        ),
        Route::new(
            "redirect_permanent",
            ExactMatcher::new("/redirect/permanent"),
            upstream::redirect_permanent,
        ),
        Route::new("redirect_found", ExactMatcher::new("/redirect/found"), upstream::redirect_found),
        Route::new(
            "redirect_temporary",
            ExactMatcher::new("/redirect/temporary"),
            upstream::redirect_temporary,
        ),
        Route::new("bounce", ExactMatcher::new("/bounce"), upstream::bounce),
        Route::new("auth", PrefixMatcher::new("/auth/"), files::auth),
        Route::new("header", PrefixMatcher::new("/header/"), files::header),
        Route::new("xslt", ExactMatcher::new("/xslt"), filters::xslt),
        Route::new("xslt_filter", ExactMatcher::new("/xslt-filter"), filters::xslt_filter),
        Route::new("xmlstrip", ExactMatcher::new("/xmlstrip"), filters::xmlstrip),
        Route::new("sed", ExactMatcher::new("/sed"), filters::sed_pipe),
        Route::new("sed_filter", ExactMatcher::new("/sed-filter"), filters::sed_filter),
        Route::new("remote_sed", ExactMatcher::new("/remote-sed"), filters::remote_sed),
        Route::new("validate_mtime", ExactMatcher::new("/validate_mtime"), files::validate_mtime),
        Route::new(
            "per_host_invalidate",
            ExactMatcher::new("/per_host/invalidate"),
            files::per_host_invalidate,
        ),
        Route::new("per_host", PrefixMatcher::new("/per_host/"), files::per_host),
        Route::new("check", ExactMatcher::new("/check"), negotiation::check),
        Route::new("want_full_uri", PrefixMatcher::new("/want_full_uri"), negotiation::want_full_uri),
        Route::new("balancer", PrefixMatcher::new("/balancer/"), upstream::balancer),
        Route::new("sticky", PrefixMatcher::new("/sticky/"), upstream::sticky),
        Route::new(
            "vary_user_agent_local",
            PrefixMatcher::raw("/vary-user-agent/local/"),
            negotiation::vary_user_agent_local,
        ),
        Route::new("ua_class", ExactMatcher::raw("/ua_class"), negotiation::ua_class),
        Route::new(
            "file_not_found",
            PrefixMatcher::new("/file_not_found/"),
            negotiation::file_not_found,
        ),
        Route::new(
            "directory_index",
            PrefixMatcher::new("/directory_index/"),
            negotiation::directory_index,
        ),
        Route::new("content_type_lookup", PrefixMatcher::new("/ctl/"), files::content_type_lookup),
        Route::new("hosting", PrefixMatcher::raw("/hosting/"), hosting::hosting),
        Route::new("catch_all", CatchAllMatcher, files::catch_all),
    ]
}
