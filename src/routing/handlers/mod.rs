//! Route handlers and the policies they share.
//!
//! # Responsibilities
//! - Local file policy: scripts become CGI/FastCGI, static files get
//!   caching and content attributes
//! - COMA application policy
//! - Path helpers that never panic on odd URIs
//!
//! # Design Decisions
//! - Handlers are plain functions; the table owns ordering
//! - Every path and upstream comes from `TranslationConfig`

pub mod files;
pub mod filters;
pub mod hosting;
pub mod negotiation;
pub mod scripts;
pub mod upstream;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::routing::router::RouteContext;
use crate::translation::response::{CgiAddress, FileAddress, ResourceAddress, TranslateResponse};

static CGI_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.(?:sh|rb|py|pl|cgi)$").expect("valid regex"));
static PHP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.*\.php\d*)((?:/.*)?)$").expect("valid regex"));

/// Join a directory and a relative name with exactly one slash.
pub(crate) fn join(dir: &str, name: &str) -> String {
    format!(
        "{}/{}",
        dir.trim_end_matches('/'),
        name.trim_start_matches('/')
    )
}

/// What follows `prefix` in `uri`. Never panics, even when the prefix
/// matched a different URI form than the one being sliced.
pub(crate) fn rest<'a>(uri: &'a str, prefix: &str) -> &'a str {
    uri.strip_prefix(prefix)
        .or_else(|| uri.get(prefix.len()..))
        .unwrap_or("")
}

/// Options of the local file policy.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LocalFile {
    /// Open static files through the delegate helper.
    pub delegate: bool,
    pub jail: bool,
    /// Run PHP as FastCGI rather than CGI.
    pub fastcgi: bool,
    pub error_document: bool,
}

impl Default for LocalFile {
    fn default() -> Self {
        Self {
            delegate: false,
            jail: false,
            fastcgi: true,
            error_document: false,
        }
    }
}

impl LocalFile {
    /// Serve `path`, picking an executor by file name.
    pub fn apply(self, ctx: &RouteContext<'_>, path: &str, response: &mut TranslateResponse) {
        let paths = &ctx.config.paths;
        response.document_root(paths.document_root.as_str());
        response.error_document = self.error_document;

        if path.get(1..).is_some_and(|p| CGI_RE.is_match(p)) {
            response.address(ResourceAddress::Cgi(CgiAddress::new(path)));
            return;
        }

        if let Some(m) = PHP_RE.captures(path) {
            let action = if self.jail {
                &paths.jail_php_action
            } else {
                &paths.php_action
            };
            let script = CgiAddress::new(&m[1])
                .action(action.as_str())
                .path_info(&m[2])
                .jail(self.jail);
            response.address(if self.fastcgi {
                ResourceAddress::FastCgi(script)
            } else {
                ResourceAddress::Cgi(script)
            });
            response.auto_base = true;
            return;
        }

        if path.ends_with(".cls") {
            response.address(ResourceAddress::FastCgi(
                CgiAddress::new(path)
                    .action(paths.coma_fastcgi.as_str())
                    .pair("UPLOAD_BUFFER_SIZE", "4M")
                    .jail(self.jail),
            ));
            return;
        }

        let mut file = FileAddress::new(path);
        if self.delegate && self.jail {
            file.delegate = Some(paths.jail_delegate_helper.clone());
            file.jail = true;
        } else if self.delegate {
            file.delegate = Some(join(&paths.helpers, "cm4all-beng-proxy-delegate-helper"));
        }

        if path.ends_with(".html") {
            response.content_type = Some("text/html; charset=utf-8".to_string());
            response.process = true;
            response.container = true;
        } else if path.ends_with(".txt") {
            response.content_type = Some("text/plain; charset=utf-8".to_string());
            file.gzipped = Some(format!("{}.gz", path));
        }

        response.address(ResourceAddress::Local(file));
        response.expires_relative = Some(1800);
    }
}

/// Serve a file below the document root.
pub(crate) fn document(ctx: &RouteContext<'_>, tail: &str, response: &mut TranslateResponse) {
    let path = join(&ctx.config.paths.document_root, tail);
    LocalFile::default().apply(ctx, &path, response);
}

/// A COMA application mounted at `base_uri`.
#[derive(Debug, Clone)]
pub(crate) struct Coma<'a> {
    pub base_uri: &'a str,
    pub base_path: &'a str,
    pub config_file: Option<String>,
    /// Run through the WAS wrapper instead of FastCGI.
    pub was: bool,
}

impl Coma<'_> {
    /// `relative_uri` is `<class>[/<path_info>]`.
    pub fn apply(&self, ctx: &RouteContext<'_>, relative_uri: &str, response: &mut TranslateResponse) {
        let paths = &ctx.config.paths;
        let split = relative_uri.find('/').unwrap_or(relative_uri.len());
        let (relative_path, path_info) = relative_uri.split_at(split);
        let path = join(self.base_path, relative_path);
        let script_name = format!("{}{}", self.base_uri, relative_path);

        response.document_root(self.base_path);

        let mut script = if self.was {
            CgiAddress::new(paths.coma_was.as_str()).pair("COMA_CLASS", path)
        } else {
            CgiAddress::new(path).action(paths.coma_fastcgi.as_str())
        };
        script = script.script_name(script_name.as_str()).path_info(path_info);
        if let Some(config_file) = &self.config_file {
            script = script.pair("COMA_CONFIG_FILE", config_file.as_str());
        }

        response.address(if self.was {
            ResourceAddress::Was(script)
        } else {
            ResourceAddress::FastCgi(script)
        });

        if path_info.starts_with('/') {
            response.base(format!("{}/", script_name));
        }
    }
}
