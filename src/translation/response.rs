//! Translation responses and backend descriptors.
//!
//! A [`TranslateResponse`] is a fixed record of optional directives. Route
//! handlers fill it in; the encoder turns it into packets in the order the
//! proxy's parser expects.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::protocol::Command;

/// Where the proxy gets the response body from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResourceAddress {
    /// Static file.
    Local(FileAddress),
    Cgi(CgiAddress),
    #[serde(rename = "fastcgi")]
    FastCgi(CgiAddress),
    /// Web Application Socket process.
    Was(CgiAddress),
    /// Program the body is piped through.
    Pipe(CgiAddress),
    /// Local HTTP process.
    Lhttp(LhttpAddress),
    Http(HttpAddress),
    Ajp(HttpAddress),
    Nfs(NfsAddress),
}

impl ResourceAddress {
    /// Short tag for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ResourceAddress::Local(_) => "local",
            ResourceAddress::Cgi(_) => "cgi",
            ResourceAddress::FastCgi(_) => "fastcgi",
            ResourceAddress::Was(_) => "was",
            ResourceAddress::Pipe(_) => "pipe",
            ResourceAddress::Lhttp(_) => "lhttp",
            ResourceAddress::Http(_) => "http",
            ResourceAddress::Ajp(_) => "ajp",
            ResourceAddress::Nfs(_) => "nfs",
        }
    }

    /// Static file shortcut.
    pub fn local(path: impl Into<String>) -> Self {
        ResourceAddress::Local(FileAddress::new(path))
    }

    /// HTTP proxy shortcut.
    pub fn http(url: impl Into<String>) -> Self {
        ResourceAddress::Http(HttpAddress::new(url))
    }
}

/// A static file, optionally opened through a delegate helper.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAddress {
    pub path: String,
    /// Regex expansion template for `path`.
    pub expand_path: Option<String>,
    /// Helper program that opens the file on behalf of the proxy.
    pub delegate: Option<String>,
    /// Run the delegate inside the jail.
    pub jail: bool,
    /// Pre-compressed sibling file.
    pub gzipped: Option<String>,
}

impl FileAddress {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }
}

/// A program executed by the proxy: CGI, FastCGI, WAS or a pipe filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CgiAddress {
    pub path: String,
    /// Interpreter the script is run with.
    pub action: Option<String>,
    /// Command line arguments.
    pub args: Vec<String>,
    /// Extra environment variables.
    pub pairs: Vec<(String, String)>,
    /// Regex expansion templates for environment variables (`NAME=template`).
    pub expand_pairs: Vec<String>,
    pub script_name: Option<String>,
    pub path_info: Option<String>,
    pub expand_path: Option<String>,
    pub expand_path_info: Option<String>,
    /// Run inside the jail.
    pub jail: bool,
    /// Home directory inside the jail.
    pub home: Option<String>,
    /// Connect to an already running server instead of spawning one.
    pub address: Option<String>,
}

impl CgiAddress {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn pair(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.pairs.push((name.into(), value.into()));
        self
    }

    pub fn expand_pair(mut self, template: impl Into<String>) -> Self {
        self.expand_pairs.push(template.into());
        self
    }

    pub fn script_name(mut self, script_name: impl Into<String>) -> Self {
        self.script_name = Some(script_name.into());
        self
    }

    pub fn path_info(mut self, path_info: impl Into<String>) -> Self {
        self.path_info = Some(path_info.into());
        self
    }

    pub fn expand_path(mut self, template: impl Into<String>) -> Self {
        self.expand_path = Some(template.into());
        self
    }

    pub fn jail(mut self, jail: bool) -> Self {
        self.jail = jail;
        self
    }
}

/// A local HTTP server process spawned by the proxy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LhttpAddress {
    pub path: String,
    pub args: Vec<String>,
    /// URI requested from the process.
    pub uri: String,
    /// Number of concurrent requests per process.
    pub concurrency: Option<u16>,
}

/// A remote HTTP or AJP server, optionally load balanced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpAddress {
    pub url: String,
    /// Candidate socket addresses. More than one means load balancing.
    pub addresses: Vec<String>,
    /// Pin each client to one pool member.
    pub sticky: bool,
}

impl HttpAddress {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn pool<I, S>(mut self, addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.addresses = addresses.into_iter().map(Into::into).collect();
        self
    }
}

/// A file on an NFS export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NfsAddress {
    pub server: String,
    pub export: String,
    pub path: String,
}

/// Header group selector for forwarding directives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i16)]
pub enum HeaderGroup {
    All = -1,
    Identity = 0,
    Capabilities = 1,
    Cookie = 2,
    Other = 3,
    Forward = 4,
}

/// What the proxy does with a header group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ForwardMode {
    No = 0,
    Yes = 1,
    Mangle = 2,
    Both = 3,
}

/// One `(group, mode)` forwarding rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderForward {
    pub group: HeaderGroup,
    pub mode: ForwardMode,
}

impl HeaderForward {
    pub fn all(mode: ForwardMode) -> Self {
        Self {
            group: HeaderGroup::All,
            mode,
        }
    }
}

/// The engine's answer to one [`TranslateRequest`](super::TranslateRequest).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslateResponse {
    /// Version byte sent with `BEGIN`; `None` sends an empty `BEGIN`.
    pub protocol_version: Option<u8>,
    pub status: Option<u16>,

    pub user: Option<String>,
    pub session: Option<String>,
    pub discard_session: bool,
    pub untrusted: Option<String>,
    pub site: Option<String>,

    pub vary: Vec<Command>,
    pub invalidate: Vec<Command>,
    pub max_age: Option<u32>,
    pub expires_relative: Option<u32>,

    pub want: Vec<Command>,
    pub want_full_uri: Option<Bytes>,
    pub check: Option<Bytes>,
    /// Reuse the previously cached answer.
    pub previous: bool,

    pub base: Option<String>,
    pub easy_base: bool,
    pub auto_base: bool,
    pub regex: Option<String>,
    pub inverse_regex: Option<String>,
    pub regex_tail: bool,

    pub scheme: Option<String>,
    pub host: Option<String>,
    pub uri: Option<String>,

    pub document_root: Option<String>,
    pub error_document: bool,
    pub address: Option<ResourceAddress>,

    pub content_type: Option<String>,
    pub process: bool,
    pub container: bool,
    pub stateful: bool,
    pub headers: Vec<(String, String)>,
    pub request_header_forward: Vec<HeaderForward>,
    pub response_header_forward: Vec<HeaderForward>,

    pub redirect: Option<String>,
    pub expand_redirect: Option<String>,
    pub redirect_query_string: bool,
    pub bounce: Option<String>,
    pub www_authenticate: Option<String>,
    pub transparent: bool,

    pub file_not_found: Option<Bytes>,
    pub directory_index: Option<Bytes>,
    pub content_type_lookup: Option<Bytes>,
    /// `(mtime, path)`: drop the cached answer when the file changes.
    pub validate_mtime: Option<(u64, String)>,

    /// Filter chain, applied in order to the primary response body.
    pub filters: Vec<ResourceAddress>,
}

impl TranslateResponse {
    /// Response announcing protocol version 1.
    pub fn new() -> Self {
        Self {
            protocol_version: Some(1),
            ..Default::default()
        }
    }

    /// Response with an unversioned `BEGIN`.
    pub fn unversioned() -> Self {
        Self::default()
    }

    /// Response carrying nothing but a status.
    pub fn with_status(status: u16) -> Self {
        Self {
            status: Some(status),
            ..Self::new()
        }
    }

    pub fn status(&mut self, status: u16) -> &mut Self {
        self.status = Some(status);
        self
    }

    /// Add attributes the cached answer varies on.
    pub fn vary(&mut self, commands: &[Command]) -> &mut Self {
        extend_unique(&mut self.vary, commands);
        self
    }

    /// Add attributes whose cached answers the proxy must drop.
    pub fn invalidate(&mut self, commands: &[Command]) -> &mut Self {
        extend_unique(&mut self.invalidate, commands);
        self
    }

    /// Ask the proxy to resend the request with these attributes.
    pub fn want(&mut self, commands: &[Command]) -> &mut Self {
        extend_unique(&mut self.want, commands);
        self
    }

    pub fn max_age(&mut self, seconds: u32) -> &mut Self {
        self.max_age = Some(seconds);
        self
    }

    pub fn address(&mut self, address: ResourceAddress) -> &mut Self {
        self.address = Some(address);
        self
    }

    /// Static file as the primary resource.
    pub fn path(&mut self, path: impl Into<String>) -> &mut Self {
        self.address(ResourceAddress::local(path))
    }

    /// Append a stage to the filter chain.
    pub fn filter(&mut self, address: ResourceAddress) -> &mut Self {
        self.filters.push(address);
        self
    }

    pub fn header(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn document_root(&mut self, path: impl Into<String>) -> &mut Self {
        self.document_root = Some(path.into());
        self
    }

    pub fn base(&mut self, base: impl Into<String>) -> &mut Self {
        self.base = Some(base.into());
        self
    }

    /// Regex with a tail match, as used by every `REGEX_TAIL` route.
    pub fn regex_tail(&mut self, regex: impl Into<String>) -> &mut Self {
        self.regex = Some(regex.into());
        self.regex_tail = true;
        self
    }

    pub fn redirect(&mut self, url: impl Into<String>) -> &mut Self {
        self.redirect = Some(url.into());
        self
    }

    /// Whether this answer only asks the proxy for more context.
    pub fn is_negotiation(&self) -> bool {
        if self.want.is_empty() && self.want_full_uri.is_none() {
            return false;
        }

        let mut rest = self.clone();
        rest.want.clear();
        rest.want_full_uri = None;
        rest == TranslateResponse {
            protocol_version: self.protocol_version,
            ..Default::default()
        }
    }
}

fn extend_unique(target: &mut Vec<Command>, commands: &[Command]) {
    for command in commands {
        if !target.contains(command) {
            target.push(*command);
        }
    }
}
