//! Response serialization.
//!
//! # Responsibilities
//! - Turn a [`TranslateResponse`] into the packet sequence the proxy reads
//! - Keep scoping order: `BASE` before the regex directives it scopes,
//!   descriptor attributes right after their descriptor, filters last
//!
//! # Design Decisions
//! - One canonical order for all responses; handlers never order packets
//! - Each filter stage is `FILTER` followed by that stage's descriptor, so a
//!   stage cannot absorb packets meant for the primary resource

use bytes::{BufMut, BytesMut};

use crate::protocol::{Command, Packet};
use crate::translation::response::{
    CgiAddress, FileAddress, HeaderForward, HttpAddress, LhttpAddress, NfsAddress,
    ResourceAddress, TranslateResponse,
};

/// Accumulates outgoing packets.
#[derive(Debug, Default)]
struct PacketWriter {
    packets: Vec<Packet>,
}

impl PacketWriter {
    fn flag(&mut self, command: Command) {
        self.packets.push(Packet::empty(command));
    }

    fn flag_if(&mut self, command: Command, set: bool) {
        if set {
            self.flag(command);
        }
    }

    fn string(&mut self, command: Command, value: &str) {
        self.packets.push(Packet::string(command, value));
    }

    fn opt_string(&mut self, command: Command, value: Option<&str>) {
        if let Some(value) = value {
            self.string(command, value);
        }
    }

    fn bytes(&mut self, command: Command, value: Option<&bytes::Bytes>) {
        if let Some(value) = value {
            self.packets.push(Packet::new(command, value.clone()));
        }
    }

    fn commands(&mut self, command: Command, values: &[Command]) {
        if !values.is_empty() {
            self.packets.push(Packet::commands(command, values));
        }
    }

    fn header_forward(&mut self, command: Command, rules: &[HeaderForward]) {
        if rules.is_empty() {
            return;
        }
        let mut buf = BytesMut::with_capacity(rules.len() * 4);
        for rule in rules {
            buf.put_i16_le(rule.group as i16);
            buf.put_u16_le(rule.mode as u16);
        }
        self.packets.push(Packet::new(command, buf.freeze()));
    }

    fn address(&mut self, address: &ResourceAddress) {
        match address {
            ResourceAddress::Local(file) => self.file(file),
            ResourceAddress::Cgi(cgi) => self.cgi(Command::Cgi, cgi),
            ResourceAddress::FastCgi(cgi) => self.cgi(Command::FastCgi, cgi),
            ResourceAddress::Was(cgi) => self.cgi(Command::Was, cgi),
            ResourceAddress::Pipe(cgi) => self.cgi(Command::Pipe, cgi),
            ResourceAddress::Lhttp(lhttp) => self.lhttp(lhttp),
            ResourceAddress::Http(http) => self.http(Command::Http, http),
            ResourceAddress::Ajp(http) => self.http(Command::Ajp, http),
            ResourceAddress::Nfs(nfs) => self.nfs(nfs),
        }
    }

    fn file(&mut self, file: &FileAddress) {
        self.string(Command::Path, &file.path);
        self.opt_string(Command::ExpandPath, file.expand_path.as_deref());
        self.opt_string(Command::Delegate, file.delegate.as_deref());
        self.flag_if(Command::JailCgi, file.jail);
        self.opt_string(Command::Gzipped, file.gzipped.as_deref());
    }

    fn cgi(&mut self, command: Command, cgi: &CgiAddress) {
        self.string(command, &cgi.path);
        self.opt_string(Command::AddressString, cgi.address.as_deref());
        for arg in &cgi.args {
            self.string(Command::Append, arg);
        }
        self.opt_string(Command::ExpandPath, cgi.expand_path.as_deref());
        self.opt_string(Command::Action, cgi.action.as_deref());
        self.opt_string(Command::ScriptName, cgi.script_name.as_deref());
        self.opt_string(Command::PathInfo, cgi.path_info.as_deref());
        self.opt_string(Command::ExpandPathInfo, cgi.expand_path_info.as_deref());
        for (name, value) in &cgi.pairs {
            self.string(Command::Pair, &format!("{}={}", name, value));
        }
        for template in &cgi.expand_pairs {
            self.string(Command::ExpandPair, template);
        }
        self.flag_if(Command::JailCgi, cgi.jail);
        self.opt_string(Command::Home, cgi.home.as_deref());
    }

    fn lhttp(&mut self, lhttp: &LhttpAddress) {
        self.string(Command::LhttpPath, &lhttp.path);
        for arg in &lhttp.args {
            self.string(Command::Append, arg);
        }
        self.string(Command::LhttpUri, &lhttp.uri);
        if let Some(concurrency) = lhttp.concurrency {
            self.packets.push(Packet::u16(Command::Concurrency, concurrency));
        }
    }

    fn http(&mut self, command: Command, http: &HttpAddress) {
        self.string(command, &http.url);
        for address in &http.addresses {
            self.string(Command::AddressString, address);
        }
        self.flag_if(Command::Sticky, http.sticky);
    }

    fn nfs(&mut self, nfs: &NfsAddress) {
        self.string(Command::NfsServer, &nfs.server);
        self.string(Command::NfsExport, &nfs.export);
        self.string(Command::Path, &nfs.path);
    }
}

/// Serialize a response, `BEGIN` through `END`.
pub fn encode_response(response: &TranslateResponse) -> Vec<Packet> {
    let mut w = PacketWriter::default();

    match response.protocol_version {
        Some(version) => w.packets.push(Packet::new(Command::Begin, vec![version])),
        None => w.flag(Command::Begin),
    }

    w.opt_string(Command::User, response.user.as_deref());
    w.opt_string(Command::Session, response.session.as_deref());
    w.flag_if(Command::DiscardSession, response.discard_session);
    w.opt_string(Command::Untrusted, response.untrusted.as_deref());
    w.opt_string(Command::Site, response.site.as_deref());

    w.commands(Command::Vary, &response.vary);
    w.commands(Command::Invalidate, &response.invalidate);
    if let Some(max_age) = response.max_age {
        w.packets.push(Packet::u32(Command::MaxAge, max_age));
    }
    if let Some(seconds) = response.expires_relative {
        w.packets.push(Packet::u32(Command::ExpiresRelative, seconds));
    }

    w.commands(Command::Want, &response.want);
    w.bytes(Command::WantFullUri, response.want_full_uri.as_ref());
    w.bytes(Command::Check, response.check.as_ref());
    w.flag_if(Command::Previous, response.previous);

    if let Some(status) = response.status {
        w.packets.push(Packet::u16(Command::Status, status));
    }

    w.opt_string(Command::Base, response.base.as_deref());
    w.flag_if(Command::EasyBase, response.easy_base);
    w.opt_string(Command::Regex, response.regex.as_deref());
    w.opt_string(Command::InverseRegex, response.inverse_regex.as_deref());
    w.flag_if(Command::RegexTail, response.regex_tail);

    w.opt_string(Command::Scheme, response.scheme.as_deref());
    w.opt_string(Command::Host, response.host.as_deref());
    w.opt_string(Command::Uri, response.uri.as_deref());

    w.opt_string(Command::DocumentRoot, response.document_root.as_deref());
    w.flag_if(Command::ErrorDocument, response.error_document);

    if let Some(address) = &response.address {
        w.address(address);
    }
    w.flag_if(Command::AutoBase, response.auto_base);

    w.opt_string(Command::ContentType, response.content_type.as_deref());
    w.flag_if(Command::Process, response.process);
    w.flag_if(Command::Container, response.container);
    w.flag_if(Command::Stateful, response.stateful);
    for (name, value) in &response.headers {
        w.string(Command::Header, &format!("{}:{}", name, value));
    }
    w.header_forward(Command::RequestHeaderForward, &response.request_header_forward);
    w.header_forward(Command::ResponseHeaderForward, &response.response_header_forward);

    w.opt_string(Command::Redirect, response.redirect.as_deref());
    w.opt_string(Command::ExpandRedirect, response.expand_redirect.as_deref());
    w.flag_if(Command::RedirectQueryString, response.redirect_query_string);
    w.opt_string(Command::Bounce, response.bounce.as_deref());
    w.opt_string(Command::WwwAuthenticate, response.www_authenticate.as_deref());
    w.flag_if(Command::Transparent, response.transparent);

    w.bytes(Command::FileNotFound, response.file_not_found.as_ref());
    w.bytes(Command::DirectoryIndex, response.directory_index.as_ref());
    w.bytes(Command::ContentTypeLookup, response.content_type_lookup.as_ref());
    if let Some((mtime, path)) = &response.validate_mtime {
        let mut buf = BytesMut::with_capacity(8 + path.len());
        buf.put_u64_le(*mtime);
        buf.extend_from_slice(path.as_bytes());
        w.packets.push(Packet::new(Command::ValidateMtime, buf.freeze()));
    }

    for filter in &response.filters {
        w.flag(Command::Filter);
        w.address(filter);
    }

    w.flag(Command::End);
    w.packets
}
