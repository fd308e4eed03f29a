//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! translation server. All types derive Serde traits for deserialization
//! from config files, and every section has defaults so an empty file is a
//! valid configuration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Root configuration for the translation server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TranslationConfig {
    /// Listener configuration (socket address, connection limit).
    pub listener: ListenerConfig,

    /// Wire protocol limits.
    pub protocol: ProtocolConfig,

    /// Filesystem locations used by the route table.
    pub paths: PathsConfig,

    /// Remote servers the route table points the proxy at.
    pub upstream: UpstreamConfig,

    /// Basic authentication for the `/auth/` routes.
    pub auth: AuthConfig,

    /// Suffix to MIME type table answering `CONTENT_TYPE_LOOKUP`.
    pub content_types: ContentTypes,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Unix socket path, or `host:port` for TCP.
    pub address: String,

    /// Maximum concurrent connections (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            address: "/tmp/beng-proxy-translate".to_string(),
            max_connections: 1024,
        }
    }
}

/// Wire protocol configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Largest accepted packet payload in bytes.
    pub max_payload_size: usize,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            max_payload_size: u16::MAX as usize,
        }
    }
}

/// Filesystem locations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Widget class descriptions, one `<type>.toml` per class.
    pub widgets: String,
    /// Directory holding the delegate helper.
    pub helpers: String,
    /// Delegate helper path inside the jail.
    pub jail_delegate_helper: String,
    pub cgi: String,
    pub demo: String,
    /// Test programs (`fcgi.rb`, `run_http_server`).
    pub test: String,
    /// Proxy-side JavaScript served below `/cm4all-beng-proxy/`.
    pub js: String,
    pub document_root: String,
    /// Document root of jailed sites.
    pub jail_root: String,
    /// Document root used by `/jail-home/`.
    pub jail_home_document_root: String,
    /// `HOME` used by `/jail-home/`.
    pub jail_home: String,
    pub php_action: String,
    /// PHP interpreter inside the jail.
    pub jail_php_action: String,
    pub coma_fastcgi: String,
    pub coma_was: String,
    /// COMA classes served below `/coma/` and `/coma-was/`.
    pub coma_source: String,
    /// Installed COMA applications, `<name>/htdocs` each.
    pub coma_apps: String,
    /// Per-application COMA configuration, `<name>/coma.config` each.
    pub coma_apps_config: String,
    pub image_processor: String,
    pub image_processor_config: String,
    pub ticket_fastcgi: String,
    pub ticket_database: String,
    pub xslt_fastcgi: String,
    pub xmlstrip: String,
    pub sed_fastcgi: String,
    /// Socket of the already running sed FastCGI server.
    pub sed_socket: String,
    /// File whose modification time `/validate_mtime` reports.
    pub stamp: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            widgets: "/etc/cm4all/beng/widgets".to_string(),
            helpers: "/usr/bin".to_string(),
            jail_delegate_helper: "/usr/bin/cm4all-beng-proxy-delegate-helper".to_string(),
            cgi: "/usr/lib/cgi-bin".to_string(),
            demo: "/usr/share/cm4all/beng-proxy/demo/htdocs".to_string(),
            test: "test".to_string(),
            js: "/usr/share/cm4all/beng-proxy/js/".to_string(),
            document_root: "/var/www".to_string(),
            jail_root: "/home/www".to_string(),
            jail_home_document_root: "/var/www/htdocs".to_string(),
            jail_home: "/var/www".to_string(),
            php_action: "/usr/bin/php5-cgi".to_string(),
            jail_php_action: "/usr/bin/php-cgi5".to_string(),
            coma_fastcgi: "/usr/bin/cm4all-coma-fastcgi".to_string(),
            coma_was: "/usr/lib/cm4all/was/bin/coma-was".to_string(),
            coma_source: "/usr/share/cm4all/coma/src".to_string(),
            coma_apps: "/usr/share/cm4all/coma/apps".to_string(),
            coma_apps_config: "/etc/cm4all/coma/apps".to_string(),
            image_processor: "/usr/share/cm4all/coma/apps/imageprocessor/htdocs".to_string(),
            image_processor_config: "/etc/cm4all/coma/apps/imageprocessor/coma.config"
                .to_string(),
            ticket_fastcgi: "/usr/lib/cm4all/ticket/cgi-bin".to_string(),
            ticket_database: "codb:sqlite:/tmp/ticket.sqlite".to_string(),
            xslt_fastcgi: "/usr/lib/cm4all/fcgi-bin/xslt".to_string(),
            xmlstrip: "/usr/lib/cm4all/was/bin/xmlstrip".to_string(),
            sed_fastcgi: "/usr/lib/cm4all/fcgi-bin/fsed".to_string(),
            sed_socket: "/tmp/sed.socket".to_string(),
            stamp: "/tmp/stamp".to_string(),
        }
    }
}

/// Remote servers.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL for the HTTP proxy routes and redirects.
    pub http_base: String,
    /// Base URL for `/ajp/`.
    pub ajp_base: String,
    /// Socket address of the AJP server.
    pub ajp_address: String,
    pub nfs_server: String,
    pub nfs_export: String,
    /// Members of the load-balanced pool (`/balancer/`, `/sticky/`).
    pub pool: Vec<String>,
    /// Host the `/base/` and `/easy-base/` routes rewrite to.
    pub rewrite_host: String,
    /// `BOUNCE` target.
    pub bounce: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            http_base: "http://cfatest01.intern.cm-ag/".to_string(),
            ajp_base: "ajp://cfatest01.intern.cm-ag:8009".to_string(),
            ajp_address: "cfatest01.intern.cm-ag:8009".to_string(),
            nfs_server: "172.28.0.8".to_string(),
            nfs_export: "/srv/nfs4/foo".to_string(),
            pool: vec!["172.30.0.23:80".to_string(), "172.30.0.23:8080".to_string()],
            rewrite_host: "xyz.intern.cm-ag".to_string(),
            bounce: "http://cfatest01.intern.cm-ag/test?uri=".to_string(),
        }
    }
}

/// Basic authentication.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Realm announced in `WWW-Authenticate`.
    pub realm: String,

    /// User name to password.
    pub users: BTreeMap<String, String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            realm: "Demo".to_string(),
            users: BTreeMap::new(),
        }
    }
}

/// Suffix to MIME type table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct ContentTypes(pub BTreeMap<String, String>);

impl ContentTypes {
    pub fn lookup(&self, suffix: &str) -> Option<&str> {
        self.0.get(suffix).map(String::as_str)
    }
}

impl Default for ContentTypes {
    fn default() -> Self {
        let table = [
            ("html", "text/html"),
            ("txt", "text/plain"),
            ("jpg", "image/jpeg"),
            ("jpeg", "image/jpeg"),
            ("png", "image/png"),
        ];
        Self(
            table
                .into_iter()
                .map(|(suffix, mime)| (suffix.to_string(), mime.to_string()))
                .collect(),
        )
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins.
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable the Prometheus endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
