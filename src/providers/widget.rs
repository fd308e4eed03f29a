//! Widget class registry.
//!
//! # Responsibilities
//! - Resolve a widget type name to its backend and processing flags
//! - Reject type names that could escape the registry directory
//!
//! # Design Decisions
//! - Lookups are async: the registry may live on slow storage, and the
//!   connection driver awaits them off the dispatch path
//! - One `<type>.toml` per class, parsed with serde on every lookup so edits
//!   take effect without a restart

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::translation::response::{ResourceAddress, TranslateResponse};

/// Error type for widget lookups.
#[derive(Debug, thiserror::Error)]
pub enum WidgetError {
    #[error("invalid widget type name: {0:?}")]
    InvalidName(String),

    #[error("IO error reading widget class {name}: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed widget class {name}: {source}")]
    Parse {
        name: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Description of one widget class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetClass {
    pub address: ResourceAddress,
    #[serde(default)]
    pub process: bool,
    #[serde(default)]
    pub container: bool,
    #[serde(default)]
    pub stateful: bool,
    #[serde(default)]
    pub content_type: Option<String>,
}

impl WidgetClass {
    /// The translation answer describing this class.
    pub fn to_response(&self) -> TranslateResponse {
        let mut response = TranslateResponse::unversioned();
        response.address(self.address.clone());
        response.content_type = self.content_type.clone();
        response.process = self.process;
        response.container = self.container;
        response.stateful = self.stateful;
        response
    }
}

/// Source of widget class descriptions.
#[async_trait]
pub trait WidgetRegistry: Send + Sync + std::fmt::Debug {
    /// Look up a class; `Ok(None)` when the type is unknown.
    async fn lookup(&self, widget_type: &str) -> Result<Option<WidgetClass>, WidgetError>;
}

/// Registry backed by a directory of TOML files.
#[derive(Debug, Clone)]
pub struct DirectoryWidgetRegistry {
    dir: PathBuf,
}

impl DirectoryWidgetRegistry {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

/// Widget type names are restricted to `[-_A-Za-z0-9]+`.
pub fn is_valid_widget_type(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

#[async_trait]
impl WidgetRegistry for DirectoryWidgetRegistry {
    async fn lookup(&self, widget_type: &str) -> Result<Option<WidgetClass>, WidgetError> {
        if !is_valid_widget_type(widget_type) {
            return Err(WidgetError::InvalidName(widget_type.to_string()));
        }

        let path = self.dir.join(format!("{}.toml", widget_type));
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(widget_type, path = %path.display(), "Widget class not found");
                return Ok(None);
            }
            Err(source) => {
                return Err(WidgetError::Io {
                    name: widget_type.to_string(),
                    source,
                })
            }
        };

        let class = toml::from_str(&content).map_err(|source| WidgetError::Parse {
            name: widget_type.to_string(),
            source,
        })?;
        Ok(Some(class))
    }
}
