//! Unix and TCP listener with backpressure.
//!
//! # Responsibilities
//! - Bind to the configured address (socket path or `host:port`)
//! - Accept incoming connections
//! - Enforce max_connections limit via semaphore
//! - Remove the socket file when the listener goes away

use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream, UnixListener, UnixStream};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::config::ListenerConfig;

/// Error type for listener operations.
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to accept: {0}")]
    Accept(#[source] io::Error),

    #[error("listener closed")]
    Closed,
}

/// Where a listener is bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenAddress {
    Unix(PathBuf),
    Tcp(SocketAddr),
}

impl fmt::Display for ListenAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListenAddress::Unix(path) => write!(f, "unix:{}", path.display()),
            ListenAddress::Tcp(addr) => write!(f, "tcp:{}", addr),
        }
    }
}

/// Whether `address` names a socket path rather than `host:port`.
pub fn is_unix_address(address: &str) -> bool {
    address.contains('/')
}

/// An accepted stream of either kind.
#[derive(Debug)]
pub enum Incoming {
    Unix(UnixStream),
    Tcp(TcpStream, SocketAddr),
}

#[derive(Debug)]
enum Inner {
    Unix { listener: UnixListener, path: PathBuf },
    Tcp(TcpListener),
}

/// A bounded listener that limits concurrent connections.
///
/// Uses a semaphore to enforce `max_connections`. When the limit is reached,
/// new connections will wait until a slot becomes available.
#[derive(Debug)]
pub struct Listener {
    inner: Inner,
    connection_limit: Arc<Semaphore>,
    max_connections: usize,
}

impl Listener {
    /// Bind to the configured address with connection limits.
    ///
    /// A stale socket file at the path is replaced.
    pub async fn bind(config: &ListenerConfig) -> Result<Self, ListenerError> {
        let address = config.address.as_str();
        let bind_error = |source: io::Error| ListenerError::Bind {
            address: address.to_string(),
            source,
        };

        let inner = if is_unix_address(address) {
            let path = PathBuf::from(address);
            match std::fs::remove_file(&path) {
                Err(e) if e.kind() != io::ErrorKind::NotFound => return Err(bind_error(e)),
                _ => {}
            }
            let listener = UnixListener::bind(&path).map_err(bind_error)?;
            Inner::Unix { listener, path }
        } else {
            Inner::Tcp(TcpListener::bind(address).await.map_err(bind_error)?)
        };

        let listener = Self {
            inner,
            connection_limit: Arc::new(Semaphore::new(config.max_connections)),
            max_connections: config.max_connections,
        };

        tracing::info!(
            address = %listener.local_addr().map_err(bind_error)?,
            max_connections = config.max_connections,
            "Listener bound"
        );

        Ok(listener)
    }

    /// Accept a new connection, respecting the connection limit.
    ///
    /// This will wait if the connection limit has been reached.
    /// Returns the stream and a permit that must be held for the connection's lifetime.
    pub async fn accept(&self) -> Result<(Incoming, ConnectionPermit), ListenerError> {
        // Acquire permit first (backpressure)
        let permit = self
            .connection_limit
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| ListenerError::Closed)?;

        let incoming = match &self.inner {
            Inner::Unix { listener, .. } => {
                let (stream, _) = listener.accept().await.map_err(ListenerError::Accept)?;
                Incoming::Unix(stream)
            }
            Inner::Tcp(listener) => {
                let (stream, addr) = listener.accept().await.map_err(ListenerError::Accept)?;
                Incoming::Tcp(stream, addr)
            }
        };

        tracing::debug!(
            available_permits = self.connection_limit.available_permits(),
            "Connection accepted"
        );

        Ok((incoming, ConnectionPermit { _permit: permit }))
    }

    /// Get the address this listener is bound to.
    pub fn local_addr(&self) -> io::Result<ListenAddress> {
        match &self.inner {
            Inner::Unix { path, .. } => Ok(ListenAddress::Unix(path.clone())),
            Inner::Tcp(listener) => listener.local_addr().map(ListenAddress::Tcp),
        }
    }

    /// Get current available connection slots.
    pub fn available_permits(&self) -> usize {
        self.connection_limit.available_permits()
    }

    /// Get configured maximum connections.
    pub fn max_connections(&self) -> usize {
        self.max_connections
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        if let Inner::Unix { path, .. } = &self.inner {
            if let Err(e) = std::fs::remove_file(path) {
                tracing::debug!(path = %path.display(), error = %e, "Socket file not removed");
            }
        }
    }
}

/// A permit representing a connection slot.
///
/// When dropped, the connection slot is released back to the pool.
/// This ensures backpressure is maintained even if the connection handler panics.
#[derive(Debug)]
pub struct ConnectionPermit {
    _permit: OwnedSemaphorePermit,
}
