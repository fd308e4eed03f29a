//! Accept loop tying listener, connections and engine together.
//!
//! # Responsibilities
//! - Accept connections until shutdown
//! - Spawn one task per connection
//! - Drain open connections within a deadline, then release the socket
//!
//! # Design Decisions
//! - Accept errors are logged and retried after a short pause
//! - The engine is shared read-only across every connection task

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};

use crate::lifecycle::Shutdown;
use crate::net::{Connection, ConnectionPermit, ConnectionTracker, Incoming, Listener, ListenerError};
use crate::translation::Engine;

/// How long open connections may keep running after shutdown.
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// The translation server.
#[derive(Debug)]
pub struct TranslationServer {
    engine: Arc<Engine>,
    listener: Listener,
    tracker: ConnectionTracker,
}

impl TranslationServer {
    pub fn new(engine: Arc<Engine>, listener: Listener) -> Self {
        Self {
            engine,
            listener,
            tracker: ConnectionTracker::new(),
        }
    }

    pub fn listener(&self) -> &Listener {
        &self.listener
    }

    /// Serve until `shutdown` triggers.
    ///
    /// The listener (and with it a Unix socket file) is dropped on return.
    pub async fn run(self, shutdown: &Shutdown) -> Result<(), ListenerError> {
        let mut stop = shutdown.subscribe();

        loop {
            let accepted = tokio::select! {
                accepted = self.listener.accept() => accepted,
                _ = stop.recv() => {
                    tracing::info!("Accept loop received shutdown signal");
                    break;
                }
            };

            match accepted {
                Ok((Incoming::Unix(stream), permit)) => self.spawn(stream, permit, shutdown),
                Ok((Incoming::Tcp(stream, peer), permit)) => {
                    tracing::debug!(peer_addr = %peer, "TCP peer connected");
                    self.spawn(stream, permit, shutdown)
                }
                Err(ListenerError::Closed) => return Err(ListenerError::Closed),
                Err(e) => {
                    tracing::warn!(error = %e, "Accept failed");
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                }
            }
        }

        let open = self.tracker.active_count();
        if open > 0 {
            tracing::info!(connections = open, "Draining connections");
            if tokio::time::timeout(DRAIN_TIMEOUT, self.tracker.wait_idle())
                .await
                .is_err()
            {
                tracing::warn!(
                    connections = self.tracker.active_count(),
                    "Drain deadline passed, abandoning connections"
                );
            }
        }

        tracing::info!("Translation server stopped");
        Ok(())
    }

    fn spawn<S>(&self, stream: S, permit: ConnectionPermit, shutdown: &Shutdown)
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let connection = Connection::new(stream, Arc::clone(&self.engine), self.tracker.track());
        let stop = shutdown.subscribe();

        tokio::spawn(async move {
            let id = connection.id();
            if let Err(e) = connection.run(stop).await {
                tracing::debug!(connection_id = %id, error = %e, "Connection ended with error");
            }
            drop(permit);
        });
    }
}
