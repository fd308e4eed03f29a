//! Per-connection protocol driver and lifecycle tracking.
//!
//! # Responsibilities
//! - Generate unique connection IDs for tracing
//! - Track open connections for graceful shutdown
//! - Run the read → assemble → dispatch → write loop of one connection
//!
//! # Design Decisions
//! - One task per connection; assembler state is private to it
//! - A pending dispatch runs in its own task and reports back over a
//!   oneshot; packets arriving meanwhile are queued, not processed
//! - A framing error ends the connection, nothing else does

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{broadcast, oneshot};
use tokio_util::codec::Framed;

use crate::observability::metrics;
use crate::protocol::{FramingError, Packet, PacketCodec};
use crate::translation::{encode_response, Dispatch, Engine, RequestAssembler, TranslateResponse};

/// Global atomic counter for connection IDs.
/// Using relaxed ordering is sufficient since we only need uniqueness, not synchronization.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Generate a new unique connection ID.
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Tracks open connections for graceful shutdown.
#[derive(Debug, Clone, Default)]
pub struct ConnectionTracker {
    active_count: Arc<AtomicU64>,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new connection. Returns a guard that decrements on drop.
    pub fn track(&self) -> ConnectionGuard {
        self.active_count.fetch_add(1, Ordering::SeqCst);
        metrics::record_connection_opened();
        let id = ConnectionId::new();
        tracing::debug!(connection_id = %id, "Connection opened");
        ConnectionGuard {
            active_count: Arc::clone(&self.active_count),
            id,
        }
    }

    pub fn active_count(&self) -> u64 {
        self.active_count.load(Ordering::SeqCst)
    }

    /// Wait until every tracked connection has closed.
    pub async fn wait_idle(&self) {
        while self.active_count.load(Ordering::SeqCst) > 0 {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }
}

/// Guard that tracks a connection's lifetime.
/// Decrements active count when dropped.
#[derive(Debug)]
pub struct ConnectionGuard {
    active_count: Arc<AtomicU64>,
    id: ConnectionId,
}

impl ConnectionGuard {
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.active_count.fetch_sub(1, Ordering::SeqCst);
        metrics::record_connection_closed();
        tracing::debug!(connection_id = %self.id, "Connection closed");
    }
}

/// Protocol state of one proxy connection.
pub struct Connection<S> {
    framed: Framed<S, PacketCodec>,
    engine: Arc<Engine>,
    assembler: RequestAssembler,
    /// Packets read while a dispatch was pending.
    queued: VecDeque<Packet>,
    guard: ConnectionGuard,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, engine: Arc<Engine>, guard: ConnectionGuard) -> Self {
        let codec = PacketCodec::new(engine.config().protocol.max_payload_size);
        Self {
            framed: Framed::new(stream, codec),
            engine,
            assembler: RequestAssembler::new(),
            queued: VecDeque::new(),
            guard,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.guard.id()
    }

    /// Serve requests until the peer closes, the stream breaks or shutdown
    /// is signalled.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) -> Result<(), FramingError> {
        let id = self.id();

        loop {
            let packet = match self.queued.pop_front() {
                Some(packet) => packet,
                None => {
                    let next = tokio::select! {
                        next = self.framed.next() => next,
                        _ = shutdown.recv() => {
                            tracing::debug!(connection_id = %id, "Connection received shutdown signal");
                            return Ok(());
                        }
                    };
                    match next {
                        Some(packet) => packet.map_err(|e| self.framing_error(e))?,
                        None => return Ok(()),
                    }
                }
            };

            let request = match self.assembler.push(packet) {
                Ok(Some(request)) => request,
                Ok(None) => continue,
                Err(e) => return Err(self.framing_error(e)),
            };

            tracing::debug!(
                connection_id = %id,
                uri = ?request.uri,
                widget_type = ?request.widget_type,
                "Request complete"
            );

            let response = match self.engine.dispatch(&request) {
                Dispatch::Ready(response) => response,
                Dispatch::Pending(future) => match self.wait_pending(future).await? {
                    Some(response) => response,
                    None => {
                        tracing::debug!(connection_id = %id, "Peer closed during pending lookup");
                        return Ok(());
                    }
                },
            };

            self.write(&response).await?;
        }
    }

    /// Run `future` in its own task, queueing incoming packets until it
    /// finishes. `None` if the peer went away first.
    async fn wait_pending(
        &mut self,
        future: BoxFuture<'static, TranslateResponse>,
    ) -> Result<Option<TranslateResponse>, FramingError> {
        let id = self.id();
        let (tx, mut rx) = oneshot::channel();
        tokio::spawn(async move {
            if tx.send(future.await).is_err() {
                tracing::debug!(connection_id = %id, "Discarding lookup result for closed connection");
            }
        });

        loop {
            tokio::select! {
                result = &mut rx => {
                    return Ok(Some(result.unwrap_or_else(|_| {
                        tracing::error!(connection_id = %id, "Pending lookup aborted");
                        TranslateResponse::with_status(500)
                    })));
                }
                next = self.framed.next() => match next {
                    Some(Ok(packet)) => self.queued.push_back(packet),
                    Some(Err(e)) => return Err(self.framing_error(e)),
                    None => return Ok(None),
                },
            }
        }
    }

    async fn write(&mut self, response: &TranslateResponse) -> Result<(), FramingError> {
        tracing::debug!(
            connection_id = %self.id(),
            status = ?response.status,
            "Sending response"
        );
        for packet in encode_response(response) {
            self.framed.feed(packet).await?;
        }
        self.framed.flush().await
    }

    fn framing_error(&self, error: FramingError) -> FramingError {
        metrics::record_framing_error();
        tracing::warn!(connection_id = %self.id(), error = %error, "Closing connection");
        error
    }
}
