//! Shared utilities for the translation server integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tempfile::TempDir;
use tokio::net::UnixStream;
use tokio::task::JoinHandle;
use tokio_util::codec::Framed;

use translation_server::config::TranslationConfig;
use translation_server::net::{Listener, ListenerError};
use translation_server::protocol::{Command, Packet, PacketCodec};
use translation_server::{Engine, Shutdown, TranslationServer};

/// How long a test waits for any single answer.
pub const ANSWER_TIMEOUT: Duration = Duration::from_secs(5);

/// A server bound to a socket in its own temporary directory.
pub struct TestServer {
    pub socket: PathBuf,
    pub shutdown: Arc<Shutdown>,
    pub task: JoinHandle<Result<(), ListenerError>>,
    _dir: TempDir,
}

impl TestServer {
    /// Start a server with the default configuration.
    pub async fn start() -> Self {
        Self::start_with(TranslationConfig::default(), |engine| engine).await
    }

    /// Start a server whose engine is adjusted by `customize`.
    pub async fn start_with<F>(mut config: TranslationConfig, customize: F) -> Self
    where
        F: FnOnce(Engine) -> Engine,
    {
        let dir = tempfile::tempdir().unwrap();
        let socket = dir.path().join("translate.sock");
        config.listener.address = socket.display().to_string();

        let listener = Listener::bind(&config.listener).await.unwrap();
        let engine = Arc::new(customize(Engine::new(config)));
        let server = TranslationServer::new(engine, listener);

        let shutdown = Arc::new(Shutdown::new());
        let stop = Arc::clone(&shutdown);
        let task = tokio::spawn(async move { server.run(&stop).await });

        Self {
            socket,
            shutdown,
            task,
            _dir: dir,
        }
    }

    pub async fn connect(&self) -> Client {
        Client::connect(&self.socket).await
    }

    /// Trigger shutdown and wait for the accept loop to return.
    pub async fn stop(self) -> PathBuf {
        self.shutdown.trigger();
        tokio::time::timeout(ANSWER_TIMEOUT, self.task)
            .await
            .expect("server did not stop")
            .unwrap()
            .unwrap();
        self.socket
    }
}

/// A proxy-side client speaking the packet protocol.
pub struct Client {
    framed: Framed<UnixStream, PacketCodec>,
}

impl Client {
    pub async fn connect(path: &Path) -> Self {
        Self::from_stream(UnixStream::connect(path).await.unwrap())
    }

    pub fn from_stream(stream: UnixStream) -> Self {
        Self {
            framed: Framed::new(stream, PacketCodec::new(u16::MAX as usize)),
        }
    }

    /// Send packets without waiting for an answer.
    pub async fn send(&mut self, packets: Vec<Packet>) {
        for packet in packets {
            self.framed.feed(packet).await.unwrap();
        }
        self.framed.flush().await.unwrap();
    }

    /// Read packets up to and including the next END.
    pub async fn answer(&mut self) -> Vec<Packet> {
        tokio::time::timeout(ANSWER_TIMEOUT, async {
            let mut packets = Vec::new();
            loop {
                let packet = self
                    .framed
                    .next()
                    .await
                    .expect("connection closed before END")
                    .unwrap();
                let end = packet.command() == Some(Command::End);
                packets.push(packet);
                if end {
                    return packets;
                }
            }
        })
        .await
        .expect("no answer in time")
    }

    pub async fn roundtrip(&mut self, packets: Vec<Packet>) -> Vec<Packet> {
        self.send(packets).await;
        self.answer().await
    }

    /// Whether the server closed the stream.
    pub async fn is_closed(&mut self) -> bool {
        matches!(
            tokio::time::timeout(ANSWER_TIMEOUT, self.framed.next()).await,
            Ok(None) | Ok(Some(Err(_)))
        )
    }

    pub fn into_stream(self) -> UnixStream {
        self.framed.into_inner()
    }
}

/// BEGIN, the given packets, END.
pub fn request(packets: Vec<Packet>) -> Vec<Packet> {
    let mut all = vec![Packet::new(Command::Begin, vec![1u8])];
    all.extend(packets);
    all.push(Packet::empty(Command::End));
    all
}

pub fn uri_request(uri: &str) -> Vec<Packet> {
    request(vec![Packet::string(Command::Uri, uri)])
}

/// First packet with `command`, if any.
pub fn find(answer: &[Packet], command: Command) -> Option<&Packet> {
    answer.iter().find(|p| p.command() == Some(command))
}

pub fn status(answer: &[Packet]) -> Option<u16> {
    find(answer, Command::Status).map(|p| p.payload_u16().unwrap())
}
