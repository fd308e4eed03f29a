//! End-to-end tests of the translation server over a Unix socket.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::Notify;

use translation_server::config::TranslationConfig;
use translation_server::protocol::codec::encode_all;
use translation_server::protocol::{Command, Packet};
use translation_server::providers::{WidgetClass, WidgetError, WidgetRegistry};
use translation_server::translation::ResourceAddress;

mod common;

use common::{find, request, status, uri_request, Client, TestServer};

/// Registry whose lookups block until the test opens the gate.
#[derive(Debug, Default)]
struct GatedRegistry {
    gate: Notify,
}

#[async_trait]
impl WidgetRegistry for GatedRegistry {
    async fn lookup(&self, widget_type: &str) -> Result<Option<WidgetClass>, WidgetError> {
        self.gate.notified().await;
        Ok(Some(WidgetClass {
            address: ResourceAddress::http(format!("http://widgets/{widget_type}")),
            process: true,
            container: false,
            stateful: false,
            content_type: None,
        }))
    }
}

async fn gated_server() -> (TestServer, Arc<GatedRegistry>) {
    let registry = Arc::new(GatedRegistry::default());
    let widgets: Arc<dyn WidgetRegistry> = registry.clone();
    let server = TestServer::start_with(TranslationConfig::default(), move |engine| {
        engine.with_widgets(widgets)
    })
    .await;
    (server, registry)
}

fn widget_request(widget_type: &str) -> Vec<Packet> {
    request(vec![Packet::string(Command::WidgetType, widget_type)])
}

#[tokio::test]
async fn discard_over_the_socket() {
    let server = TestServer::start().await;
    let mut client = server.connect().await;

    let answer = client.roundtrip(uri_request("/discard")).await;
    assert_eq!(answer.first().and_then(Packet::command), Some(Command::Begin));
    assert_eq!(answer.first().map(|p| p.payload.to_vec()), Some(vec![1u8]));
    assert_eq!(status(&answer), Some(204));
    assert!(find(&answer, Command::DiscardSession).is_some());

    server.stop().await;
}

#[tokio::test]
async fn several_requests_share_one_connection() {
    let server = TestServer::start().await;
    let mut client = server.connect().await;

    let redirect = client.roundtrip(uri_request("/redirect/permanent")).await;
    assert_eq!(status(&redirect), Some(301));
    assert_eq!(
        find(&redirect, Command::Redirect).map(Packet::payload_string).as_deref(),
        Some("http://cfatest01.intern.cm-ag/")
    );

    let traversal = client.roundtrip(uri_request("/a/../etc/passwd")).await;
    assert_eq!(status(&traversal), Some(400));
    assert!(find(&traversal, Command::Path).is_none());

    let discard = client.roundtrip(uri_request("/discard")).await;
    assert_eq!(status(&discard), Some(204));

    server.stop().await;
}

#[tokio::test]
async fn split_writes_are_reassembled() {
    let server = TestServer::start().await;
    let mut stream = server.connect().await.into_stream();

    let bytes = encode_all(&uri_request("/discard")).unwrap();
    for byte in bytes.iter() {
        stream.write_all(&[*byte]).await.unwrap();
        stream.flush().await.unwrap();
    }

    let mut client = Client::from_stream(stream);
    let answer = client.answer().await;
    assert_eq!(status(&answer), Some(204));

    server.stop().await;
}

#[tokio::test]
async fn begin_restarts_an_unfinished_request() {
    let server = TestServer::start().await;
    let mut client = server.connect().await;

    let mut packets = vec![
        Packet::new(Command::Begin, vec![1u8]),
        Packet::string(Command::Uri, "/redirect/permanent"),
    ];
    packets.extend(uri_request("/discard"));

    let answer = client.roundtrip(packets).await;
    assert_eq!(status(&answer), Some(204));
    assert!(find(&answer, Command::Redirect).is_none());

    server.stop().await;
}

#[tokio::test]
async fn want_full_uri_round_trip() {
    let server = TestServer::start().await;
    let mut client = server.connect().await;

    let first = client.roundtrip(uri_request("/want_full_uri/x")).await;
    let token = find(&first, Command::WantFullUri).map(|p| p.payload.clone());
    assert_eq!(token.as_deref(), Some(&b"foo"[..]));

    let second = client
        .roundtrip(request(vec![
            Packet::string(Command::Uri, "/want_full_uri/x"),
            Packet::new(Command::WantFullUri, token.unwrap_or_default()),
        ]))
        .await;
    assert!(find(&second, Command::WantFullUri).is_none());
    assert!(find(&second, Command::Cgi).is_some());

    server.stop().await;
}

#[tokio::test]
async fn concurrent_connections_are_independent() {
    let server = TestServer::start().await;

    let mut tasks = Vec::new();
    for i in 0..16 {
        let socket = server.socket.clone();
        tasks.push(tokio::spawn(async move {
            let mut client = Client::connect(&socket).await;
            let uri = if i % 2 == 0 { "/discard" } else { "/redirect/permanent" };
            (i, status(&client.roundtrip(uri_request(uri)).await))
        }));
    }

    for task in tasks {
        let (i, status) = task.await.unwrap();
        let expected = if i % 2 == 0 { 204 } else { 301 };
        assert_eq!(status, Some(expected), "client {i}");
    }

    server.stop().await;
}

#[tokio::test]
async fn pending_lookup_does_not_block_other_connections() {
    let (server, registry) = gated_server().await;

    let mut waiting = server.connect().await;
    waiting.send(widget_request("clock")).await;

    let mut other = server.connect().await;
    let answer = other.roundtrip(uri_request("/discard")).await;
    assert_eq!(status(&answer), Some(204));

    registry.gate.notify_one();
    let widget = waiting.answer().await;
    assert_eq!(
        find(&widget, Command::Http).map(Packet::payload_string).as_deref(),
        Some("http://widgets/clock")
    );
    assert!(find(&widget, Command::Process).is_some());

    server.stop().await;
}

#[tokio::test]
async fn requests_sent_during_a_lookup_are_answered_in_order() {
    let (server, registry) = gated_server().await;
    let mut client = server.connect().await;

    let mut packets = widget_request("clock");
    packets.extend(uri_request("/discard"));
    client.send(packets).await;

    tokio::time::sleep(Duration::from_millis(50)).await;
    registry.gate.notify_one();

    let widget = client.answer().await;
    assert!(find(&widget, Command::Http).is_some());
    let discard = client.answer().await;
    assert_eq!(status(&discard), Some(204));

    server.stop().await;
}

#[tokio::test]
async fn closing_during_a_lookup_leaves_the_server_serving() {
    let (server, registry) = gated_server().await;

    let mut gone = server.connect().await;
    gone.send(widget_request("clock")).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    drop(gone);

    registry.gate.notify_one();

    let mut client = server.connect().await;
    let answer = client.roundtrip(uri_request("/discard")).await;
    assert_eq!(status(&answer), Some(204));

    server.stop().await;
}

#[tokio::test]
async fn oversized_packet_closes_only_that_connection() {
    let mut config = TranslationConfig::default();
    config.protocol.max_payload_size = 64;
    let server = TestServer::start_with(config, |engine| engine).await;

    let mut bad = server.connect().await;
    bad.send(vec![Packet::new(Command::Uri, vec![b'x'; 200])]).await;
    assert!(bad.is_closed().await);

    let mut good = server.connect().await;
    let answer = good.roundtrip(uri_request("/discard")).await;
    assert_eq!(status(&answer), Some(204));

    server.stop().await;
}

#[tokio::test]
async fn shutdown_removes_the_socket_file() {
    let server = TestServer::start().await;
    assert!(server.socket.exists());

    let socket = server.stop().await;
    assert!(!socket.exists());
}
