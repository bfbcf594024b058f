//! Integration test: the encrypted transport against a self-signed server.

use std::time::Duration;

use peerscout_core::{MemorySink, Node, Transport, PEERS_SUBSCRIBE};
use peerscout_integration_tests::FakeServer;
use peerscout_network::{ElectrumClient, NetworkError};
use serde_json::json;
use tracing::Level;

const TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn test_connect_prefers_tls_and_accepts_self_signed_cert() {
    let server = FakeServer::with_result_tls(json!(null)).await;
    let sink = MemorySink::new();
    let client = ElectrumClient::new(Default::default(), sink.clone()).expect("client");

    let conn = client.connect(&server.node(), TIMEOUT).await.expect("connect");
    assert_eq!(conn.transport(), Transport::Encrypted);
    assert_eq!(conn.addr(), format!("127.0.0.1:{}", server.port()));
    assert!(sink.contains(Level::INFO, "successfully established TLS connection"));
}

#[tokio::test]
async fn test_exchange_over_tls_stream() {
    let server = FakeServer::with_result_tls(json!("ElectrumX 1.16.0")).await;
    let client = ElectrumClient::with_defaults().expect("client");

    let conn = client.connect(&server.node(), TIMEOUT).await.expect("connect");
    let line = client
        .exchange(
            conn,
            br#"{"jsonrpc":"2.0","method":"server.version","params":[],"id":3}"#,
            TIMEOUT,
        )
        .await
        .expect("exchange");

    assert_eq!(
        serde_json::from_slice::<serde_json::Value>(&line).expect("json"),
        json!({"jsonrpc": "2.0", "id": 3, "result": "ElectrumX 1.16.0"})
    );
    assert_eq!(server.requests()[0].method, "server.version");
}

#[tokio::test]
async fn test_discover_peers_over_tls() {
    let server = FakeServer::with_result_tls(json!([
        ["1.2.3.4", "a.example", ["s50001", "t50002"]],
        ["", "", []]
    ]))
    .await;
    let sink = MemorySink::new();
    let client = ElectrumClient::new(Default::default(), sink.clone()).expect("client");

    let peers = client
        .discover_peers(&server.node(), 7, TIMEOUT)
        .await
        .expect("discover");

    assert_eq!(peers.len(), 1);
    assert_eq!(peers[0].host(), "a.example");
    assert_eq!(peers[0].tcp_port(), 50002);
    assert_eq!(peers[0].ssl_port(), 50001);
    assert!(peers[0].supports_tls());

    let requests = server.requests();
    assert_eq!(requests[0].method, PEERS_SUBSCRIBE);
    assert_eq!(requests[0].id, 7);
    assert!(sink.messages_at(Level::ERROR).is_empty());
}

#[tokio::test]
async fn test_tls_node_is_not_retried_over_plaintext() {
    // Plaintext server on the TLS port: the handshake fails and no second
    // connection is made.
    let server = FakeServer::with_result(json!([])).await;
    let client = ElectrumClient::with_defaults().expect("client");
    let node = Node::new("127.0.0.1", server.port(), server.port()).expect("node");

    let err = client
        .connect(&node, Duration::from_millis(500))
        .await
        .unwrap_err();
    assert_eq!(err.transport(), Some(Transport::Encrypted));
    assert!(matches!(err, NetworkError::Connect { .. }));
    assert_eq!(server.accepted(), 1);
}
