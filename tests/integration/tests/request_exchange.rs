//! Integration test: raw and typed requests against a fake Electrum server.

use std::time::Duration;

use peerscout_core::{ClientConfig, CoreError, MemorySink, Node, Request, Response};
use peerscout_integration_tests::{result_line, FakeServer};
use peerscout_network::{ElectrumClient, NetworkError};
use serde_json::json;
use tracing::Level;

const TIMEOUT: Duration = Duration::from_secs(2);

#[tokio::test]
async fn test_send_request_bytes_returns_line_without_newline() {
    let server = FakeServer::with_result(json!("ElectrumX 1.16.0")).await;
    let sink = MemorySink::new();
    let client = ElectrumClient::new(ClientConfig::default(), sink.clone()).expect("client");

    let raw = br#"{"jsonrpc":"2.0","method":"server.version","params":[],"id":4}"#;
    let line = client
        .send_request_bytes(raw, &server.node(), TIMEOUT)
        .await
        .expect("exchange");

    assert_eq!(line.last(), Some(&b'}'));
    let response = Response::decode(&line).expect("decode");
    assert_eq!(response.id, Some(4));
    assert_eq!(response.result, Some(json!("ElectrumX 1.16.0")));

    assert!(sink.contains(Level::INFO, "attempting to connect to 127.0.0.1"));
    assert!(sink.contains(Level::INFO, "server.version"));
    assert!(sink.messages_at(Level::ERROR).is_empty());
}

#[tokio::test]
async fn test_trailing_newline_is_not_doubled() {
    let server = FakeServer::with_result(json!(true)).await;
    let client = ElectrumClient::with_defaults().expect("client");

    let raw = b"{\"jsonrpc\":\"2.0\",\"method\":\"server.ping\",\"params\":[],\"id\":9}\n";
    client
        .send_request_bytes(raw, &server.node(), TIMEOUT)
        .await
        .expect("exchange");

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "server.ping");
    assert_eq!(requests[0].id, 9);
}

#[tokio::test]
async fn test_unparseable_request_gets_parse_error_reply() {
    let server = FakeServer::with_result(json!(null)).await;
    let client = ElectrumClient::with_defaults().expect("client");

    let line = client
        .send_request_bytes(b"not json at all", &server.node(), TIMEOUT)
        .await
        .expect("exchange");

    let response = Response::decode(&line).expect("decode");
    assert_eq!(response.id, None);
    match response.into_result(1) {
        Err(CoreError::Rpc { code, .. }) => assert_eq!(code, -32700),
        other => panic!("expected rpc error, got {:?}", other),
    }
    assert!(server.requests().is_empty());
}

#[tokio::test]
async fn test_call_returns_result_payload() {
    let server = FakeServer::start(|request| {
        let echoed = request.params.first().cloned().unwrap_or(json!(null));
        result_line(request.id, &json!({ "method": request.method, "echo": echoed }))
    })
    .await;
    let client = ElectrumClient::with_defaults().expect("client");

    let request = Request::new("blockchain.headers.subscribe", vec![json!("abc")], 21);
    let value = client
        .call(&request, &server.node(), TIMEOUT)
        .await
        .expect("call");

    assert_eq!(value["method"], "blockchain.headers.subscribe");
    assert_eq!(value["echo"], "abc");
    assert_eq!(server.accepted(), 1);
}

#[tokio::test]
async fn test_each_request_opens_a_fresh_connection() {
    let server = FakeServer::with_result(json!(1)).await;
    let client = ElectrumClient::with_defaults().expect("client");

    for id in 1..=3 {
        let request = Request::new("server.ping", Vec::new(), id);
        client
            .call(&request, &server.node(), TIMEOUT)
            .await
            .expect("call");
    }
    assert_eq!(server.accepted(), 3);
}

#[tokio::test]
async fn test_call_accepts_null_result() {
    let server = FakeServer::with_result(json!(null)).await;
    let client = ElectrumClient::with_defaults().expect("client");

    let value = client
        .call(&Request::new("server.ping", Vec::new(), 1), &server.node(), TIMEOUT)
        .await
        .expect("call");
    assert_eq!(value, serde_json::Value::Null);
}

#[tokio::test]
async fn test_connection_refused_is_connect_error() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        listener.local_addr().expect("addr").port()
    };

    let client = ElectrumClient::with_defaults().expect("client");
    let node = Node::new("127.0.0.1", port, 0).expect("node");
    let err = client
        .send_request(&Request::new("server.ping", Vec::new(), 1), &node, TIMEOUT)
        .await
        .unwrap_err();
    assert!(matches!(err, NetworkError::Connect { .. }));
}
