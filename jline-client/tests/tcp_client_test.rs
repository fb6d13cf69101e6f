//! TCP transport integration tests
//!
//! Connection lifecycle, framing across packets, correlation of concurrent
//! calls and failure handling against a line-based mock server.

mod common;

use common::{hello_handler, mock_response, request_id, unused_port, MockTcpServer, Reply};
use jline_client::{
    ClientBuilder, ClientConfig, ConnectionState, HelloArgs, TcpClient, TcpTransport, Transport,
    SAY_HELLO,
};
use jline_core::{Error, RpcRequest};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn client_for(server: &MockTcpServer) -> TcpClient {
    TcpClient::tcp(&ClientConfig::new("127.0.0.1", server.port()))
}

#[tokio::test]
async fn test_say_hello_success() {
    let server = MockTcpServer::with_handler(|_| {
        Reply::line(r#"{"result":{"Message":"Hello, X"},"id":0}"#)
    })
    .await;
    let client = client_for(&server);

    assert_eq!(client.say_hello("X").await.unwrap(), "Hello, X");

    client.close().await.unwrap();
    server.shutdown();
}

#[tokio::test]
async fn test_request_line_format() {
    let mut server = MockTcpServer::hello().await;
    let client = client_for(&server);

    client.say_hello("Rust TCP Client").await.unwrap();

    let line = server.wait_for_message().await.unwrap();
    let request: Value = serde_json::from_str(&line).unwrap();
    assert_eq!(
        request,
        json!({"method": "HelloService.SayHello", "params": [{"Name": "Rust TCP Client"}], "id": 0})
    );

    server.shutdown();
}

#[tokio::test]
async fn test_call_connects_lazily() {
    let server = MockTcpServer::hello().await;
    let client = client_for(&server);

    assert_eq!(client.state().await, ConnectionState::Disconnected);
    assert_eq!(server.connection_count(), 0);

    client.say_hello("lazy").await.unwrap();

    assert_eq!(client.state().await, ConnectionState::Connected);
    assert!(client.is_connected().await);
    assert_eq!(server.connection_count(), 1);

    server.shutdown();
}

#[tokio::test]
async fn test_connect_is_idempotent() {
    let server = MockTcpServer::hello().await;
    let client = client_for(&server);

    client.connect().await.unwrap();
    client.connect().await.unwrap();
    client.say_hello("once").await.unwrap();

    assert_eq!(server.connection_count(), 1);

    server.shutdown();
}

#[tokio::test]
async fn test_close_then_call_reconnects() {
    let server = MockTcpServer::hello().await;
    let client = client_for(&server);

    client.say_hello("first").await.unwrap();
    client.close().await.unwrap();
    assert_eq!(client.state().await, ConnectionState::Disconnected);

    // closing twice is a no-op
    client.close().await.unwrap();

    assert_eq!(client.say_hello("second").await.unwrap(), "Hello, second");
    assert_eq!(client.state().await, ConnectionState::Connected);
    assert_eq!(server.connection_count(), 2);

    server.shutdown();
}

#[tokio::test]
async fn test_large_response_across_packets() {
    let name = "x".repeat(5000);
    let server = MockTcpServer::with_handler(|line| {
        let request: Value = serde_json::from_str(&line).unwrap();
        let name = request["params"][0]["Name"].as_str().unwrap();
        let mut bytes = mock_response(request["id"].clone(), json!({ "Message": format!("Hello, {}", name) }))
            .into_bytes();
        bytes.push(b'\n');

        let second = bytes.split_off(2048);
        Reply::Chunks(vec![bytes, second])
    })
    .await;
    let client = client_for(&server);

    let message = client.say_hello(&name).await.unwrap();
    assert!(message.len() > 4096);
    assert_eq!(message, format!("Hello, {}", name));

    server.shutdown();
}

#[tokio::test]
async fn test_remote_error() {
    let server = MockTcpServer::hello().await;
    let client = client_for(&server);

    match client.say_hello("").await {
        Err(Error::Remote(error)) => assert_eq!(error.message, "name cannot be empty"),
        other => panic!("Expected Remote error, got {other:?}"),
    }

    // the connection survives a remote error
    assert_eq!(client.say_hello("again").await.unwrap(), "Hello, again");
    assert_eq!(server.connection_count(), 1);

    server.shutdown();
}

#[tokio::test]
async fn test_concurrent_calls_answered_out_of_order() {
    let held = Mutex::new(Vec::<String>::new());
    let server = MockTcpServer::with_handler(move |line| {
        let mut held = held.lock().unwrap();
        held.push(line);
        if held.len() < 2 {
            return Reply::Silent;
        }

        // answer the newest request first
        let mut bytes = Vec::new();
        for line in held.drain(..).rev() {
            if let Reply::Chunks(chunks) = hello_handler(line) {
                bytes.extend(chunks.concat());
            }
        }
        Reply::Chunks(vec![bytes])
    })
    .await;
    let client = client_for(&server);
    let other = client.clone();

    let (first, second) = tokio::join!(client.say_hello("first"), other.say_hello("second"));

    assert_eq!(first.unwrap(), "Hello, first");
    assert_eq!(second.unwrap(), "Hello, second");
    assert_eq!(server.connection_count(), 1);

    server.shutdown();
}

#[tokio::test]
async fn test_server_hangup_fails_call_then_reconnects() {
    let hung_up = AtomicBool::new(false);
    let server = MockTcpServer::with_handler(move |line| {
        if !hung_up.swap(true, Ordering::SeqCst) {
            Reply::Hangup
        } else {
            hello_handler(line)
        }
    })
    .await;
    let client = client_for(&server);

    assert!(matches!(
        client.say_hello("dropped").await,
        Err(Error::ConnectionClosed)
    ));

    assert_eq!(client.say_hello("back").await.unwrap(), "Hello, back");
    assert_eq!(server.connection_count(), 2);

    server.shutdown();
}

#[tokio::test]
async fn test_malformed_frame_keeps_connection() {
    let garbled = AtomicBool::new(false);
    let server = MockTcpServer::with_handler(move |line| {
        if !garbled.swap(true, Ordering::SeqCst) {
            Reply::line("this is not json")
        } else {
            hello_handler(line)
        }
    })
    .await;
    let client = client_for(&server);

    assert!(matches!(client.say_hello("X").await, Err(Error::Parse(_))));
    assert_eq!(client.say_hello("Y").await.unwrap(), "Hello, Y");
    assert_eq!(server.connection_count(), 1);

    server.shutdown();
}

#[tokio::test]
async fn test_mismatched_id_is_not_delivered() {
    // a response for an id nobody waits on is dropped; the call times out
    let server = MockTcpServer::with_handler(|line| {
        let id = request_id(&line) + 100;
        Reply::line(mock_response(json!(id), json!({"Message": "stray"})))
    })
    .await;
    let client = ClientBuilder::new("127.0.0.1", server.port())
        .request_timeout(Duration::from_millis(200))
        .build_tcp()
        .unwrap();

    assert!(matches!(client.say_hello("X").await, Err(Error::Timeout)));

    server.shutdown();
}

#[tokio::test]
async fn test_request_timeout() {
    let server = MockTcpServer::with_handler(|_| Reply::Silent).await;
    let client = ClientBuilder::new("127.0.0.1", server.port())
        .request_timeout(Duration::from_millis(200))
        .build_tcp()
        .unwrap();

    let error = client.say_hello("X").await.unwrap_err();
    assert!(matches!(error, Error::Timeout));
    assert!(error.is_transport());
    assert_eq!(client.state().await, ConnectionState::Connected);

    server.shutdown();
}

#[tokio::test]
async fn test_oversized_frame() {
    let server = MockTcpServer::with_handler(|line| {
        Reply::line(mock_response(
            json!(request_id(&line)),
            json!({"Message": "z".repeat(1000)}),
        ))
    })
    .await;
    let client = ClientBuilder::new("127.0.0.1", server.port())
        .max_frame_length(256)
        .build_tcp()
        .unwrap();

    match client.say_hello("X").await {
        Err(Error::FrameTooLarge { limit, actual }) => {
            assert_eq!(limit, 256);
            assert!(actual > 256);
        }
        other => panic!("Expected FrameTooLarge error, got {other:?}"),
    }

    // the oversized frame tears the connection down
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(client.state().await, ConnectionState::Disconnected);

    server.shutdown();
}

#[tokio::test]
async fn test_oversized_request_spares_other_calls() {
    let server = MockTcpServer::with_handler(|line| {
        hello_handler(line).after(Duration::from_millis(300))
    })
    .await;
    let client = ClientBuilder::new("127.0.0.1", server.port())
        .max_frame_length(256)
        .build_tcp()
        .unwrap();
    let sender = client.clone();
    let long_name = "y".repeat(1000);

    let (first, oversized) = tokio::join!(client.say_hello("first"), async {
        // let the first call get onto the wire
        tokio::time::sleep(Duration::from_millis(50)).await;
        sender.say_hello(&long_name).await
    });

    match oversized {
        Err(Error::FrameTooLarge { limit, actual }) => {
            assert_eq!(limit, 256);
            assert!(actual > 1000);
        }
        other => panic!("Expected FrameTooLarge error, got {other:?}"),
    }
    assert_eq!(first.unwrap(), "Hello, first");
    assert_eq!(client.state().await, ConnectionState::Connected);
    assert_eq!(server.connection_count(), 1);

    server.shutdown();
}

#[tokio::test]
async fn test_abandoned_calls_release_their_ids() {
    let answering = Arc::new(AtomicBool::new(false));
    let flag = answering.clone();
    let server = MockTcpServer::with_handler(move |line| {
        if flag.load(Ordering::SeqCst) {
            hello_handler(line)
        } else {
            Reply::Silent
        }
    })
    .await;
    let transport = TcpTransport::new(&ClientConfig::new("127.0.0.1", server.port()));
    let request = |id| RpcRequest::with_args(SAY_HELLO, &HelloArgs::new("again"), id).unwrap();

    for id in 0..10 {
        let abandoned =
            tokio::time::timeout(Duration::from_millis(30), transport.exchange(request(id))).await;
        assert!(abandoned.is_err());
    }

    answering.store(true, Ordering::SeqCst);
    let response = transport.exchange(request(3)).await.unwrap();
    assert_eq!(response.id, Some(3));
    assert_eq!(response.into_result().unwrap(), json!({"Message": "Hello, again"}));
    assert_eq!(server.connection_count(), 1);

    server.shutdown();
}

#[tokio::test]
async fn test_connection_refused() {
    let port = unused_port().await;
    let result = ClientBuilder::new("127.0.0.1", port).connect_tcp().await;

    assert!(matches!(result, Err(Error::Transport(_))));
}

#[tokio::test]
async fn test_refused_call_leaves_client_disconnected() {
    let port = unused_port().await;
    let client = TcpClient::tcp(&ClientConfig::new("127.0.0.1", port));

    assert!(matches!(client.say_hello("X").await, Err(Error::Transport(_))));
    assert_eq!(client.state().await, ConnectionState::Disconnected);
}
