//! Common test utilities for jline-client integration tests
//!
//! This module provides mock servers for both transports so client behavior
//! can be tested without a real JSON-RPC server:
//! - `MockTcpServer`: newline-delimited JSON over TCP, with control over how
//!   reply bytes are split into packets
//! - `MockHttpServer`: a warp server answering `POST /jsonrpc`

#![allow(dead_code)]

use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};

/// Pause between packets of a chunked reply
const PACKET_GAP: Duration = Duration::from_millis(20);

/// What the TCP mock does with one received line
pub enum Reply {
    /// Write each chunk as its own packet, pausing in between
    Chunks(Vec<Vec<u8>>),
    /// Send nothing back
    Silent,
    /// Close the connection
    Hangup,
    /// Wait, then handle the inner reply
    Delayed(Duration, Box<Reply>),
}

impl Reply {
    /// A single newline-terminated line
    pub fn line(text: impl Into<String>) -> Self {
        let mut bytes = text.into().into_bytes();
        bytes.push(b'\n');
        Reply::Chunks(vec![bytes])
    }

    /// The same reply, sent after `pause`
    pub fn after(self, pause: Duration) -> Self {
        Reply::Delayed(pause, Box::new(self))
    }
}

/// Mock newline-delimited JSON-RPC server over TCP
pub struct MockTcpServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    message_rx: mpsc::UnboundedReceiver<String>,
    connections: Arc<AtomicUsize>,
}

impl MockTcpServer {
    /// Start a server that greets like `HelloService.SayHello`
    pub async fn hello() -> Self {
        Self::with_handler(hello_handler).await
    }

    /// Start a server with a custom per-line handler
    pub async fn with_handler<F>(handler: F) -> Self
    where
        F: Fn(String) -> Reply + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
        let (msg_tx, message_rx) = mpsc::unbounded_channel::<String>();
        let connections = Arc::new(AtomicUsize::new(0));
        let handler = Arc::new(handler);

        let accepted = connections.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    accept_result = listener.accept() => {
                        let Ok((stream, _)) = accept_result else { continue };
                        accepted.fetch_add(1, Ordering::SeqCst);
                        let handler = handler.clone();
                        let msg_tx = msg_tx.clone();

                        tokio::spawn(async move {
                            let (read, mut write) = stream.into_split();
                            let mut lines = BufReader::new(read).lines();

                            while let Ok(Some(line)) = lines.next_line().await {
                                let _ = msg_tx.send(line.clone());
                                let mut reply = handler(line);
                                while let Reply::Delayed(pause, inner) = reply {
                                    tokio::time::sleep(pause).await;
                                    reply = *inner;
                                }
                                match reply {
                                    Reply::Chunks(chunks) => {
                                        for (index, chunk) in chunks.iter().enumerate() {
                                            if index > 0 {
                                                tokio::time::sleep(PACKET_GAP).await;
                                            }
                                            if write.write_all(chunk).await.is_err() {
                                                return;
                                            }
                                            let _ = write.flush().await;
                                        }
                                    }
                                    Reply::Silent | Reply::Delayed(..) => {}
                                    Reply::Hangup => return,
                                }
                            }
                        });
                    }
                }
            }
        });

        Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
            message_rx,
            connections,
        }
    }

    /// Get the bound socket address
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Port the server listens on
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Number of connections accepted so far
    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    /// Wait for the next line received by the server
    pub async fn wait_for_message(&mut self) -> Option<String> {
        tokio::time::timeout(Duration::from_secs(5), self.message_rx.recv())
            .await
            .ok()
            .flatten()
    }

    /// Stop accepting connections
    pub fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// A request as seen by the HTTP mock
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub content_type: Option<String>,
    pub body: String,
}

/// Mock JSON-RPC server answering `POST /jsonrpc`
pub struct MockHttpServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    request_rx: mpsc::UnboundedReceiver<CapturedRequest>,
}

impl MockHttpServer {
    /// Start a server that greets like `HelloService.SayHello`
    pub async fn hello() -> Self {
        Self::with_handler(|body| match hello_handler(body) {
            Reply::Chunks(chunks) => (200, String::from_utf8(chunks.concat()).unwrap()),
            _ => (500, String::new()),
        })
        .await
    }

    /// Start a server whose handler maps a request body to `(status, body)`
    pub async fn with_handler<F>(handler: F) -> Self
    where
        F: Fn(String) -> (u16, String) + Send + Sync + 'static,
    {
        use warp::Filter;

        let handler = Arc::new(handler);
        let (request_tx, request_rx) = mpsc::unbounded_channel::<CapturedRequest>();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let route = warp::post()
            .and(warp::path("jsonrpc"))
            .and(warp::path::end())
            .and(warp::header::optional::<String>("content-type"))
            .and(warp::body::bytes())
            .map(move |content_type: Option<String>, body: bytes::Bytes| {
                let body = String::from_utf8_lossy(&body).into_owned();
                let _ = request_tx.send(CapturedRequest {
                    content_type,
                    body: body.clone(),
                });
                let (status, reply) = handler(body);
                let status = warp::http::StatusCode::from_u16(status).unwrap();
                warp::reply::with_status(reply, status)
            });

        let (addr, server) = warp::serve(route)
            .bind_with_graceful_shutdown(([127, 0, 0, 1], 0), async {
                shutdown_rx.await.ok();
            });
        tokio::spawn(server);

        Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
            request_rx,
        }
    }

    /// Port the server listens on
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Wait for the next request received by the server
    pub async fn wait_for_request(&mut self) -> Option<CapturedRequest> {
        tokio::time::timeout(Duration::from_secs(5), self.request_rx.recv())
            .await
            .ok()
            .flatten()
    }

    /// Stop the server
    pub fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Answer a request line the way the Go `HelloService` does
pub fn hello_handler(line: String) -> Reply {
    let request: Value = serde_json::from_str(&line).unwrap();
    let id = request["id"].clone();
    let name = request["params"][0]["Name"].as_str().unwrap_or_default();

    if name.is_empty() {
        Reply::line(mock_error_response(id, "name cannot be empty"))
    } else {
        Reply::line(mock_response(id, json!({ "Message": format!("Hello, {}", name) })))
    }
}

/// Id of a request line
pub fn request_id(line: &str) -> u64 {
    let request: Value = serde_json::from_str(line).unwrap();
    request["id"].as_u64().unwrap()
}

/// Helper to create a success response in the Go `net/rpc/jsonrpc` layout
pub fn mock_response(id: Value, result: Value) -> String {
    json!({
        "id": id,
        "result": result,
        "error": null
    })
    .to_string()
}

/// Helper to create an error response carrying a bare error string
pub fn mock_error_response(id: Value, message: &str) -> String {
    json!({
        "id": id,
        "result": null,
        "error": message
    })
    .to_string()
}

/// A port nothing listens on
pub async fn unused_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}
