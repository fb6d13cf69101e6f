//! JSON-RPC client over HTTP and newline-delimited TCP
//!
//! This crate provides a small JSON-RPC client in the classic `net/rpc`
//! style: `{"method", "params": [args], "id"}` out, `{"id", "result",
//! "error"}` back. The same client runs over two transports.
//!
//! # Core Features
//!
//! - **HTTP Transport**: One `POST` per call, with status checking
//! - **TCP Transport**: Newline-framed JSON on a persistent, lazily opened
//!   connection; responses are routed by id so concurrent calls are safe
//! - **Typed Calls**: Serialize any argument, decode the result into any type
//! - **HelloService Binding**: `say_hello` for `HelloService.SayHello`
//! - **Observability**: `tracing` spans and OpenTelemetry metrics
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use jline_client::{ClientConfig, HttpClient, TcpClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::new("localhost", 1234);
//!
//!     let http = HttpClient::http(&config)?;
//!     println!("{}", http.say_hello("Rust HTTP Client").await?);
//!
//!     let tcp = TcpClient::tcp(&config);
//!     println!("{}", tcp.say_hello("Rust TCP Client").await?);
//!     tcp.close().await?;
//!
//!     Ok(())
//! }
//! ```

mod client;
mod client_builder;
mod config;
mod connection_state;
mod hello;
mod http;
mod metrics;
mod request;
mod tcp;
mod transport;

pub use client::{HttpClient, RpcClient, TcpClient};
pub use client_builder::ClientBuilder;
pub use config::{ClientConfig, DEFAULT_HOST, DEFAULT_HTTP_PATH, DEFAULT_PORT};
pub use connection_state::{ConnectionManager, ConnectionState};
pub use hello::{HelloArgs, HelloReply, SAY_HELLO};
pub use http::HttpTransport;
pub use metrics::ClientMetrics;
pub use request::{IdGenerator, PendingResponse, RequestManager};
pub use tcp::TcpTransport;
pub use transport::Transport;
