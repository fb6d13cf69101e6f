//! jline - JSON-RPC over HTTP and newline-delimited TCP
//!
//! This is the convenience crate that re-exports the jline sub-crates. Use it
//! if you want a single dependency for the client and its core types.
//!
//! # Architecture
//!
//! jline is organized into modular crates:
//!
//! - **jline-core**: Envelopes, line codec, error handling, observability
//! - **jline-client**: RPC client with HTTP and TCP transports
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use jline::{ClientBuilder, RpcError};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ClientBuilder::new("localhost", 1234).build_tcp()?;
//!
//!     match client.say_hello("Rust").await {
//!         Ok(message) => println!("{}", message),
//!         Err(jline::Error::Remote(RpcError { message, .. })) => eprintln!("server said: {}", message),
//!         Err(e) => return Err(e.into()),
//!     }
//!
//!     client.close().await?;
//!     Ok(())
//! }
//! ```

// Re-export the sub-crates so everything is reachable through `jline::`
pub use jline_client as client;
pub use jline_core as core;

// Convenience re-exports of the most commonly used types
pub use jline_client::{ClientBuilder, ClientConfig, HttpClient, RpcClient, TcpClient};
pub use jline_core::{Error, LogFormat, ObservabilityConfig, Result, RpcError};
