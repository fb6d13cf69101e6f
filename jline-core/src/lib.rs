//! Core JSON-RPC types and codec for jline
//!
//! This crate holds everything jline clients share regardless of transport:
//!
//! - **Types**: Request and response envelopes
//! - **Codec**: JSON encoding/decoding and newline framing for byte streams
//! - **Error handling**: One error taxonomy for transport and protocol failures
//! - **Observability**: Logging and OpenTelemetry bootstrap
//!
//! # Architecture
//!
//! The crate is transport-agnostic. `jline-client` builds the HTTP and TCP
//! transports on top of it.
//!
//! # Example
//!
//! ```rust
//! use jline_core::{codec, RpcRequest};
//! use serde_json::json;
//!
//! let request = RpcRequest::new("HelloService.SayHello", json!({"Name": "X"}), 0);
//! let json = codec::encode_request(&request).unwrap();
//!
//! let response = codec::decode_response(r#"{"id":0,"result":{"Message":"Hello, X"}}"#).unwrap();
//! assert_eq!(response.into_result().unwrap()["Message"], "Hello, X");
//! # let _ = json;
//! ```

pub mod codec;
pub mod error;
pub mod observability;
pub mod types;

pub use codec::LineCodec;
pub use error::{Error, Result, RpcError};
pub use observability::{
    init_observability, LogFormat, ObservabilityConfig, ObservabilityGuard,
};
pub use types::{RequestId, RpcRequest, RpcResponse};
