//! Error types for jline
//!
//! This module provides the error handling for every jline call. It defines
//! two types:
//!
//! - **Error**: Application-level errors returned by clients (uses thiserror)
//! - **RpcError**: The wire-format error object a server puts in a response
//!
//! # Error Taxonomy
//!
//! Failures fall into two broad families:
//!
//! - **Transport failures**: the peer could not be reached or the stream broke
//!   (`Transport`, `HttpStatus`, `Timeout`, `ConnectionClosed`, `FrameTooLarge`)
//! - **Parse and shape failures**: bytes arrived but were not a usable response
//!   (`Parse`, `Protocol`, `Remote`)
//!
//! A server-reported error is never folded into an empty result: it always
//! surfaces as `Error::Remote`.
//!
//! # Wire Error Dialects
//!
//! JSON-RPC 2.0 servers send an object (`{"code": -32601, "message": "..."}`),
//! while Go's `net/rpc/jsonrpc` sends a bare string (`"error": "..."`).
//! `RpcError` decodes both.
//!
//! # Examples
//!
//! ```rust
//! use jline_core::{Error, RpcError};
//!
//! let remote = RpcError::new("method not found");
//! let error = Error::Remote(remote);
//! assert_eq!(error.kind(), "remote");
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Result type for jline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Application-level error type for jline operations
///
/// Every variant carries owned data so the error can be cloned and fanned out
/// to all callers waiting on a connection that just failed.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// The server answered with an error envelope
    #[error("Remote error: {0}")]
    Remote(#[from] RpcError),

    /// Connecting, reading or writing failed
    ///
    /// Covers refused or unreachable peers and broken streams.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The HTTP server answered with a non-2xx status and no error envelope
    #[error("HTTP status {status}: {body}")]
    HttpStatus {
        /// Status code returned by the server
        status: u16,
        /// Response body, lossily decoded as UTF-8
        body: String,
    },

    /// The response is not JSON text
    #[error("Parse error: {0}")]
    Parse(String),

    /// The response is JSON but not a usable response envelope
    ///
    /// Raised when neither `result` nor `error` is present, when the response
    /// id does not match the request, or when the result does not have the
    /// shape the caller asked for.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The call arguments could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A TCP frame grew past the configured limit before its delimiter arrived
    #[error("Frame size limit exceeded: limit={limit}, actual={actual}")]
    FrameTooLarge {
        /// The maximum allowed frame length in bytes
        limit: usize,
        /// The number of bytes buffered when the limit was hit
        actual: usize,
    },

    /// A configured connect or request timeout elapsed
    #[error("Request timeout")]
    Timeout,

    /// The TCP connection closed while the call was in flight
    #[error("Connection closed")]
    ConnectionClosed,

    /// The client could not be built
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Short stable label for logs and metric attributes
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Remote(_) => "remote",
            Error::Transport(_) => "transport",
            Error::HttpStatus { .. } => "http_status",
            Error::Parse(_) => "parse",
            Error::Protocol(_) => "protocol",
            Error::Serialization(_) => "serialization",
            Error::FrameTooLarge { .. } => "frame_too_large",
            Error::Timeout => "timeout",
            Error::ConnectionClosed => "connection_closed",
            Error::Config(_) => "config",
        }
    }

    /// Whether the failure happened below the JSON-RPC layer
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Error::Transport(_)
                | Error::HttpStatus { .. }
                | Error::FrameTooLarge { .. }
                | Error::Timeout
                | Error::ConnectionClosed
        )
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Transport(err.to_string())
    }
}

/// JSON-RPC error object as carried in a response's `error` member
///
/// Only `message` is guaranteed. `code` and `data` are present when the
/// server speaks JSON-RPC 2.0.
///
/// # Examples
///
/// ```rust
/// use jline_core::RpcError;
///
/// // Go net/rpc style
/// let plain: RpcError = serde_json::from_str(r#""name cannot be empty""#).unwrap();
/// assert_eq!(plain.message, "name cannot be empty");
/// assert_eq!(plain.code, None);
///
/// // JSON-RPC 2.0 style
/// let coded: RpcError =
///     serde_json::from_str(r#"{"code":-32601,"message":"Method not found"}"#).unwrap();
/// assert_eq!(coded.code, Some(-32601));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RpcError {
    /// Numeric error code, when the server sends one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,

    /// Human-readable error message
    pub message: String,

    /// Additional structured error information
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl RpcError {
    /// Create an error carrying only a message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
            data: None,
        }
    }

    /// Create an error with a numeric code
    ///
    /// ```rust
    /// use jline_core::RpcError;
    ///
    /// let error = RpcError::with_code(-32601, "Method not found");
    /// assert_eq!(error.to_string(), "[-32601] Method not found");
    /// ```
    pub fn with_code(code: i64, message: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            message: message.into(),
            data: None,
        }
    }

    /// Attach structured data to the error
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Every shape a server has been seen to put in `error`
#[derive(Deserialize)]
#[serde(untagged)]
enum WireError {
    Text(String),
    Object {
        #[serde(default)]
        code: Option<i64>,
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        data: Option<serde_json::Value>,
    },
    Other(serde_json::Value),
}

impl<'de> Deserialize<'de> for RpcError {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let error = match WireError::deserialize(deserializer)? {
            WireError::Text(message) => RpcError::new(message),
            WireError::Object {
                code,
                message,
                data,
            } => RpcError {
                code,
                message: message.unwrap_or_default(),
                data,
            },
            WireError::Other(value) => RpcError::new(value.to_string()),
        };
        Ok(error)
    }
}

impl std::fmt::Display for RpcError {
    /// Formats as "[code] message", or just "message" without a code
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.code {
            Some(code) => write!(f, "[{}] {}", code, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for RpcError {}
