//! Codec for envelope serialization and newline framing
//!
//! This module has two halves:
//!
//! - **JSON functions** (`encode_request`, `decode_response`, ...) that turn
//!   envelopes into JSON text and back, mapping serde failures onto the
//!   jline error taxonomy.
//! - **`LineCodec`**, a `tokio_util` codec that delimits messages on a byte
//!   stream with `\n`.
//!
//! # Error Mapping
//!
//! Decoding distinguishes *what* went wrong:
//! - Not JSON at all (syntax error, truncated input) → `Error::Parse`
//! - Valid JSON with the wrong shape → `Error::Protocol`
//!
//! # Framing
//!
//! A single bounded read is not a message boundary: a response can be split
//! across packets, and several responses can arrive in one. `LineCodec`
//! buffers partial reads and only yields a frame once its delimiter has
//! arrived. Wrapped in `FramedRead`, it turns a connection into a lazy,
//! finite stream of complete messages.
//!
//! ```rust
//! use bytes::BytesMut;
//! use jline_core::codec::LineCodec;
//! use tokio_util::codec::Decoder;
//!
//! let mut codec = LineCodec::new();
//! let mut buf = BytesMut::from(&b"{\"id\":0,"[..]);
//! assert_eq!(codec.decode(&mut buf).unwrap(), None);
//!
//! buf.extend_from_slice(b"\"result\":1}\n");
//! assert_eq!(codec.decode(&mut buf).unwrap().as_deref(), Some("{\"id\":0,\"result\":1}"));
//! ```

use crate::error::{Error, Result};
use crate::types::{RpcRequest, RpcResponse};
use bytes::{BufMut, BytesMut};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::error::Category;
use tokio_util::codec::{Decoder, Encoder};

/// Message delimiter on TCP streams
pub const DELIMITER: u8 = b'\n';

/// Default upper bound for a single frame (8 MiB)
pub const DEFAULT_MAX_FRAME_LENGTH: usize = 8 * 1024 * 1024;

/// Encode any serializable message to compact JSON text
///
/// # Errors
///
/// Returns `Error::Serialization` if the value cannot be represented as JSON
/// (for example a map with non-string keys).
pub fn encode<T: Serialize>(msg: &T) -> Result<String> {
    serde_json::to_string(msg).map_err(|e| Error::Serialization(e.to_string()))
}

/// Decode JSON text into `T`, classifying the failure
pub fn decode_as<T: DeserializeOwned>(data: &str) -> Result<T> {
    serde_json::from_str(data).map_err(classify)
}

/// Decode a JSON byte slice into `T`, classifying the failure
///
/// Invalid UTF-8 is reported as `Error::Parse`.
pub fn decode_slice_as<T: DeserializeOwned>(data: &[u8]) -> Result<T> {
    serde_json::from_slice(data).map_err(classify)
}

/// Encode a request envelope
///
/// ```rust
/// use jline_core::{codec, RpcRequest};
/// use serde_json::json;
///
/// let request = RpcRequest::new("HelloService.SayHello", json!({"Name": "X"}), 0);
/// let json = codec::encode_request(&request).unwrap();
/// assert!(json.contains("\"method\":\"HelloService.SayHello\""));
/// ```
pub fn encode_request(req: &RpcRequest) -> Result<String> {
    encode(req)
}

/// Decode a request envelope
pub fn decode_request(data: &str) -> Result<RpcRequest> {
    decode_as(data)
}

/// Encode a response envelope
pub fn encode_response(resp: &RpcResponse) -> Result<String> {
    encode(resp)
}

/// Decode a response envelope
///
/// ```rust
/// use jline_core::{codec, Error};
///
/// let response = codec::decode_response(r#"{"result":{"Message":"Hello, X"},"id":0}"#).unwrap();
/// assert_eq!(response.id, Some(0));
///
/// assert!(matches!(codec::decode_response("Hello"), Err(Error::Parse(_))));
/// assert!(matches!(codec::decode_response(r#""text""#), Err(Error::Protocol(_))));
/// ```
pub fn decode_response(data: &str) -> Result<RpcResponse> {
    decode_as(data)
}

/// Decode a response envelope from raw bytes (an HTTP body)
pub fn decode_response_slice(data: &[u8]) -> Result<RpcResponse> {
    decode_slice_as(data)
}

fn classify(err: serde_json::Error) -> Error {
    match err.classify() {
        Category::Syntax | Category::Eof => Error::Parse(err.to_string()),
        Category::Data => Error::Protocol(err.to_string()),
        Category::Io => Error::Transport(err.to_string()),
    }
}

/// Newline-delimited frame codec
///
/// Decodes a byte stream into UTF-8 text frames and encodes text frames by
/// appending `\n`.
///
/// - A trailing `\r` before the delimiter is stripped.
/// - Blank lines are skipped.
/// - At end of stream, leftover bytes without a delimiter form a final frame.
/// - A frame longer than `max_length` is an `Error::FrameTooLarge`; the
///   stream should be abandoned afterwards.
#[derive(Debug, Clone)]
pub struct LineCodec {
    max_length: usize,
    /// Bytes already scanned for a delimiter in the current buffer
    next_index: usize,
}

impl LineCodec {
    /// Create a codec with the default frame limit
    pub fn new() -> Self {
        Self::with_max_length(DEFAULT_MAX_FRAME_LENGTH)
    }

    /// Create a codec that rejects frames longer than `max_length` bytes
    pub fn with_max_length(max_length: usize) -> Self {
        Self {
            max_length,
            next_index: 0,
        }
    }

    /// The configured frame limit
    pub fn max_length(&self) -> usize {
        self.max_length
    }

    fn too_large(&self, actual: usize) -> Error {
        Error::FrameTooLarge {
            limit: self.max_length,
            actual,
        }
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

fn frame_text(mut line: &[u8]) -> Result<Option<String>> {
    if let [rest @ .., b'\r'] = line {
        line = rest;
    }
    let text = std::str::from_utf8(line)
        .map_err(|e| Error::Parse(format!("frame is not valid UTF-8: {}", e)))?;
    if text.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(text.to_string()))
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = Error;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<String>> {
        loop {
            let scan_from = self.next_index.min(buf.len());
            let newline = buf[scan_from..].iter().position(|b| *b == DELIMITER);

            match newline {
                Some(offset) => {
                    let end = scan_from + offset;
                    self.next_index = 0;
                    if end > self.max_length {
                        return Err(self.too_large(end));
                    }
                    let frame = buf.split_to(end + 1);
                    match frame_text(&frame[..end])? {
                        Some(text) => return Ok(Some(text)),
                        // blank line, look for the next frame
                        None => continue,
                    }
                }
                None if buf.len() > self.max_length => {
                    return Err(self.too_large(buf.len()));
                }
                None => {
                    self.next_index = buf.len();
                    return Ok(None);
                }
            }
        }
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<String>> {
        if let Some(frame) = self.decode(buf)? {
            return Ok(Some(frame));
        }
        self.next_index = 0;
        if buf.is_empty() {
            return Ok(None);
        }
        let rest = buf.split_to(buf.len());
        frame_text(&rest)
    }
}

impl<T: AsRef<str>> Encoder<T> for LineCodec {
    type Error = Error;

    fn encode(&mut self, item: T, dst: &mut BytesMut) -> Result<()> {
        let line = item.as_ref();
        if line.as_bytes().contains(&DELIMITER) {
            return Err(Error::Serialization(
                "frame contains a raw newline".to_string(),
            ));
        }
        if line.len() > self.max_length {
            return Err(self.too_large(line.len()));
        }
        dst.reserve(line.len() + 1);
        dst.put_slice(line.as_bytes());
        dst.put_u8(DELIMITER);
        Ok(())
    }
}
