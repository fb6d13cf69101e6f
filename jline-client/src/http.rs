//! HTTP transport
//!
//! Each call is one `POST` to `http://<host>:<port><path>` with a JSON body.
//! The whole response body is read before decoding, so there is no framing
//! to worry about.
//!
//! # Status Handling
//!
//! With `check_http_status` on (the default), a non-2xx reply is a failure:
//! if the body is still a JSON-RPC error envelope the server's error is
//! surfaced as `Error::Remote`, otherwise the status and body text come back
//! as `Error::HttpStatus`. With the check off the body is decoded whatever
//! the status.

use crate::config::ClientConfig;
use crate::transport::Transport;
use async_trait::async_trait;
use jline_core::{codec, Error, Result, RpcRequest, RpcResponse};
use reqwest::header::CONTENT_TYPE;

/// JSON-RPC over HTTP POST
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    url: String,
    check_status: bool,
}

impl HttpTransport {
    /// Build a transport from a configuration
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the underlying HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            url: config.http_url(),
            check_status: config.check_http_status,
        })
    }

    /// The endpoint URL requests are posted to
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn name(&self) -> &'static str {
        "http"
    }

    #[tracing::instrument(skip(self, request), fields(url = %self.url, id = request.id))]
    async fn exchange(&self, request: RpcRequest) -> Result<RpcResponse> {
        let body = codec::encode_request(&request)?;

        let reply = self
            .http
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = reply.status();
        let bytes = reply.bytes().await.map_err(map_reqwest_error)?;
        tracing::debug!(status = status.as_u16(), bytes = bytes.len(), "HTTP response received");

        if self.check_status && !status.is_success() {
            return Err(status_error(status.as_u16(), &bytes));
        }

        codec::decode_response_slice(&bytes)
    }
}

/// Error for a non-2xx reply
fn status_error(status: u16, body: &[u8]) -> Error {
    match codec::decode_response_slice(body) {
        Ok(RpcResponse {
            error: Some(error), ..
        }) => Error::Remote(error),
        _ => Error::HttpStatus {
            status,
            body: String::from_utf8_lossy(body).into_owned(),
        },
    }
}

fn map_reqwest_error(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout
    } else {
        Error::Transport(e.to_string())
    }
}
