//! The RPC client
//!
//! `RpcClient` builds request envelopes, hands them to a [`Transport`] and
//! turns the response into a typed result. It is generic over the transport
//! so HTTP and TCP share ids, result decoding, logging and metrics.
//!
//! # Call Flow
//!
//! 1. **Build**: Take the next id and wrap the argument as `params: [args]`
//! 2. **Exchange**: The transport delivers the request and returns the response
//! 3. **Check**: A non-null response id must match the request id
//! 4. **Decode**: `error` becomes `Error::Remote`, `result` is decoded into the
//!    caller's type
//!
//! # Cloning
//!
//! `RpcClient` is cheaply cloneable. Clones share the id counter and the
//! transport (for TCP, the connection), so a client can be used from several
//! tasks at once.

use crate::config::ClientConfig;
use crate::connection_state::ConnectionState;
use crate::http::HttpTransport;
use crate::metrics::ClientMetrics;
use crate::request::IdGenerator;
use crate::tcp::TcpTransport;
use crate::transport::Transport;
use jline_core::{Error, ObservabilityGuard, Result, RpcRequest};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;

/// JSON-RPC client over transport `T`
#[derive(Clone)]
pub struct RpcClient<T> {
    transport: T,
    ids: IdGenerator,
    metrics: Option<Arc<ClientMetrics>>,
    /// Keeps telemetry installed by the builder alive as long as the client
    _telemetry: Option<Arc<ObservabilityGuard>>,
}

/// Client posting requests over HTTP
pub type HttpClient = RpcClient<HttpTransport>;

/// Client writing requests as lines on a TCP stream
pub type TcpClient = RpcClient<TcpTransport>;

impl<T: Transport> RpcClient<T> {
    /// Create a client over an existing transport
    pub fn new(transport: T) -> Self {
        Self::with_parts(transport, None, None)
    }

    pub(crate) fn with_parts(
        transport: T,
        metrics: Option<Arc<ClientMetrics>>,
        telemetry: Option<Arc<ObservabilityGuard>>,
    ) -> Self {
        Self {
            transport,
            ids: IdGenerator::new(),
            metrics,
            _telemetry: telemetry,
        }
    }

    /// The underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Build the next request envelope without sending it
    ///
    /// Consumes an id.
    pub fn build_request<P: Serialize>(&self, method: &str, args: &P) -> Result<RpcRequest> {
        RpcRequest::with_args(method, args, self.ids.next_id())
    }

    /// Call `method` with `args` and decode the result into `R`
    ///
    /// # Errors
    ///
    /// - `Error::Remote` if the server answered with an error
    /// - `Error::Protocol` if the result does not have the shape of `R`
    /// - Any transport error
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use jline_client::{ClientConfig, HttpClient};
    /// use serde_json::{json, Value};
    ///
    /// # async fn example() -> jline_core::Result<()> {
    /// let client = HttpClient::http(&ClientConfig::default())?;
    /// let reply: Value = client
    ///     .call("HelloService.SayHello", json!({"Name": "Rust"}))
    ///     .await?;
    /// println!("{}", reply["Message"]);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn call<P, R>(&self, method: &str, args: P) -> Result<R>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let value = self.call_value(method, args).await?;
        serde_json::from_value(value)
            .map_err(|e| Error::Protocol(format!("unexpected result shape: {}", e)))
    }

    /// Call `method` with `args` and return the raw result
    #[tracing::instrument(skip(self, args), fields(method = %method, transport = self.transport.name()))]
    pub async fn call_value<P: Serialize>(&self, method: &str, args: P) -> Result<serde_json::Value> {
        let start = std::time::Instant::now();
        let outcome = self.round_trip(method, &args).await;
        let duration = start.elapsed().as_secs_f64();

        match &outcome {
            Ok(_) => {
                if let Some(ref m) = self.metrics {
                    m.record_request(method, self.transport.name(), "success", duration);
                }
                tracing::debug!(duration_secs = duration, "Request completed successfully");
            }
            Err(error) => {
                if let Some(ref m) = self.metrics {
                    m.record_request(method, self.transport.name(), "error", duration);
                    m.record_error(error.kind());
                }
                tracing::error!(error = %error, kind = error.kind(), "Request failed");
            }
        }

        outcome
    }

    async fn round_trip<P: Serialize>(&self, method: &str, args: &P) -> Result<serde_json::Value> {
        let request = self.build_request(method, args)?;
        let id = request.id;
        tracing::debug!(id, "Sending request");

        let response = self.transport.exchange(request).await?;
        match response.id {
            Some(got) if got != id => Err(Error::Protocol(format!(
                "response id {} does not match request id {}",
                got, id
            ))),
            _ => response.into_result(),
        }
    }
}

impl RpcClient<HttpTransport> {
    /// Create an HTTP client for `config`
    pub fn http(config: &ClientConfig) -> Result<Self> {
        Ok(Self::new(HttpTransport::new(config)?))
    }
}

impl RpcClient<TcpTransport> {
    /// Create a TCP client for `config`; the connection opens on first use
    pub fn tcp(config: &ClientConfig) -> Self {
        Self::new(TcpTransport::new(config))
    }

    /// Open the connection now instead of on the first call
    pub async fn connect(&self) -> Result<()> {
        self.transport.connect().await
    }

    /// Close the connection; the next call reconnects
    pub async fn close(&self) -> Result<()> {
        self.transport.close().await
    }

    /// Get the current connection state
    pub async fn state(&self) -> ConnectionState {
        self.transport.state().await
    }

    /// Check if the client is currently connected
    pub async fn is_connected(&self) -> bool {
        self.transport.is_connected().await
    }
}
