//! Client builder for configuring transports and observability
//!
//! The `ClientBuilder` provides a fluent API for configuring a client before
//! it is created. It allows you to:
//! - Point the client at a host, port and HTTP path
//! - Set connect and request timeouts and the TCP frame limit
//! - Configure observability (logging, OpenTelemetry) and metrics
//!
//! # Examples
//!
//! ```rust,no_run
//! use jline_client::ClientBuilder;
//! use std::time::Duration;
//!
//! # async fn example() -> jline_core::Result<()> {
//! // HTTP
//! let http = ClientBuilder::new("localhost", 1234).build_http()?;
//!
//! // TCP, connected eagerly, with observability
//! let tcp = ClientBuilder::new("localhost", 1234)
//!     .request_timeout(Duration::from_secs(5))
//!     .with_default_observability()
//!     .service_name("hello-client")
//!     .connect_tcp()
//!     .await?;
//! # let _ = (http, tcp);
//! # Ok(())
//! # }
//! ```

use crate::client::{HttpClient, RpcClient, TcpClient};
use crate::config::ClientConfig;
use crate::http::HttpTransport;
use crate::metrics::ClientMetrics;
use crate::tcp::TcpTransport;
use jline_core::{Error, ObservabilityConfig, ObservabilityGuard, Result};
use std::sync::Arc;
use std::time::Duration;

/// Builder for configuring and creating an `HttpClient` or `TcpClient`
pub struct ClientBuilder {
    config: ClientConfig,
    observability_config: Option<ObservabilityConfig>,
    service_name: Option<String>,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::from_config(ClientConfig::default())
    }
}

impl ClientBuilder {
    /// Create a new client builder for `host:port`
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self::from_config(ClientConfig::new(host, port))
    }

    /// Create a builder from a complete configuration
    pub fn from_config(config: ClientConfig) -> Self {
        Self {
            config,
            observability_config: None,
            service_name: None,
        }
    }

    /// Set the HTTP endpoint path
    pub fn http_path(mut self, path: impl Into<String>) -> Self {
        self.config = self.config.with_http_path(path);
        self
    }

    /// Bound the time spent establishing a connection
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.with_connect_timeout(timeout);
        self
    }

    /// Bound the time one call may take
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.with_request_timeout(timeout);
        self
    }

    /// Set the largest TCP frame accepted
    pub fn max_frame_length(mut self, max_frame_length: usize) -> Self {
        self.config = self.config.with_max_frame_length(max_frame_length);
        self
    }

    /// Enable or disable HTTP status checking
    pub fn check_http_status(mut self, check: bool) -> Self {
        self.config = self.config.with_http_status_check(check);
        self
    }

    /// Enable observability with custom configuration
    pub fn with_observability(mut self, config: ObservabilityConfig) -> Self {
        self.observability_config = Some(config);
        self
    }

    /// Enable observability with default configuration
    pub fn with_default_observability(mut self) -> Self {
        self.observability_config = Some(ObservabilityConfig::default());
        self
    }

    /// Set service name for observability (used if observability is enabled)
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }

    /// The configuration the client will be built with
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Build an HTTP client
    pub fn build_http(self) -> Result<HttpClient> {
        let (metrics, telemetry) = self.init_observability()?;
        let transport = HttpTransport::new(&self.config)?;
        tracing::debug!(url = %transport.url(), "HTTP client created");
        Ok(RpcClient::with_parts(transport, metrics, telemetry))
    }

    /// Build a TCP client that connects on its first call
    pub fn build_tcp(self) -> Result<TcpClient> {
        let (metrics, telemetry) = self.init_observability()?;
        let transport = TcpTransport::with_metrics(&self.config, metrics.clone());
        tracing::debug!(address = %transport.address(), "TCP client created");
        Ok(RpcClient::with_parts(transport, metrics, telemetry))
    }

    /// Build a TCP client and connect it now
    pub async fn connect_tcp(self) -> Result<TcpClient> {
        let client = self.build_tcp()?;
        client.connect().await?;
        Ok(client)
    }

    fn init_observability(
        &self,
    ) -> Result<(Option<Arc<ClientMetrics>>, Option<Arc<ObservabilityGuard>>)> {
        let Some(mut config) = self.observability_config.clone() else {
            return Ok((None, None));
        };

        // Override service name if provided
        if let Some(ref name) = self.service_name {
            config.service_name = name.clone();
        }

        let guard = jline_core::init_observability(config.clone())
            .map_err(|e| Error::Config(format!("Failed to initialize observability: {}", e)))?;
        let metrics = Arc::new(ClientMetrics::new(&config.service_name));

        Ok((Some(metrics), Some(Arc::new(guard))))
    }
}
