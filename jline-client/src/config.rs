//! Client configuration
//!
//! One `ClientConfig` describes where the server lives and how patient the
//! client is. Both transports read from it: HTTP uses the host, port and
//! path to form its URL, TCP uses the host and port as its socket address.
//!
//! # Defaults
//!
//! | field               | default     | env override  |
//! |---------------------|-------------|---------------|
//! | `host`              | `localhost` | `JLINE_HOST`  |
//! | `port`              | `1234`      | `JLINE_PORT`  |
//! | `http_path`         | `/jsonrpc`  |               |
//! | `connect_timeout`   | none        |               |
//! | `request_timeout`   | none        |               |
//! | `max_frame_length`  | 8 MiB       |               |
//! | `check_http_status` | `true`      |               |
//!
//! Unset timeouts leave waits to the operating system.

use jline_core::codec::DEFAULT_MAX_FRAME_LENGTH;
use std::time::Duration;

/// Default server host
pub const DEFAULT_HOST: &str = "localhost";
/// Default server port
pub const DEFAULT_PORT: u16 = 1234;
/// Default HTTP endpoint path
pub const DEFAULT_HTTP_PATH: &str = "/jsonrpc";

/// Connection and call settings shared by both transports
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Server host name or IP address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Path of the HTTP endpoint, always starting with `/`
    pub http_path: String,
    /// Upper bound for establishing a connection
    pub connect_timeout: Option<Duration>,
    /// Upper bound for one call, from send to response
    pub request_timeout: Option<Duration>,
    /// Largest TCP frame accepted, in bytes
    pub max_frame_length: usize,
    /// Treat non-2xx HTTP statuses as failures
    pub check_http_status: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("JLINE_HOST")
                .ok()
                .filter(|host| !host.is_empty())
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: std::env::var("JLINE_PORT")
                .ok()
                .and_then(|port| port.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            http_path: DEFAULT_HTTP_PATH.to_string(),
            connect_timeout: None,
            request_timeout: None,
            max_frame_length: DEFAULT_MAX_FRAME_LENGTH,
            check_http_status: true,
        }
    }
}

impl ClientConfig {
    /// Create a configuration for `host:port` with default settings
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Set the server host
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the server port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the HTTP endpoint path; a missing leading `/` is added
    pub fn with_http_path(mut self, path: impl Into<String>) -> Self {
        let path = path.into();
        self.http_path = if path.starts_with('/') {
            path
        } else {
            format!("/{}", path)
        };
        self
    }

    /// Bound the time spent establishing a connection
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Bound the time one call may take
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Set the largest TCP frame accepted
    pub fn with_max_frame_length(mut self, max_frame_length: usize) -> Self {
        self.max_frame_length = max_frame_length;
        self
    }

    /// Enable or disable HTTP status checking
    pub fn with_http_status_check(mut self, check: bool) -> Self {
        self.check_http_status = check;
        self
    }

    /// `host:port`, as used for TCP connections
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Full HTTP endpoint URL
    ///
    /// ```rust
    /// use jline_client::ClientConfig;
    ///
    /// let config = ClientConfig::new("localhost", 1234);
    /// assert_eq!(config.http_url(), "http://localhost:1234/jsonrpc");
    /// ```
    pub fn http_url(&self) -> String {
        format!("http://{}:{}{}", self.host, self.port, self.http_path)
    }
}
