//! Client metrics definitions
//!
//! OpenTelemetry instruments for monitoring client health and performance.
//! They are exported through whatever meter provider is installed globally;
//! `jline_core::init_observability` installs an OTLP one when an endpoint is
//! configured.
//!
//! # Metrics Collected
//!
//! - **connection_state**: Current TCP connection status (gauge)
//! - **requests_total**: Calls made, by method, transport and status (counter)
//! - **request_duration**: Call latency distribution (histogram)
//! - **errors_total**: Errors encountered, by kind (counter)
//! - **connects_total**: TCP connection attempts, by outcome (counter)
//! - **frame_bytes**: Size of TCP frames received (histogram)
//!
//! # Examples
//!
//! ```rust,no_run
//! use jline_client::ClientMetrics;
//!
//! let metrics = ClientMetrics::new("hello-client");
//! metrics.record_request("HelloService.SayHello", "http", "success", 0.004);
//! ```

use crate::connection_state::ConnectionState;
use opentelemetry::{
    global,
    metrics::{Counter, Gauge, Histogram, Meter},
    KeyValue,
};

/// Client metrics for monitoring
pub struct ClientMetrics {
    /// Connection state (0=disconnected, 1=connecting, 2=connected)
    pub connection_state: Gauge<i64>,
    /// Total number of calls made
    pub requests_total: Counter<u64>,
    /// Call duration in seconds
    pub request_duration: Histogram<f64>,
    /// Total number of errors
    pub errors_total: Counter<u64>,
    /// Total number of TCP connection attempts
    pub connects_total: Counter<u64>,
    /// Received frame size in bytes
    pub frame_bytes: Histogram<u64>,
}

impl ClientMetrics {
    /// Create a new ClientMetrics instance
    pub fn new(service_name: impl Into<String>) -> Self {
        let name: &'static str = Box::leak(service_name.into().into_boxed_str());
        let meter = global::meter(name);
        Self::new_with_meter(&meter)
    }

    /// Create a new ClientMetrics instance with a custom meter
    pub fn new_with_meter(meter: &Meter) -> Self {
        Self {
            connection_state: meter
                .i64_gauge("jline.client.connection.state")
                .with_description("Connection state (0=disconnected, 1=connecting, 2=connected)")
                .build(),
            requests_total: meter
                .u64_counter("jline.client.requests.total")
                .with_description("Total number of calls made")
                .build(),
            request_duration: meter
                .f64_histogram("jline.client.request.duration")
                .with_description("Call duration in seconds")
                .build(),
            errors_total: meter
                .u64_counter("jline.client.errors.total")
                .with_description("Total number of errors encountered")
                .build(),
            connects_total: meter
                .u64_counter("jline.client.connects.total")
                .with_description("Total number of TCP connection attempts")
                .build(),
            frame_bytes: meter
                .u64_histogram("jline.client.frame.bytes")
                .with_description("Size of received TCP frames in bytes")
                .build(),
        }
    }

    /// Update connection state
    pub fn update_connection_state(&self, state: ConnectionState) {
        self.connection_state.record(state.as_gauge(), &[]);
    }

    /// Record a completed call
    pub fn record_request(&self, method: &str, transport: &str, status: &str, duration_secs: f64) {
        let attributes = &[
            KeyValue::new("method", method.to_string()),
            KeyValue::new("transport", transport.to_string()),
            KeyValue::new("status", status.to_string()),
        ];
        self.requests_total.add(1, attributes);
        self.request_duration.record(duration_secs, attributes);
    }

    /// Record an error
    pub fn record_error(&self, kind: &str) {
        let attributes = &[KeyValue::new("kind", kind.to_string())];
        self.errors_total.add(1, attributes);
    }

    /// Record a connection attempt
    pub fn record_connect(&self, outcome: &str) {
        let attributes = &[KeyValue::new("outcome", outcome.to_string())];
        self.connects_total.add(1, attributes);
    }

    /// Record a received frame
    pub fn record_frame(&self, bytes: usize) {
        self.frame_bytes.record(bytes as u64, &[]);
    }
}
