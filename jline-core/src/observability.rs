//! Logging, tracing and metrics bootstrap
//!
//! jline instruments itself with the `tracing` crate and OpenTelemetry
//! instruments. Nothing is emitted until an application installs a
//! subscriber; this module installs one with sensible defaults.
//!
//! # What Gets Installed
//!
//! - An `EnvFilter` built from `RUST_LOG`, falling back to the configured level
//! - A `fmt` layer writing either JSON lines or human-readable text
//! - When an OTLP endpoint is configured: an OpenTelemetry tracer bridged via
//!   `tracing-opentelemetry`, and a meter provider with periodic export
//!
//! Without an endpoint only local logging is set up, which is what the demo
//! programs and most command-line uses want.
//!
//! # Usage Pattern
//!
//! ```rust,no_run
//! use jline_core::{LogFormat, ObservabilityConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ObservabilityConfig::new("hello-client")
//!         .with_format(LogFormat::Pretty)
//!         .with_log_level("debug");
//!
//!     let _guard = jline_core::init_observability(config).expect("Failed to init observability");
//!
//!     // ... run your application; telemetry is flushed when `_guard` drops ...
//! }
//! ```
//!
//! # Environment Variables
//!
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: Collector endpoint (enables export)
//! - `RUST_LOG`: Log level filter (e.g., "info", "jline_client=debug")

use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use opentelemetry_sdk::trace::SdkTracerProvider;
use opentelemetry_sdk::Resource;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Interval between metric exports
const METRIC_EXPORT_INTERVAL: Duration = Duration::from_secs(30);

/// Output format of the local log layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event, with target, thread id and line number
    Json,
    /// Human-readable text
    Pretty,
}

/// Observability configuration
///
/// # Defaults
///
/// - Service name: "jline"
/// - Service version: The current crate version
/// - OTLP endpoint: `$OTEL_EXPORTER_OTLP_ENDPOINT`, or none (no export)
/// - Log level: `$RUST_LOG` or "info"
/// - Log format: JSON
///
/// # Examples
///
/// ```rust
/// use jline_core::{LogFormat, ObservabilityConfig};
///
/// let config = ObservabilityConfig::new("hello-client")
///     .with_endpoint("http://collector:4317")
///     .with_format(LogFormat::Pretty)
///     .with_version("1.2.3");
///
/// assert_eq!(config.otlp_endpoint.as_deref(), Some("http://collector:4317"));
/// ```
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Service name attached to every span and metric
    pub service_name: String,

    /// Service version attached to every span and metric
    pub service_version: String,

    /// OTLP/gRPC collector endpoint; `None` disables export
    pub otlp_endpoint: Option<String>,

    /// Fallback log filter when `RUST_LOG` is unset
    pub log_level: String,

    /// Local log output format
    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            service_name: "jline".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            otlp_endpoint: std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
                .ok()
                .filter(|endpoint| !endpoint.is_empty()),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            log_format: LogFormat::Json,
        }
    }
}

impl ObservabilityConfig {
    /// Create a configuration with a custom service name
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            ..Default::default()
        }
    }

    /// Export traces and metrics to this OTLP collector endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.otlp_endpoint = Some(endpoint.into());
        self
    }

    /// Disable OTLP export, keeping local logging only
    pub fn without_export(mut self) -> Self {
        self.otlp_endpoint = None;
        self
    }

    /// Set the fallback log filter
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Set the service version
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.service_version = version.into();
        self
    }

    /// Set the local log format
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.log_format = format;
        self
    }

    /// Whether traces and metrics leave the process
    pub fn exports(&self) -> bool {
        self.otlp_endpoint.is_some()
    }

    fn resource(&self) -> Resource {
        Resource::builder_empty()
            .with_attributes(vec![
                KeyValue::new(
                    opentelemetry_semantic_conventions::resource::SERVICE_NAME,
                    self.service_name.clone(),
                ),
                KeyValue::new(
                    opentelemetry_semantic_conventions::resource::SERVICE_VERSION,
                    self.service_version.clone(),
                ),
            ])
            .build()
    }
}

/// Keeps telemetry providers alive; flushes and shuts them down on drop
#[derive(Default)]
pub struct ObservabilityGuard {
    tracer_provider: Option<SdkTracerProvider>,
    meter_provider: Option<SdkMeterProvider>,
}

impl ObservabilityGuard {
    /// Whether OTLP providers were installed
    pub fn is_exporting(&self) -> bool {
        self.tracer_provider.is_some() || self.meter_provider.is_some()
    }
}

impl std::fmt::Debug for ObservabilityGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObservabilityGuard")
            .field("exporting", &self.is_exporting())
            .finish()
    }
}

impl Drop for ObservabilityGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.tracer_provider.take() {
            if let Err(e) = provider.shutdown() {
                tracing::warn!(error = %e, "Tracer provider shutdown failed");
            }
        }
        if let Some(provider) = self.meter_provider.take() {
            if let Err(e) = provider.shutdown() {
                tracing::warn!(error = %e, "Meter provider shutdown failed");
            }
        }
    }
}

/// Install the global subscriber and, if configured, the OTLP providers
///
/// Call once at startup. A second call fails because a global subscriber is
/// already set; it does not panic.
///
/// # Errors
///
/// - The log filter cannot be parsed
/// - An OTLP exporter cannot be built
/// - A global subscriber is already installed
pub fn init_observability(
    config: ObservabilityConfig,
) -> Result<ObservabilityGuard, Box<dyn std::error::Error + Send + Sync>> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.log_level))?;

    let mut guard = ObservabilityGuard::default();

    let tracer = match config.otlp_endpoint.as_deref() {
        Some(endpoint) => {
            let (provider, tracer) = init_tracer(&config, endpoint)?;
            guard.tracer_provider = Some(provider);
            guard.meter_provider = Some(init_metrics(&config, endpoint)?);
            Some(tracer)
        }
        None => None,
    };

    let telemetry_layer = tracer.map(|tracer| tracing_opentelemetry::layer().with_tracer(tracer));
    let json_layer = (config.log_format == LogFormat::Json).then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_line_number(true)
            .json()
    });
    let pretty_layer = (config.log_format == LogFormat::Pretty)
        .then(|| tracing_subscriber::fmt::layer().with_target(true));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(telemetry_layer)
        .with(json_layer)
        .with(pretty_layer)
        .try_init()?;

    tracing::info!(
        service_name = %config.service_name,
        otlp_endpoint = ?config.otlp_endpoint,
        format = ?config.log_format,
        "Observability initialized"
    );

    Ok(guard)
}

fn init_tracer(
    config: &ObservabilityConfig,
    endpoint: &str,
) -> Result<(SdkTracerProvider, opentelemetry_sdk::trace::Tracer), Box<dyn std::error::Error + Send + Sync>>
{
    use opentelemetry::trace::TracerProvider as _;

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()?;

    let provider = SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(config.resource())
        .build();

    let tracer = provider.tracer(config.service_name.clone());
    global::set_tracer_provider(provider.clone());

    Ok((provider, tracer))
}

fn init_metrics(
    config: &ObservabilityConfig,
    endpoint: &str,
) -> Result<SdkMeterProvider, Box<dyn std::error::Error + Send + Sync>> {
    let exporter = opentelemetry_otlp::MetricExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()?;

    let reader = opentelemetry_sdk::metrics::PeriodicReader::builder(exporter)
        .with_interval(METRIC_EXPORT_INTERVAL)
        .build();

    let provider = SdkMeterProvider::builder()
        .with_reader(reader)
        .with_resource(config.resource())
        .build();

    global::set_meter_provider(provider.clone());
    Ok(provider)
}
