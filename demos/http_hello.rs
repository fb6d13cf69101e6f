//! HTTP greeting example
//!
//! Posts one `HelloService.SayHello` call to `http://localhost:1234/jsonrpc`
//! and prints the reply.
//!
//! Run with: cargo run --example http_hello

use jline::{ClientBuilder, LogFormat, ObservabilityConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let otel_config = ObservabilityConfig::new("jline-http-hello")
        .without_export()
        .with_format(LogFormat::Pretty)
        .with_log_level("warn");

    let client = ClientBuilder::default()
        .with_observability(otel_config)
        .build_http()?;

    let message = client.say_hello("Rust HTTP Client").await?;
    println!("Message: {}", message);

    Ok(())
}
