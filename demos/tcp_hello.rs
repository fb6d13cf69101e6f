//! TCP greeting example
//!
//! Sends one `HelloService.SayHello` call as a JSON line to `localhost:1234`,
//! prints the reply and closes the connection.
//!
//! Run with: cargo run --example tcp_hello

use jline::{ClientBuilder, LogFormat, ObservabilityConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let otel_config = ObservabilityConfig::new("jline-tcp-hello")
        .without_export()
        .with_format(LogFormat::Pretty)
        .with_log_level("warn");

    let client = ClientBuilder::default()
        .with_observability(otel_config)
        .build_tcp()?;

    let outcome = client.say_hello("Rust TCP Client").await;
    client.close().await?;

    println!("Server response: {}", outcome?);
    Ok(())
}
