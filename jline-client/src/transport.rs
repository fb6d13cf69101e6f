//! The seam between the RPC client and the wire
//!
//! A transport moves one request envelope to the server and brings back the
//! matching response envelope. Everything above it (ids, result decoding,
//! metrics) lives in [`RpcClient`](crate::RpcClient) and is shared by both
//! implementations.

use async_trait::async_trait;
use jline_core::{Result, RpcRequest, RpcResponse};

/// One request in, one response out
#[async_trait]
pub trait Transport: Send + Sync {
    /// Short label used in logs and metrics
    fn name(&self) -> &'static str;

    /// Send `request` and wait for its response
    ///
    /// # Errors
    ///
    /// Failures to deliver or read the exchange (`Transport`, `Timeout`,
    /// `HttpStatus`, `ConnectionClosed`, `FrameTooLarge`, `Parse`). A
    /// correlated response carrying an error member is returned as `Ok`.
    /// Error envelopes that cannot be matched to this request (a failed HTTP
    /// status, a TCP frame with a null id) come back as `Error::Remote`.
    async fn exchange(&self, request: RpcRequest) -> Result<RpcResponse>;
}
