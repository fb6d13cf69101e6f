//! Typed binding for `HelloService.SayHello`
//!
//! The service takes `{"Name": string}` and answers `{"Message": string}`.
//! Reference servers reply `"Hello, <Name>"` and reject an empty name with
//! the error `"name cannot be empty"`; the client does not check the name
//! itself and leaves that to the server.

use crate::client::RpcClient;
use crate::transport::Transport;
use jline_core::Result;
use serde::{Deserialize, Serialize};

/// Method name of the greeting call
pub const SAY_HELLO: &str = "HelloService.SayHello";

/// Argument of `HelloService.SayHello`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelloArgs {
    /// Name to greet
    #[serde(rename = "Name")]
    pub name: String,
}

/// Result of `HelloService.SayHello`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelloReply {
    /// Greeting text chosen by the server
    #[serde(rename = "Message")]
    pub message: String,
}

impl HelloArgs {
    /// Arguments greeting `name`
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl<T: Transport> RpcClient<T> {
    /// Greet `name` and return the server's message
    ///
    /// # Errors
    ///
    /// - `Error::Remote` if the server rejects the call
    /// - `Error::Protocol` if the reply has no `Message`
    /// - Any transport error
    pub async fn say_hello(&self, name: &str) -> Result<String> {
        let reply: HelloReply = self.call(SAY_HELLO, HelloArgs::new(name)).await?;
        Ok(reply.message)
    }
}
