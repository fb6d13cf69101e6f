//! Request and response envelopes
//!
//! These are the two top-level JSON objects exchanged on every call. The
//! layout follows the classic JSON-RPC convention used by Go's
//! `net/rpc/jsonrpc`: no `jsonrpc` version member, positional `params`
//! holding exactly one argument object, and an integer `id`.
//!
//! ```text
//! request:  {"method":"HelloService.SayHello","params":[{"Name":"X"}],"id":0}
//! response: {"id":0,"result":{"Message":"Hello, X"},"error":null}
//! ```
//!
//! # Request IDs
//!
//! The id correlates a response with its request. Clients hand out ids from a
//! monotonic counter starting at 0, so a lone call carries `id: 0`. A response
//! may carry `id: null` when the server could not read the request at all.

use crate::error::{Error, Result, RpcError};
use serde::{Deserialize, Serialize};

/// Request identifier
pub type RequestId = u64;

/// Request envelope
///
/// # Examples
///
/// ```rust
/// use jline_core::RpcRequest;
/// use serde_json::json;
///
/// let request = RpcRequest::new("HelloService.SayHello", json!({"Name": "X"}), 0);
/// assert_eq!(request.args(), Some(&json!({"Name": "X"})));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    /// Dot-qualified method name, e.g. `Service.Method`
    pub method: String,
    /// Positional parameters; a single argument object
    pub params: Vec<serde_json::Value>,
    /// Identifier echoed back in the response
    pub id: RequestId,
}

impl RpcRequest {
    /// Create a request whose `params` holds `args` as its only element
    pub fn new(method: impl Into<String>, args: serde_json::Value, id: RequestId) -> Self {
        Self {
            method: method.into(),
            params: vec![args],
            id,
        }
    }

    /// Create a request from any serializable argument
    ///
    /// # Errors
    ///
    /// Returns `Error::Serialization` if `args` cannot be represented as JSON.
    pub fn with_args<P: Serialize>(
        method: impl Into<String>,
        args: &P,
        id: RequestId,
    ) -> Result<Self> {
        let args = serde_json::to_value(args).map_err(|e| Error::Serialization(e.to_string()))?;
        Ok(Self::new(method, args, id))
    }

    /// The argument object, if present
    pub fn args(&self) -> Option<&serde_json::Value> {
        self.params.first()
    }
}

/// Response envelope
///
/// A well-formed response carries exactly one of `result` or `error`. An
/// absent member and an explicit `null` decode the same way.
///
/// Use [`RpcResponse::into_result`] to turn the envelope into an outcome
/// rather than reading the optional members directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    /// Id of the request this answers, `None` if the server could not tell
    #[serde(default)]
    pub id: Option<RequestId>,
    /// Method result on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// Error object on failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl RpcResponse {
    /// Create a success response
    pub fn success(result: serde_json::Value, id: RequestId) -> Self {
        Self {
            id: Some(id),
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response
    pub fn failure(error: RpcError, id: Option<RequestId>) -> Self {
        Self {
            id,
            result: None,
            error: Some(error),
        }
    }

    /// Check if this response carries an error
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Check if this response carries a result and no error
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.result.is_some()
    }

    /// Convert the envelope into `Ok(result)` or `Err(error)`
    ///
    /// An error member wins over a result member. A response with neither is
    /// a protocol violation rather than an empty success.
    ///
    /// ```rust
    /// use jline_core::{Error, RpcError, RpcResponse};
    /// use serde_json::json;
    ///
    /// let ok = RpcResponse::success(json!({"Message": "Hello, X"}), 0);
    /// assert_eq!(ok.into_result().unwrap()["Message"], "Hello, X");
    ///
    /// let failed = RpcResponse::failure(RpcError::new("method not found"), Some(0));
    /// assert!(matches!(failed.into_result(), Err(Error::Remote(_))));
    /// ```
    pub fn into_result(self) -> Result<serde_json::Value> {
        match (self.error, self.result) {
            (Some(error), _) => Err(Error::Remote(error)),
            (None, Some(result)) => Ok(result),
            (None, None) => Err(Error::Protocol(
                "response carries neither result nor error".to_string(),
            )),
        }
    }
}
