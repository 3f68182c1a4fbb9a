//! Invocation transports
//!
//! A transport hands the next invocation's payload to the platform. The
//! handler only waits for the platform to accept the invocation, never for
//! the invocation itself to run.

pub mod http;
pub mod lambda;
pub mod local;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub use http::HttpInvoker;
pub use lambda::LambdaInvoker;
pub use local::LocalQueue;

/// Errors raised while dispatching an invocation
#[derive(Debug, Error)]
pub enum TransportError {
    /// The platform did not answer in time
    #[error("invocation request timed out")]
    Timeout,

    /// The platform could not be reached
    #[error("connection error: {0}")]
    Connection(String),

    /// The platform refused the invocation
    #[error("invocation rejected with status {status}: {body}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Response body, as returned by the platform
        body: String,
    },

    /// The transport no longer accepts invocations
    #[error("transport is closed")]
    Closed,

    /// The payload could not be encoded for the wire
    #[error("failed to encode payload: {0}")]
    Encode(String),
}

/// Dispatches asynchronous self re-invocations
#[async_trait]
pub trait InvocationTransport: Send + Sync {
    /// Schedule `function_name` to run with `payload` as its event.
    ///
    /// Resolves once the platform has accepted the invocation.
    async fn invoke_async(&self, function_name: &str, payload: Value)
        -> Result<(), TransportError>;
}
