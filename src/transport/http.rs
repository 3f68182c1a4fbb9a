//! HTTP transport speaking the Lambda Invoke API.
//!
//! Posts the payload to `{endpoint}/2015-03-31/functions/{name}/invocations`
//! with the `Event` invocation type, which is what the platform and
//! Lambda-compatible local emulators serve. Requests are unsigned.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use super::{InvocationTransport, TransportError};

/// Environment variable naming the invoke endpoint
pub const ENDPOINT_ENV: &str = "AWS_ENDPOINT_URL_LAMBDA";

/// Endpoint used when nothing else is configured
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:3001";

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Dispatches invocations over HTTP
#[derive(Debug, Clone)]
pub struct HttpInvoker {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpInvoker {
    /// Create an invoker for the given endpoint base URL.
    ///
    /// # Arguments
    /// * `endpoint` - Base URL, e.g. `http://127.0.0.1:3001`
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Create an invoker from `AWS_ENDPOINT_URL_LAMBDA`, falling back to the
    /// local emulator default.
    #[must_use]
    pub fn from_env() -> Self {
        let endpoint = std::env::var(ENDPOINT_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        Self::new(endpoint)
    }

    /// Set the per-request timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Base URL requests are sent to
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Full invoke URL for a function
    #[must_use]
    pub fn invocation_url(&self, function_name: &str) -> String {
        format!(
            "{}/2015-03-31/functions/{function_name}/invocations",
            self.endpoint
        )
    }
}

#[async_trait]
impl InvocationTransport for HttpInvoker {
    async fn invoke_async(
        &self,
        function_name: &str,
        payload: Value,
    ) -> Result<(), TransportError> {
        let url = self.invocation_url(function_name);
        let body =
            serde_json::to_vec(&payload).map_err(|e| TransportError::Encode(e.to_string()))?;

        debug!(%url, bytes = body.len(), "Sending async invocation");

        let response = self
            .client
            .post(&url)
            .header("X-Amz-Invocation-Type", "Event")
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout
                } else {
                    TransportError::Connection(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}
