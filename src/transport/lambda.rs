//! Platform transport backed by the AWS SDK.
//!
//! Signs and sends `Invoke` requests with the `Event` invocation type, using
//! the standard credential, region and endpoint resolution of `aws-config`.
//! This is the transport a handler uses when none is injected.

use std::time::Duration;

use async_trait::async_trait;
use aws_config::timeout::TimeoutConfig;
use aws_config::BehaviorVersion;
use aws_sdk_lambda::error::{DisplayErrorContext, SdkError};
use aws_sdk_lambda::operation::invoke::InvokeError;
use aws_sdk_lambda::primitives::Blob;
use aws_sdk_lambda::types::InvocationType;
use aws_sdk_lambda::Client;
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::debug;

use super::{InvocationTransport, TransportError};

/// Dispatches invocations through the Lambda API
#[derive(Debug, Default)]
pub struct LambdaInvoker {
    client: OnceCell<Client>,
    timeout: Option<Duration>,
}

impl LambdaInvoker {
    /// Create an invoker configured from the environment.
    ///
    /// Configuration is loaded on the first dispatch, so building a handler
    /// never touches the network or the credential chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an invoker around an already configured client
    ///
    /// # Arguments
    /// * `client` - Client used for every dispatch; `with_timeout` does not
    ///   apply to it
    #[must_use]
    pub fn from_client(client: Client) -> Self {
        Self {
            client: OnceCell::new_with(Some(client)),
            timeout: None,
        }
    }

    /// Set the per-operation timeout used when loading configuration
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    async fn client(&self) -> &Client {
        self.client
            .get_or_init(|| async {
                let mut loader = aws_config::defaults(BehaviorVersion::latest());
                if let Some(timeout) = self.timeout {
                    loader = loader.timeout_config(
                        TimeoutConfig::builder().operation_timeout(timeout).build(),
                    );
                }
                Client::new(&loader.load().await)
            })
            .await
    }
}

fn classify(err: SdkError<InvokeError>) -> TransportError {
    let status = match &err {
        SdkError::TimeoutError(_) => return TransportError::Timeout,
        SdkError::ServiceError(service) => Some(service.raw().status().as_u16()),
        _ => None,
    };

    let message = DisplayErrorContext(err).to_string();
    match status {
        Some(status) => TransportError::Rejected {
            status,
            body: message,
        },
        None => TransportError::Connection(message),
    }
}

#[async_trait]
impl InvocationTransport for LambdaInvoker {
    async fn invoke_async(
        &self,
        function_name: &str,
        payload: Value,
    ) -> Result<(), TransportError> {
        let body =
            serde_json::to_vec(&payload).map_err(|e| TransportError::Encode(e.to_string()))?;

        debug!(function = %function_name, bytes = body.len(), "Sending async invocation");

        let output = self
            .client()
            .await
            .invoke()
            .function_name(function_name)
            .invocation_type(InvocationType::Event)
            .payload(Blob::new(body))
            .send()
            .await
            .map_err(classify)?;

        debug!(status = output.status_code(), "Invocation accepted");
        Ok(())
    }
}
