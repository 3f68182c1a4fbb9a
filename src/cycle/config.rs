//! Relay configuration parser
//!
//! Parses `relay.toml` into handler and transport settings.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::cycle::event::Offset;
use crate::cycle::handler::HandlerOptions;
use crate::transport::{HttpInvoker, InvocationTransport, LambdaInvoker, LocalQueue};

/// Which transport dispatches continuations
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Lambda API through the AWS SDK, signed with the ambient credentials
    #[default]
    Lambda,
    /// Unsigned Invoke API requests, for local emulators
    Http,
    /// In-process queue, for local runs
    Local,
}

/// Handler settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HandlerConfig {
    /// Function continuations are dispatched to
    pub function_name: String,
    /// Minutes per cycle when the event does not say
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cycle_minutes: Option<f64>,
    /// Re-invocation budget when the event does not say
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cycle_allowed: Option<u32>,
    /// Static data merged into every continuation payload
    #[serde(default)]
    pub extra_payload: Map<String, Value>,
}

/// Transport settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransportConfig {
    /// Transport to use (default: lambda)
    #[serde(default)]
    pub kind: TransportKind,
    /// Invoke endpoint base URL for the `http` transport;
    /// `AWS_ENDPOINT_URL_LAMBDA` or the local emulator default when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Request timeout in seconds (default: 10)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

const fn default_timeout_secs() -> u64 {
    10
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            kind: TransportKind::default(),
            endpoint: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Top-level configuration parsed from relay.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RelayConfig {
    /// Handler settings
    pub handler: HandlerConfig,
    /// Transport settings
    #[serde(default)]
    pub transport: TransportConfig,
}

impl RelayConfig {
    /// Parse a relay.toml file from a path
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file (typically `relay.toml`)
    ///
    /// # Errors
    /// Returns an error if:
    /// - The file cannot be read
    /// - The content is not valid TOML for this schema
    /// - Validation fails (see [`RelayConfig::parse`])
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    /// Parse relay.toml content from a string
    ///
    /// # Arguments
    /// * `content` - TOML configuration text
    ///
    /// # Errors
    /// Returns an error if:
    /// - The TOML is malformed or `[handler]` is missing
    /// - `handler.function_name` is empty
    /// - `handler.cycle_minutes` is not a positive finite number
    /// - `handler.cycle_allowed` is zero
    /// - `transport.timeout_secs` is zero
    /// - `transport.endpoint` is set for a transport other than `http`, or
    ///   is not an http(s) URL
    pub fn parse(content: &str) -> Result<Self> {
        // Deserialize, then check the constraints serde cannot express
        let config: Self = toml::from_str(content).context("Failed to parse relay.toml")?;
        config.validate()?;
        Ok(config)
    }

    /// Build the transport this configuration describes.
    ///
    /// `local` gets a fresh [`LocalQueue`]; callers that need to drain it
    /// should construct their own and pass it to [`HandlerOptions::transport`].
    #[must_use]
    pub fn build_transport(&self) -> Arc<dyn InvocationTransport> {
        let timeout = Duration::from_secs(self.transport.timeout_secs);
        match self.transport.kind {
            TransportKind::Lambda => Arc::new(LambdaInvoker::new().with_timeout(timeout)),
            TransportKind::Http => {
                // Explicit endpoint first, then the environment
                let invoker = self
                    .transport
                    .endpoint
                    .as_ref()
                    .map_or_else(HttpInvoker::from_env, |endpoint| {
                        HttpInvoker::new(endpoint.as_str())
                    });
                Arc::new(invoker.with_timeout(timeout))
            }
            TransportKind::Local => Arc::new(LocalQueue::new()),
        }
    }

    /// Handler options from this configuration, with the configured
    /// transport attached.
    #[must_use]
    pub fn handler_options<C: Offset>(&self) -> HandlerOptions<C> {
        HandlerOptions::from_config(&self.handler).transport(self.build_transport())
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if self.handler.function_name.trim().is_empty() {
            bail!("handler.function_name cannot be empty");
        }

        if let Some(minutes) = self.handler.cycle_minutes {
            if !minutes.is_finite() || minutes <= 0.0 {
                bail!("handler.cycle_minutes must be a positive number, got {minutes}");
            }
        }

        if self.handler.cycle_allowed == Some(0) {
            bail!("handler.cycle_allowed must be at least 1");
        }

        if self.transport.timeout_secs == 0 {
            bail!("transport.timeout_secs must be at least 1");
        }

        if let Some(endpoint) = &self.transport.endpoint {
            if self.transport.kind != TransportKind::Http {
                bail!("transport.endpoint is only valid for the http transport");
            }
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                bail!("transport.endpoint must be an http(s) URL, got '{endpoint}'");
            }
        }

        Ok(())
    }
}

impl<C: Offset> HandlerOptions<C> {
    /// Options carrying the configured handler settings; no transport.
    ///
    /// # Arguments
    /// * `config` - The `[handler]` section of relay.toml
    #[must_use]
    pub fn from_config(config: &HandlerConfig) -> Self {
        let mut options = Self::new(config.function_name.clone())
            .extra_payload(config.extra_payload.clone());
        // Unset values stay unset so the event and the defaults decide
        if let Some(minutes) = config.cycle_minutes {
            options = options.cycle_minutes(minutes);
        }
        if let Some(allowed) = config.cycle_allowed {
            options = options.cycle_allowed(allowed);
        }
        options
    }
}
