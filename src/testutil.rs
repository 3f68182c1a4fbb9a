//! Shared test utilities
//!
//! Common helpers used across test modules. Only compiled in test builds.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use crate::cycle::event::Offset;
use crate::cycle::handler::HandlerOptions;
use crate::transport::{InvocationTransport, LocalQueue, TransportError};

/// Options re-invoking `worker` through `queue`, nothing else set.
#[must_use]
pub fn options_with<C: Offset>(queue: &LocalQueue) -> HandlerOptions<C> {
    HandlerOptions::new("worker").transport(Arc::new(queue.clone()))
}

/// Cancellation check that always asks to cancel.
pub async fn always_cancel(_offset: u64) -> Result<bool> {
    Ok(true)
}

/// Counts calls and remembers the last offset seen.
#[derive(Debug, Clone, Default)]
pub struct Counter {
    pub calls: Arc<AtomicUsize>,
    last: Arc<Mutex<Option<u64>>>,
}

impl Counter {
    pub fn record(&self, offset: u64) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some(offset);
    }

    #[must_use]
    pub fn last(&self) -> Option<u64> {
        *self.last.lock().unwrap()
    }
}

/// Transport whose every dispatch fails.
pub struct FailingTransport;

#[async_trait]
impl InvocationTransport for FailingTransport {
    async fn invoke_async(
        &self,
        _function_name: &str,
        _payload: Value,
    ) -> Result<(), TransportError> {
        Err(TransportError::Connection("connection refused".to_string()))
    }
}
