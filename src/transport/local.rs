//! In-process transport
//!
//! Queues invocations in memory instead of sending them anywhere. Used by
//! the local chain driver and in tests to observe what would have been
//! dispatched.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;

use super::{InvocationTransport, TransportError};

/// An invocation waiting in a [`LocalQueue`]
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedInvocation {
    /// Function the invocation is addressed to
    pub function_name: String,
    /// Event payload
    pub payload: Value,
}

#[derive(Debug, Default)]
struct Inner {
    pending: VecDeque<QueuedInvocation>,
    closed: bool,
}

/// FIFO of dispatched invocations.
///
/// Clones share the same queue.
#[derive(Debug, Clone, Default)]
pub struct LocalQueue {
    inner: Arc<Mutex<Inner>>,
}

impl LocalQueue {
    /// Create an empty, open queue
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panic while holding the lock leaves the queue itself consistent
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Take the oldest queued invocation
    #[must_use]
    pub fn pop(&self) -> Option<QueuedInvocation> {
        self.lock().pending.pop_front()
    }

    /// Take the oldest invocation addressed to `function_name`, leaving
    /// the others queued
    #[must_use]
    pub fn take_for(&self, function_name: &str) -> Option<QueuedInvocation> {
        let mut inner = self.lock();
        let index = inner
            .pending
            .iter()
            .position(|queued| queued.function_name == function_name)?;
        inner.pending.remove(index)
    }

    /// Take every queued invocation, oldest first
    #[must_use]
    pub fn drain(&self) -> Vec<QueuedInvocation> {
        self.lock().pending.drain(..).collect()
    }

    /// Number of queued invocations
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().pending.len()
    }

    /// Whether nothing is queued
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().pending.is_empty()
    }

    /// Refuse further invocations. Already queued ones stay available.
    pub fn close(&self) {
        self.lock().closed = true;
    }
}

#[async_trait]
impl InvocationTransport for LocalQueue {
    async fn invoke_async(
        &self,
        function_name: &str,
        payload: Value,
    ) -> Result<(), TransportError> {
        let mut inner = self.lock();
        if inner.closed {
            return Err(TransportError::Closed);
        }
        inner.pending.push_back(QueuedInvocation {
            function_name: function_name.to_string(),
            payload,
        });
        Ok(())
    }
}
