//! Typed errors callers need to match on
//!
//! Everything else in the crate travels as `anyhow::Error`.

use std::fmt::Debug;

use thiserror::Error;

/// Raised from [`CycleContext::assert_cancellation`] when the configured
/// cancellation check asks for the run to stop.
///
/// The handler looks for this error anywhere in a runner's error chain, so a
/// runner may wrap it with `.context(..)` and it is still recognized.
///
/// [`CycleContext::assert_cancellation`]: crate::cycle::context::CycleContext::assert_cancellation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cancellation requested at offset {offset:?}")]
pub struct CancellationRequested<C: Debug> {
    /// The offset the runner was at when cancellation was observed
    pub offset: C,
}

impl<C: Debug> CancellationRequested<C> {
    /// Create a cancellation error for the given offset
    #[must_use]
    pub const fn new(offset: C) -> Self {
        Self { offset }
    }
}
