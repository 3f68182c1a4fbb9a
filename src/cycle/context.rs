//! Execution context handed to the runner
//!
//! A `CycleContext` is built fresh for every invocation. It carries the
//! resolved cycle state and two cooperative checkpoints: a deadline
//! predicate and a cancellation assertion. Neither can interrupt the runner;
//! the runner is expected to call them between units of work.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use futures::future::BoxFuture;

use crate::cycle::event::{CycleState, Offset};
use crate::error::CancellationRequested;

/// Async predicate deciding whether the run should be cancelled at an offset
pub type CancellationCheck<C> = Arc<dyn Fn(C) -> BoxFuture<'static, Result<bool>> + Send + Sync>;

/// Read-only view of one cycle, passed to the runner
#[derive(Clone)]
pub struct CycleContext<C> {
    state: CycleState<C>,
    started: Instant,
    check: Option<CancellationCheck<C>>,
}

impl<C: Offset> CycleContext<C> {
    /// Create a context whose clock starts at `started`
    #[must_use]
    pub fn new(
        state: CycleState<C>,
        started: Instant,
        check: Option<CancellationCheck<C>>,
    ) -> Self {
        Self {
            state,
            started,
            check,
        }
    }

    /// Offset this cycle started from
    #[must_use]
    pub const fn begin_offset(&self) -> &C {
        &self.state.begin_offset
    }

    /// Remaining re-invocation budget, including this cycle
    #[must_use]
    pub const fn cycle_allowed(&self) -> u32 {
        self.state.cycle_allowed
    }

    /// Minutes this cycle may run
    #[must_use]
    pub const fn cycle_minutes(&self) -> f64 {
        self.state.cycle_minutes
    }

    /// The cycle's time allowance.
    ///
    /// Saturates at `Duration::MAX` for allowances too large to represent.
    #[must_use]
    pub fn budget(&self) -> Duration {
        let secs = self.state.cycle_minutes * 60.0;
        if secs.is_nan() || secs <= 0.0 {
            return Duration::ZERO;
        }
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }

    /// Time since the invocation started
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Time left before [`should_stop`](Self::should_stop) turns true
    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.budget().saturating_sub(self.elapsed())
    }

    /// Whether the cycle has used up its time allowance.
    ///
    /// The runner should return its current offset promptly once this is true.
    #[must_use]
    pub fn should_stop(&self) -> bool {
        self.elapsed().as_secs_f64() > self.state.cycle_minutes * 60.0
    }

    /// Checkpoint for cooperative cancellation.
    ///
    /// Fails with [`CancellationRequested`] carrying `offset` when the
    /// configured check says so. Errors from the check itself are returned
    /// as-is. Without a configured check this always succeeds.
    pub async fn assert_cancellation(&self, offset: &C) -> Result<()> {
        let Some(check) = &self.check else {
            return Ok(());
        };

        if check(offset.clone()).await? {
            return Err(CancellationRequested::new(offset.clone()).into());
        }
        Ok(())
    }
}

impl<C: std::fmt::Debug> std::fmt::Debug for CycleContext<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CycleContext")
            .field("state", &self.state)
            .field("started", &self.started)
            .field("cancellable", &self.check.is_some())
            .finish()
    }
}
