//! Local chain driver
//!
//! Runs a whole continuation chain in-process: the handler dispatches into a
//! [`LocalQueue`], and the driver keeps feeding queued events back into the
//! handler until nothing is left. Each invocation can be recorded to a
//! [`Journal`].

use std::time::Instant;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::cycle::event::Offset;
use crate::cycle::handler::{ContinuationHandler, CycleReport, CycleRunner, TerminalState};
use crate::error::CancellationRequested;
use crate::log::{InvocationRecord, Journal};
use crate::transport::LocalQueue;

/// Invocations allowed per run unless configured otherwise
pub const DEFAULT_MAX_INVOCATIONS: u32 = 1000;

/// Result of a completed local chain
#[derive(Debug, Clone, PartialEq)]
pub struct ChainSummary<C> {
    /// Number of invocations run
    pub invocations: u32,
    /// Report of the last invocation
    pub last: CycleReport<C>,
    /// Invocations whose runner returned its starting offset
    pub stalls: u32,
}

/// Drives a handler through its whole chain in-process
pub struct LocalChain<'a, C, R> {
    handler: &'a ContinuationHandler<C, R>,
    queue: LocalQueue,
    journal: Option<&'a Journal>,
    max_invocations: u32,
}

impl<'a, C: Offset, R: CycleRunner<C>> LocalChain<'a, C, R> {
    /// Create a driver for `handler`, which must dispatch into `queue`
    #[must_use]
    pub fn new(handler: &'a ContinuationHandler<C, R>, queue: LocalQueue) -> Self {
        Self {
            handler,
            queue,
            journal: None,
            max_invocations: DEFAULT_MAX_INVOCATIONS,
        }
    }

    /// Record every invocation to `journal`
    #[must_use]
    pub fn with_journal(mut self, journal: &'a Journal) -> Self {
        self.journal = Some(journal);
        self
    }

    /// Fail the run once more than `max` invocations would be needed
    #[must_use]
    pub fn max_invocations(mut self, max: u32) -> Self {
        self.max_invocations = max;
        self
    }

    /// Run the chain starting from `initial_event`.
    ///
    /// Stops at the first handler error, after journalling it. Events queued
    /// for other functions are left in the queue.
    ///
    /// # Errors
    /// Returns an error if:
    /// - The handler fails; its error is returned unchanged, even when
    ///   journalling the failure also fails
    /// - A successful invocation cannot be journalled
    /// - The chain needs more than `max_invocations` invocations
    pub async fn run(&self, initial_event: Value) -> Result<ChainSummary<C>> {
        let mut event = initial_event;
        let mut invocations = 0_u32;
        let mut stalls = 0_u32;

        loop {
            if invocations >= self.max_invocations {
                bail!(
                    "Chain for '{}' exceeded {} invocations",
                    self.handler.function_name(),
                    self.max_invocations
                );
            }
            invocations += 1;

            debug!(invocation = invocations, "Starting local invocation");
            let started = Instant::now();
            let result = self.handler.handle(event.clone()).await;
            if let Err(journal_err) = self.record(invocations, &event, &result, started) {
                // The handler's own error takes precedence
                if result.is_ok() {
                    return Err(journal_err);
                }
                warn!(
                    invocation = invocations,
                    error = %format!("{journal_err:#}"),
                    "Failed to journal failed invocation"
                );
            }

            let report = result?;
            if report.stalled {
                stalls += 1;
            }

            let next = if report.outcome.state() == TerminalState::Scheduled {
                self.next_event()
            } else {
                None
            };

            match next {
                Some(next) => event = next,
                None => {
                    info!(
                        invocations,
                        stalls,
                        state = %report.outcome.state(),
                        "Local chain ended"
                    );
                    return Ok(ChainSummary {
                        invocations,
                        last: report,
                        stalls,
                    });
                }
            }
        }
    }

    /// Take the next event addressed to this handler's function
    fn next_event(&self) -> Option<Value> {
        self.queue
            .take_for(self.handler.function_name())
            .map(|queued| queued.payload)
    }

    fn record(
        &self,
        invocation: u32,
        event: &Value,
        result: &Result<CycleReport<C>>,
        started: Instant,
    ) -> Result<()> {
        let Some(journal) = self.journal else {
            return Ok(());
        };

        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let record = match result {
            Ok(report) => InvocationRecord {
                invocation,
                timestamp: Utc::now(),
                begin_offset: serde_json::to_value(&report.state.begin_offset)
                    .context("Failed to serialize begin offset")?,
                state: report.outcome.state(),
                next_offset: report
                    .outcome
                    .next_offset()
                    .map(serde_json::to_value)
                    .transpose()
                    .context("Failed to serialize next offset")?,
                cycle_allowed: report.state.cycle_allowed,
                stalled: report.stalled,
                duration_ms,
                error: None,
            },
            Err(err) => InvocationRecord {
                invocation,
                timestamp: Utc::now(),
                begin_offset: event.get("offset").cloned().unwrap_or(Value::Null),
                state: if err.downcast_ref::<CancellationRequested<C>>().is_some() {
                    TerminalState::Cancelled
                } else {
                    TerminalState::Failed
                },
                next_offset: None,
                cycle_allowed: event
                    .get("cycleAllowed")
                    .and_then(Value::as_u64)
                    .and_then(|n| u32::try_from(n).ok())
                    .unwrap_or_default(),
                stalled: false,
                duration_ms,
                error: Some(format!("{err:#}")),
            },
        };

        journal.append(&record)
    }
}
