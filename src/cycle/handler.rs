//! Continuation handler
//!
//! Wraps a runner into an invocation entry point. Each invocation resolves
//! its cycle state from the incoming event, runs the runner once, and then
//! either stops or dispatches exactly one follow-up invocation carrying the
//! next offset and a decremented budget.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use serde_json::{Map, Value};
use tracing::{error, info, warn};

use crate::cycle::context::{CancellationCheck, CycleContext};
use crate::cycle::event::{CycleEvent, CycleState, NextInvocation, Offset};
use crate::error::CancellationRequested;
use crate::transport::{InvocationTransport, LambdaInvoker};

/// What a runner returns after one cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step<C> {
    /// More work remains, resume from this offset
    Continue(C),
    /// The workload is complete
    Finished,
}

/// Unit of work driven by the handler
#[async_trait]
pub trait CycleRunner<C: Offset>: Send + Sync {
    /// Process from `offset` until done, out of time, or cancelled.
    async fn run(&self, offset: C, ctx: CycleContext<C>) -> Result<Step<C>>;
}

/// Runner built from an async closure, see [`runner_fn`]
pub struct FnRunner<F> {
    f: F,
}

/// Wrap an async closure as a [`CycleRunner`]
pub fn runner_fn<C, F, Fut>(f: F) -> FnRunner<F>
where
    C: Offset,
    F: Fn(C, CycleContext<C>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Step<C>>> + Send + 'static,
{
    FnRunner { f }
}

#[async_trait]
impl<C, F, Fut> CycleRunner<C> for FnRunner<F>
where
    C: Offset,
    F: Fn(C, CycleContext<C>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Step<C>>> + Send + 'static,
{
    async fn run(&self, offset: C, ctx: CycleContext<C>) -> Result<Step<C>> {
        (self.f)(offset, ctx).await
    }
}

/// Hook invoked with the offset a cancellation was observed at
pub type CancelledHook<C> = Arc<dyn Fn(C) -> BoxFuture<'static, Result<()>> + Send + Sync>;

/// Construction-time configuration of a handler
pub struct HandlerOptions<C> {
    function_name: String,
    cycle_minutes: Option<f64>,
    cycle_allowed: Option<u32>,
    transport: Option<Arc<dyn InvocationTransport>>,
    extra_payload: Map<String, Value>,
    check_for_cancellation: Option<CancellationCheck<C>>,
    on_cancelled: Option<CancelledHook<C>>,
}

impl<C: Offset> HandlerOptions<C> {
    /// Options re-invoking `function_name`, everything else unset
    pub fn new(function_name: impl Into<String>) -> Self {
        Self {
            function_name: function_name.into(),
            cycle_minutes: None,
            cycle_allowed: None,
            transport: None,
            extra_payload: Map::new(),
            check_for_cancellation: None,
            on_cancelled: None,
        }
    }

    /// Minutes per cycle when the event does not say
    #[must_use]
    pub fn cycle_minutes(mut self, minutes: f64) -> Self {
        self.cycle_minutes = Some(minutes);
        self
    }

    /// Re-invocation budget when the event does not say
    #[must_use]
    pub fn cycle_allowed(mut self, allowed: u32) -> Self {
        self.cycle_allowed = Some(allowed);
        self
    }

    /// Transport used to dispatch continuations
    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn InvocationTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Static data merged into every continuation payload
    #[must_use]
    pub fn extra_payload(mut self, extra: Map<String, Value>) -> Self {
        self.extra_payload = extra;
        self
    }

    /// Predicate consulted by [`CycleContext::assert_cancellation`]
    #[must_use]
    pub fn check_for_cancellation<F, Fut>(mut self, check: F) -> Self
    where
        F: Fn(C) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<bool>> + Send + 'static,
    {
        self.check_for_cancellation = Some(Arc::new(move |offset| check(offset).boxed()));
        self
    }

    /// Hook awaited when the runner fails with a cancellation
    #[must_use]
    pub fn on_cancelled<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(C) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.on_cancelled = Some(Arc::new(move |offset| hook(offset).boxed()));
        self
    }
}

impl<C> fmt::Debug for HandlerOptions<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerOptions")
            .field("function_name", &self.function_name)
            .field("cycle_minutes", &self.cycle_minutes)
            .field("cycle_allowed", &self.cycle_allowed)
            .field("transport", &self.transport.is_some())
            .field("extra_payload", &self.extra_payload)
            .field("check_for_cancellation", &self.check_for_cancellation.is_some())
            .field("on_cancelled", &self.on_cancelled.is_some())
            .finish()
    }
}

/// Terminal state of one invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TerminalState {
    /// The runner failed
    Failed,
    /// The runner stopped on a cancellation request
    Cancelled,
    /// The runner reported the workload complete
    Finished,
    /// Work remains but the budget is used up
    Depleted,
    /// A continuation was dispatched
    Scheduled,
}

impl fmt::Display for TerminalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::Finished => "finished",
            Self::Depleted => "depleted",
            Self::Scheduled => "scheduled",
        };
        f.write_str(name)
    }
}

/// How a successful invocation ended
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<C> {
    /// The runner reported the workload complete
    Finished,
    /// Work remains at `next_offset` but no budget is left
    Depleted {
        /// Where the next cycle would have started
        next_offset: C,
    },
    /// A continuation was dispatched
    Scheduled {
        /// What was dispatched
        next: NextInvocation<C>,
    },
}

impl<C> Outcome<C> {
    /// Terminal state this outcome corresponds to
    #[must_use]
    pub const fn state(&self) -> TerminalState {
        match self {
            Self::Finished => TerminalState::Finished,
            Self::Depleted { .. } => TerminalState::Depleted,
            Self::Scheduled { .. } => TerminalState::Scheduled,
        }
    }

    /// Offset the chain stopped at or continues from, if any
    #[must_use]
    pub const fn next_offset(&self) -> Option<&C> {
        match self {
            Self::Finished => None,
            Self::Depleted { next_offset } => Some(next_offset),
            Self::Scheduled { next } => Some(&next.offset),
        }
    }
}

/// Summary of a successful invocation
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport<C> {
    /// State the invocation started with
    pub state: CycleState<C>,
    /// How it ended
    pub outcome: Outcome<C>,
    /// Whether the runner returned its starting offset
    pub stalled: bool,
    /// Wall-clock time spent in the invocation
    pub elapsed: Duration,
}

/// Entry point wrapping a runner with continuation scheduling
pub struct ContinuationHandler<C, R> {
    runner: R,
    function_name: String,
    cycle_minutes: Option<f64>,
    cycle_allowed: Option<u32>,
    transport: Arc<dyn InvocationTransport>,
    extra_payload: Map<String, Value>,
    check_for_cancellation: Option<CancellationCheck<C>>,
    on_cancelled: Option<CancelledHook<C>>,
}

impl<C: Offset, R: CycleRunner<C>> ContinuationHandler<C, R> {
    /// Create a handler.
    ///
    /// Without an injected transport, a fresh [`LambdaInvoker`] is
    /// built for this handler.
    pub fn new(runner: R, options: HandlerOptions<C>) -> Result<Self> {
        if options.function_name.trim().is_empty() {
            bail!("Function name for re-invocation cannot be empty");
        }

        let transport = options
            .transport
            .unwrap_or_else(|| Arc::new(LambdaInvoker::new()));

        Ok(Self {
            runner,
            function_name: options.function_name,
            cycle_minutes: options.cycle_minutes,
            cycle_allowed: options.cycle_allowed,
            transport,
            extra_payload: options.extra_payload,
            check_for_cancellation: options.check_for_cancellation,
            on_cancelled: options.on_cancelled,
        })
    }

    /// Function continuations are dispatched to
    #[must_use]
    pub fn function_name(&self) -> &str {
        &self.function_name
    }

    /// Handle one invocation.
    ///
    /// Returns the runner's error unchanged when it fails; no continuation is
    /// dispatched in that case.
    pub async fn handle(&self, event: Value) -> Result<CycleReport<C>> {
        let started = Instant::now();
        let event = match CycleEvent::from_value(event) {
            Ok(event) => event,
            Err(err) => {
                error!(error = %format!("{err:#}"), "Invalid invocation event, not running");
                return Err(err);
            }
        };
        let state = CycleState::resolve(event, self.cycle_minutes, self.cycle_allowed);

        let ctx = CycleContext::new(
            state.clone(),
            started,
            self.check_for_cancellation.clone(),
        );

        let step = match self.runner.run(state.begin_offset.clone(), ctx).await {
            Ok(step) => step,
            Err(err) => return Err(self.fail(err).await),
        };

        let stalled = matches!(&step, Step::Continue(next) if *next == state.begin_offset);
        if stalled {
            warn!(
                offset = ?state.begin_offset,
                "Runner returned the offset it started from; the next cycle will repeat this work"
            );
        }

        let outcome = match step {
            Step::Finished => {
                info!(offset = ?state.begin_offset, "Runner finished its work");
                Outcome::Finished
            }
            Step::Continue(next_offset) if state.cycle_allowed <= 1 => {
                info!(next_offset = ?next_offset, "Cycle budget depleted, not rescheduling");
                Outcome::Depleted { next_offset }
            }
            Step::Continue(next_offset) => {
                let next = NextInvocation {
                    extra_payload: self.extra_payload.clone(),
                    offset: next_offset,
                    cycle_allowed: state.cycle_allowed - 1,
                    cycle_minutes: state.cycle_minutes,
                };
                self.dispatch(&next).await?;
                Outcome::Scheduled { next }
            }
        };

        Ok(CycleReport {
            state,
            outcome,
            stalled,
            elapsed: started.elapsed(),
        })
    }

    async fn fail(&self, err: anyhow::Error) -> anyhow::Error {
        let Some(cancelled) = err.downcast_ref::<CancellationRequested<C>>() else {
            error!(error = %err, "Runner failed, not rescheduling");
            return err;
        };

        let offset = cancelled.offset.clone();
        if let Some(hook) = &self.on_cancelled {
            if let Err(hook_err) = hook(offset.clone()).await {
                error!(offset = ?offset, error = %hook_err, "Cancellation hook failed");
                return hook_err;
            }
        }
        error!(offset = ?offset, "Runner requested cancellation, not rescheduling");
        err
    }

    async fn dispatch(&self, next: &NextInvocation<C>) -> Result<()> {
        let payload = next.to_payload()?;
        if let Err(err) = self.transport.invoke_async(&self.function_name, payload).await {
            error!(
                function = %self.function_name,
                next_offset = ?next.offset,
                error = %err,
                "Failed to dispatch next cycle"
            );
            return Err(err).with_context(|| {
                format!("Failed to dispatch next cycle of '{}'", self.function_name)
            });
        }

        info!(
            function = %self.function_name,
            next_offset = ?next.offset,
            cycle_allowed = next.cycle_allowed,
            cycle_minutes = next.cycle_minutes,
            "Scheduled next cycle"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{always_cancel, options_with, Counter, FailingTransport};
    use crate::transport::LocalQueue;
    use serde_json::json;
    use std::sync::atomic::Ordering;
    use tracing_test::traced_test;

    #[derive(Debug, thiserror::Error)]
    #[error("upstream returned 503")]
    struct UpstreamError;

    fn returning(step: Step<u64>) -> impl CycleRunner<u64> {
        runner_fn(move |_offset: u64, _ctx: CycleContext<u64>| {
            let step = step.clone();
            async move { Ok::<_, anyhow::Error>(step) }
        })
    }

    fn handler<R: CycleRunner<u64>>(
        runner: R,
        queue: &LocalQueue,
    ) -> ContinuationHandler<u64, R> {
        ContinuationHandler::new(runner, options_with(queue).cycle_minutes(12.0).cycle_allowed(3))
            .unwrap()
    }

    #[test]
    fn test_new_rejects_empty_function_name() {
        let result = ContinuationHandler::new(
            returning(Step::Finished),
            HandlerOptions::<u64>::new("  ").transport(Arc::new(LocalQueue::new())),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_new_builds_default_transport() {
        let handler =
            ContinuationHandler::new(returning(Step::Finished), HandlerOptions::<u64>::new("worker"))
                .unwrap();
        assert_eq!(handler.function_name(), "worker");
    }

    // Scenario A
    #[traced_test]
    #[tokio::test]
    async fn test_fresh_event_schedules_with_configured_values() {
        let queue = LocalQueue::new();
        let handler = handler(returning(Step::Continue(5)), &queue);

        let report = handler.handle(json!({})).await.unwrap();

        assert_eq!(report.outcome.state(), TerminalState::Scheduled);
        let dispatched = queue.drain();
        assert_eq!(dispatched.len(), 1);
        assert_eq!(dispatched[0].function_name, "worker");
        let payload = &dispatched[0].payload;
        assert_eq!(payload["offset"], json!(5));
        assert_eq!(payload["cycleAllowed"], json!(2));
        assert_eq!(payload["cycleMinutes"].as_f64(), Some(12.0));
        assert!(logs_contain("Scheduled next cycle"));
    }

    // Scenario B
    #[traced_test]
    #[tokio::test]
    async fn test_last_allowed_cycle_does_not_reschedule() {
        let queue = LocalQueue::new();
        let handler = handler(returning(Step::Continue(7)), &queue);

        let report = handler
            .handle(json!({"offset": 5, "cycleAllowed": 1, "cycleMinutes": 12}))
            .await
            .unwrap();

        assert_eq!(report.outcome, Outcome::Depleted { next_offset: 7 });
        assert!(queue.is_empty());
        assert!(logs_contain("Cycle budget depleted"));
    }

    // Scenario C
    #[traced_test]
    #[tokio::test]
    async fn test_finished_does_not_reschedule() {
        let queue = LocalQueue::new();
        let handler = handler(returning(Step::Finished), &queue);

        let report = handler
            .handle(json!({"offset": 5, "cycleAllowed": 3}))
            .await
            .unwrap();

        assert_eq!(report.outcome, Outcome::Finished);
        assert!(!report.stalled);
        assert!(queue.is_empty());
        assert!(logs_contain("Runner finished its work"));
    }

    #[tokio::test]
    async fn test_finished_wins_over_depleted_budget() {
        let queue = LocalQueue::new();
        let handler = handler(returning(Step::Finished), &queue);

        let report = handler.handle(json!({"cycleAllowed": 1})).await.unwrap();

        assert_eq!(report.outcome.state(), TerminalState::Finished);
        assert!(queue.is_empty());
    }

    // Scenario D
    #[traced_test]
    #[tokio::test]
    async fn test_stall_warns_but_still_schedules() {
        let queue = LocalQueue::new();
        let handler = handler(returning(Step::Continue(0)), &queue);

        let report = handler.handle(json!({"offset": 0})).await.unwrap();

        assert!(report.stalled);
        assert!(logs_contain("Runner returned the offset it started from"));
        let dispatched = queue.drain();
        assert_eq!(dispatched.len(), 1);
        assert_eq!(dispatched[0].payload["offset"], json!(0));
        assert_eq!(dispatched[0].payload["cycleAllowed"], json!(2));
    }

    #[traced_test]
    #[tokio::test]
    async fn test_stall_on_last_cycle_is_depleted() {
        let queue = LocalQueue::new();
        let handler = handler(returning(Step::Continue(4)), &queue);

        let report = handler
            .handle(json!({"offset": 4, "cycleAllowed": 1}))
            .await
            .unwrap();

        assert!(report.stalled);
        assert_eq!(report.outcome.state(), TerminalState::Depleted);
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_decrements_incoming_budget() {
        let queue = LocalQueue::new();
        let handler = handler(returning(Step::Continue(100)), &queue);

        for allowed in [2_u32, 5, 40] {
            handler
                .handle(json!({"offset": 1, "cycleAllowed": allowed}))
                .await
                .unwrap();
            let payload = queue.pop().unwrap().payload;
            assert_eq!(payload["cycleAllowed"], json!(allowed - 1));
        }
    }

    #[tokio::test]
    async fn test_runner_receives_resolved_offset_and_context() {
        let queue = LocalQueue::new();
        let runner = runner_fn(|offset: u64, ctx: CycleContext<u64>| async move {
            assert_eq!(offset, 41);
            assert_eq!(*ctx.begin_offset(), 41);
            assert_eq!(ctx.cycle_allowed(), 6);
            assert!((ctx.cycle_minutes() - 0.5).abs() < f64::EPSILON);
            assert!(!ctx.should_stop());
            Ok::<_, anyhow::Error>(Step::Finished)
        });
        let handler = handler(runner, &queue);

        handler
            .handle(json!({"offset": 41, "cycleAllowed": 6, "cycleMinutes": 0.5}))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_defaults_apply_without_options() {
        let queue = LocalQueue::new();
        let handler =
            ContinuationHandler::new(returning(Step::Continue(1)), options_with(&queue)).unwrap();

        let report = handler.handle(Value::Null).await.unwrap();

        assert_eq!(report.state.begin_offset, 0);
        assert_eq!(report.state.cycle_allowed, 3);
        let payload = queue.pop().unwrap().payload;
        assert_eq!(payload["cycleAllowed"], json!(2));
        assert_eq!(payload["cycleMinutes"].as_f64(), Some(12.0));
    }

    #[tokio::test]
    async fn test_extra_payload_is_merged_and_overwritten() {
        let queue = LocalQueue::new();
        let mut extra = Map::new();
        extra.insert("tenant".to_string(), json!("acme"));
        extra.insert("cycleMinutes".to_string(), json!("ignored"));
        let handler = ContinuationHandler::new(
            returning(Step::Continue(9)),
            options_with(&queue).extra_payload(extra),
        )
        .unwrap();

        handler.handle(json!({"cycleMinutes": 2})).await.unwrap();

        let payload = queue.pop().unwrap().payload;
        assert_eq!(payload["tenant"], json!("acme"));
        assert_eq!(payload["cycleMinutes"].as_f64(), Some(2.0));
    }

    // P7
    #[traced_test]
    #[tokio::test]
    async fn test_runner_error_is_returned_unchanged() {
        let queue = LocalQueue::new();
        let runner = runner_fn(|_offset: u64, _ctx: CycleContext<u64>| async {
            Err(anyhow::Error::new(UpstreamError))
        });
        let handler = handler(runner, &queue);

        let err = handler.handle(json!({"offset": 3})).await.unwrap_err();

        assert!(err.downcast_ref::<UpstreamError>().is_some());
        assert!(queue.is_empty());
        assert!(logs_contain("Runner failed"));
    }

    // Scenario E / P6
    #[traced_test]
    #[tokio::test]
    async fn test_cancellation_invokes_hook_once_and_stops() {
        let queue = LocalQueue::new();
        let hook_calls = Counter::default();
        let seen = hook_calls.clone();
        let options = options_with(&queue)
            .check_for_cancellation(always_cancel)
            .on_cancelled(move |offset: u64| {
                let seen = seen.clone();
                async move {
                    seen.record(offset);
                    Ok::<_, anyhow::Error>(())
                }
            });
        let runner = runner_fn(|offset: u64, ctx: CycleContext<u64>| async move {
            let at = offset + 2;
            ctx.assert_cancellation(&at).await?;
            Ok::<_, anyhow::Error>(Step::Continue(at + 1))
        });
        let handler = ContinuationHandler::new(runner, options).unwrap();

        let err = handler.handle(json!({"offset": 10})).await.unwrap_err();

        let cancelled = err.downcast_ref::<CancellationRequested<u64>>().unwrap();
        assert_eq!(cancelled.offset, 12);
        assert_eq!(hook_calls.calls.load(Ordering::SeqCst), 1);
        assert_eq!(hook_calls.last(), Some(12));
        assert!(queue.is_empty());
        assert!(logs_contain("Runner requested cancellation"));
    }

    #[tokio::test]
    async fn test_cancellation_without_hook_still_returns_error() {
        let queue = LocalQueue::new();
        let runner = runner_fn(|offset: u64, ctx: CycleContext<u64>| async move {
            ctx.assert_cancellation(&offset).await?;
            Ok::<_, anyhow::Error>(Step::Finished)
        });
        let handler = ContinuationHandler::new(
            runner,
            options_with(&queue).check_for_cancellation(always_cancel),
        )
        .unwrap();

        let err = handler.handle(json!({"offset": 1})).await.unwrap_err();
        assert!(err.downcast_ref::<CancellationRequested<u64>>().is_some());
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_failing_cancel_hook_masks_original_error() {
        let queue = LocalQueue::new();
        let options = options_with(&queue)
            .check_for_cancellation(always_cancel)
            .on_cancelled(|_offset: u64| async { Err(anyhow::anyhow!("audit log unavailable")) });
        let runner = runner_fn(|offset: u64, ctx: CycleContext<u64>| async move {
            ctx.assert_cancellation(&offset).await?;
            Ok::<_, anyhow::Error>(Step::Finished)
        });
        let handler = ContinuationHandler::new(runner, options).unwrap();

        let err = handler.handle(json!({})).await.unwrap_err();
        assert!(err.downcast_ref::<CancellationRequested<u64>>().is_none());
        assert!(err.to_string().contains("audit log unavailable"));
    }

    #[tokio::test]
    async fn test_runner_ignoring_cancellation_check_continues() {
        let queue = LocalQueue::new();
        let handler = ContinuationHandler::new(
            returning(Step::Continue(2)),
            options_with(&queue).check_for_cancellation(always_cancel),
        )
        .unwrap();

        let report = handler.handle(json!({})).await.unwrap();
        assert_eq!(report.outcome.state(), TerminalState::Scheduled);
    }

    #[traced_test]
    #[tokio::test]
    async fn test_dispatch_failure_is_an_error() {
        let handler = ContinuationHandler::new(
            returning(Step::Continue(2)),
            HandlerOptions::new("worker").transport(Arc::new(FailingTransport)),
        )
        .unwrap();

        let err = handler.handle(json!({})).await.unwrap_err();
        assert!(err.to_string().contains("Failed to dispatch next cycle of 'worker'"));
        assert!(err.downcast_ref::<crate::transport::TransportError>().is_some());
        assert!(logs_contain("Failed to dispatch next cycle"));
        assert!(logs_contain("connection refused"));
    }

    #[traced_test]
    #[tokio::test]
    async fn test_invalid_event_fails_before_running() {
        let queue = LocalQueue::new();
        let runs = Counter::default();
        let seen = runs.clone();
        let runner = runner_fn(move |offset: u64, _ctx: CycleContext<u64>| {
            seen.record(offset);
            async { Ok::<_, anyhow::Error>(Step::Finished) }
        });
        let handler = handler(runner, &queue);

        assert!(handler.handle(json!("not an object")).await.is_err());
        assert_eq!(runs.calls.load(Ordering::SeqCst), 0);
        assert!(logs_contain("Invalid invocation event"));
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_string_offsets_cannot_collide_with_finished() {
        let queue = LocalQueue::new();
        let runner = runner_fn(|_offset: String, _ctx: CycleContext<String>| async {
            Ok::<_, anyhow::Error>(Step::Continue("finished".to_string()))
        });
        let handler = ContinuationHandler::new(runner, options_with(&queue)).unwrap();

        let report = handler.handle(json!({})).await.unwrap();

        assert_eq!(report.outcome.state(), TerminalState::Scheduled);
        assert_eq!(queue.pop().unwrap().payload["offset"], json!("finished"));
    }

    #[test]
    fn test_terminal_state_display() {
        assert_eq!(TerminalState::Scheduled.to_string(), "scheduled");
        assert_eq!(TerminalState::Cancelled.to_string(), "cancelled");
    }
}
