//! cycle-relay - resumable work for time-boxed functions
//!
//! CLI entry point. Runs a demo counting workload through the continuation
//! handler, either as a whole chain in-process or as a single cycle that
//! dispatches its continuation to the platform.

// Allow multiple crate versions from dependencies (can't easily control)
#![allow(clippy::multiple_crate_versions)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::Parser;
use colored::Colorize;
use serde_json::Value;

use cycle_relay::cycle::config::{RelayConfig, TransportKind};
use cycle_relay::cycle::context::CycleContext;
use cycle_relay::cycle::handler::{
    ContinuationHandler, CycleReport, CycleRunner, HandlerOptions, Step, TerminalState,
};
use cycle_relay::local::{ChainSummary, LocalChain};
use cycle_relay::log::{init_tracing, Journal};
use cycle_relay::transport::LocalQueue;

/// Resumable work for time-boxed serverless functions
///
/// Drives a counting workload through the continuation handler so a
/// relay.toml can be exercised end to end.
#[derive(Parser, Debug)]
#[command(name = "cycle-relay", version, about)]
struct Cli {
    /// Path to the relay.toml configuration file
    #[arg(long, default_value = "relay.toml")]
    config: PathBuf,

    /// Initial invocation event as JSON (defaults to a fresh trigger)
    #[arg(long)]
    event: Option<String>,

    /// Offset at which the demo workload is finished
    #[arg(long, default_value_t = 100)]
    target: u64,

    /// Milliseconds the demo workload spends per offset
    #[arg(long, default_value_t = 50)]
    step_ms: u64,

    /// Request cancellation once this file exists
    #[arg(long)]
    cancel_file: Option<PathBuf>,

    /// Directory for the invocation journal (.relay by default)
    #[arg(long, default_value = ".relay")]
    log_dir: PathBuf,

    /// Log level or tracing filter directives
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

/// Demo workload: advances the offset by one per step until `target`.
struct CountingRunner {
    target: u64,
    step: Duration,
}

#[async_trait]
impl CycleRunner<u64> for CountingRunner {
    async fn run(&self, offset: u64, ctx: CycleContext<u64>) -> Result<Step<u64>> {
        let mut offset = offset;
        while offset < self.target {
            if ctx.should_stop() {
                return Ok(Step::Continue(offset));
            }
            ctx.assert_cancellation(&offset).await?;
            tokio::time::sleep(self.step).await;
            offset += 1;
        }
        Ok(Step::Finished)
    }
}

/// Parse the `--event` argument, treating absence as a fresh trigger.
fn parse_event(raw: Option<&str>) -> Result<Value> {
    raw.map_or(Ok(Value::Null), |raw| {
        serde_json::from_str(raw).context("--event must be valid JSON")
    })
}

/// Wire `--cancel-file` into the options: cancel once the file exists, and
/// remove it when the cancellation has been handled.
fn with_cancel_file(options: HandlerOptions<u64>, path: PathBuf) -> HandlerOptions<u64> {
    let check_path = path.clone();
    options
        .check_for_cancellation(move |_offset: u64| {
            let path = check_path.clone();
            async move { Ok::<_, anyhow::Error>(tokio::fs::try_exists(&path).await?) }
        })
        .on_cancelled(move |offset: u64| {
            let path = path.clone();
            async move {
                tokio::fs::remove_file(&path)
                    .await
                    .with_context(|| format!("Failed to remove {}", path.display()))?;
                eprintln!("Cancelled at offset {offset}; removed {}", path.display());
                Ok::<_, anyhow::Error>(())
            }
        })
}

/// Colorized name of a terminal state.
fn state_label(state: TerminalState) -> String {
    let label = state.to_string().to_uppercase();
    match state {
        TerminalState::Finished => label.green().bold().to_string(),
        TerminalState::Scheduled => label.cyan().bold().to_string(),
        TerminalState::Depleted => label.yellow().bold().to_string(),
        TerminalState::Failed | TerminalState::Cancelled => label.red().bold().to_string(),
    }
}

/// One-line description of where a report left the chain.
fn describe_report(report: &CycleReport<u64>) -> String {
    let next = report
        .outcome
        .next_offset()
        .map_or_else(|| "-".to_string(), ToString::to_string);
    format!(
        "{} offset {} -> {} (budget {}, {:.1}s)",
        state_label(report.outcome.state()),
        report.state.begin_offset,
        next,
        report.state.cycle_allowed,
        report.elapsed.as_secs_f64()
    )
}

/// Summary printed after a local chain completes.
fn describe_chain(summary: &ChainSummary<u64>) -> String {
    let mut line = format!(
        "{} invocations, last: {}",
        summary.invocations,
        describe_report(&summary.last)
    );
    if summary.stalls > 0 {
        line.push_str(&format!(", {} stalled", summary.stalls));
    }
    line
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.json_logs);

    let config = RelayConfig::from_path(&cli.config)
        .with_context(|| format!("Failed to load config from '{}'", cli.config.display()))?;
    let event = parse_event(cli.event.as_deref())?;

    let runner = CountingRunner {
        target: cli.target,
        step: Duration::from_millis(cli.step_ms),
    };

    let mut options = config.handler_options::<u64>();
    if let Some(path) = cli.cancel_file.clone() {
        options = with_cancel_file(options, path);
    }

    match config.transport.kind {
        TransportKind::Local => {
            let queue = LocalQueue::new();
            let handler =
                ContinuationHandler::new(runner, options.transport(Arc::new(queue.clone())))?;
            let journal = Journal::new(&cli.log_dir).context("Failed to initialize journal")?;

            let summary = LocalChain::new(&handler, queue)
                .with_journal(&journal)
                .run(event)
                .await?;

            eprintln!("{}", describe_chain(&summary));
            eprintln!("Journal: {}", journal.path().display());
        }
        TransportKind::Lambda | TransportKind::Http => {
            let handler = ContinuationHandler::new(runner, options)?;
            let report = handler.handle(event).await?;
            eprintln!("{}", describe_report(&report));
        }
    }

    Ok(())
}
