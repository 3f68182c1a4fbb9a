//! cycle-relay - resumable work for time-boxed functions
//!
//! Wraps a unit of work that cannot finish within one invocation of a
//! time-limited function. The runner processes from an offset until it runs
//! out of time, and the handler re-invokes the same function asynchronously
//! with the next offset and a decremented budget until the work is done.

// Allow multiple crate versions from dependencies (can't easily control)
#![allow(clippy::multiple_crate_versions)]

pub mod cycle;
pub mod error;
pub mod local;
pub mod log;
pub mod transport;

#[cfg(test)]
mod testutil;

// Re-export commonly used types
pub use cycle::config::RelayConfig;
pub use cycle::context::CycleContext;
pub use cycle::event::{CycleEvent, CycleState, NextInvocation, Offset};
pub use cycle::handler::{
    runner_fn, ContinuationHandler, CycleReport, CycleRunner, HandlerOptions, Outcome, Step,
    TerminalState,
};
pub use error::CancellationRequested;
pub use local::{ChainSummary, LocalChain};
pub use log::{InvocationRecord, Journal};
pub use transport::{
    HttpInvoker, InvocationTransport, LambdaInvoker, LocalQueue, TransportError,
};
