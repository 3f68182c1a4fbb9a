//! Logging and observability
//!
//! Tracing subscriber setup for the binary, and the JSONL journal the local
//! chain driver writes invocation history to.

pub mod journal;

pub use journal::{InvocationRecord, Journal};

use std::str::FromStr;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global tracing subscriber.
///
/// `level` is either a bare level (`info`, `debug`, ...) or a full
/// `EnvFilter` directive string. A bare level keeps HTTP client internals at
/// `info`. Invalid directives fall back to `info`.
pub fn init_tracing(level: &str, json: bool) {
    let filter_spec = filter_directives(level);
    let filter = EnvFilter::from_str(&filter_spec).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(fmt::layer().json().with_target(false).with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).compact().with_writer(std::io::stderr))
            .init();
    }

    tracing::debug!(filter = %filter_spec, json, "Logging initialized");
}

fn filter_directives(level: &str) -> String {
    let level = level.trim();
    if level.contains(',') || level.contains('=') {
        level.to_string()
    } else {
        format!("{level},hyper=info,hyper_util=info,reqwest=info,h2=info")
    }
}
