//! JSONL (JSON Lines) journal of invocations
//!
//! Provides append-only logging of invocation outcomes to `<dir>/log.jsonl`.
//! The journal is a record for humans and tools; it is never read back to
//! resume a chain.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::io::Write as IoWrite;
use std::path::{Path, PathBuf};

use crate::cycle::handler::TerminalState;

/// One invocation as recorded in the journal
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvocationRecord {
    /// Position in the chain (1-indexed)
    pub invocation: u32,
    /// When the invocation ended
    pub timestamp: DateTime<Utc>,
    /// Offset the invocation started from
    pub begin_offset: Value,
    /// How the invocation ended
    pub state: TerminalState,
    /// Offset the chain stopped at or continues from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_offset: Option<Value>,
    /// Budget the invocation started with
    pub cycle_allowed: u32,
    /// Whether the runner returned its starting offset
    #[serde(default)]
    pub stalled: bool,
    /// Wall-clock duration in milliseconds
    pub duration_ms: u64,
    /// Error message for failed or cancelled invocations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Append-only JSONL journal
pub struct Journal {
    log_path: PathBuf,
}

impl Journal {
    /// Create a journal in `log_dir`, creating the directory if needed
    ///
    /// # Arguments
    /// * `log_dir` - Directory where log.jsonl will be stored (typically `.relay`)
    ///
    /// # Errors
    /// Returns an error if the log directory cannot be created
    pub fn new<P: AsRef<Path>>(log_dir: P) -> Result<Self> {
        let log_dir = log_dir.as_ref();

        // Create the log directory if it doesn't exist
        fs::create_dir_all(log_dir)
            .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;

        Ok(Self {
            log_path: log_dir.join("log.jsonl"),
        })
    }

    /// Append a record as one JSON line
    ///
    /// # Arguments
    /// * `record` - The invocation to record
    ///
    /// # Errors
    /// Returns an error if:
    /// - The log file cannot be opened or created
    /// - The record cannot be serialized to JSON
    /// - Writing to the file fails
    pub fn append(&self, record: &InvocationRecord) -> Result<()> {
        // Open file in append mode, create if it doesn't exist
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .with_context(|| format!("Failed to open log file: {}", self.log_path.display()))?;

        // Serialize to JSON
        let json =
            serde_json::to_string(record).context("Failed to serialize invocation record")?;

        // Write JSON line
        writeln!(file, "{json}").context("Failed to write to log file")?;

        Ok(())
    }

    /// Read every record, oldest first.
    ///
    /// A missing file reads as empty; blank lines are skipped.
    ///
    /// # Returns
    /// All recorded invocations, in the order they were appended
    ///
    /// # Errors
    /// Returns an error if:
    /// - The log file exists but cannot be read
    /// - Any non-blank line is not a valid record (the message names the line)
    pub fn read_all(&self) -> Result<Vec<InvocationRecord>> {
        // No journal yet means no history
        if !self.log_path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.log_path)
            .with_context(|| format!("Failed to read log file: {}", self.log_path.display()))?;

        content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(line_num, line)| {
                serde_json::from_str::<InvocationRecord>(line)
                    .with_context(|| format!("Failed to parse line {} as JSON", line_num + 1))
            })
            .collect()
    }

    /// Path of the journal file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.log_path
    }
}
