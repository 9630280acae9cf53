//! JSONL logger: append-only line-delimited JSON for agent-friendly log
//! consumption.
//!
//! Each line is a self-contained JSON object. Lines are assembled in memory
//! and written atomically via `write_all` to prevent interleaved partial
//! lines when the file is being tailed by another process.
//!
//! Three-level fallback chain:
//! 1. Primary file path
//! 2. stderr with `[DSW-JSONL]` prefix
//! 3. Silent discard (a cleanup run must never fail for logging reasons)

#![allow(missing_docs)]

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Severity level for log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

/// Log event types matching the dsw activity model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    RunStart,
    JobStart,
    JobSkip,
    JobComplete,
    PathDelete,
    Error,
}

/// A single JSONL log entry. All fields optional except `ts`, `event`,
/// `severity`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// ISO 8601 UTC timestamp.
    pub ts: String,
    /// Event type identifier.
    pub event: EventType,
    /// Severity level.
    pub severity: Severity,
    /// Affected filesystem path (when applicable).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Batch job label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Deletion method (unlinked, wiped, removed_tree, would_delete).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Number of targets in the job.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub targets: Option<usize>,
    /// Duration of the action in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    /// Whether the action succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ok: Option<bool>,
    /// DSW error code if the action failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    /// Free-form details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl LogEntry {
    #[must_use]
    pub fn new(event: EventType, severity: Severity) -> Self {
        Self {
            ts: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            event,
            severity,
            path: None,
            label: None,
            method: None,
            targets: None,
            duration_ms: None,
            ok: None,
            error_code: None,
            details: None,
        }
    }
}

/// Append-only JSONL writer with graceful degradation.
pub struct JsonlWriter {
    path: PathBuf,
    file: Option<File>,
}

impl JsonlWriter {
    /// Open (or create) the log file, creating parent directories as needed.
    /// Failure degrades to the stderr fallback rather than erroring.
    #[must_use]
    pub fn open(path: PathBuf) -> Self {
        let file = open_append(&path);
        if file.is_none() {
            eprintln!("[DSW-JSONL] cannot open {}, logging to stderr", path.display());
        }
        Self { path, file }
    }

    /// Serialize and append one entry.
    pub fn write_entry(&mut self, entry: &LogEntry) {
        let Ok(mut line) = serde_json::to_string(entry) else {
            return;
        };
        line.push('\n');

        if let Some(file) = &mut self.file {
            if file.write_all(line.as_bytes()).is_ok() {
                return;
            }
            // Write failed mid-run; fall through to stderr from now on.
            eprintln!("[DSW-JSONL] write failed for {}, degrading", self.path.display());
            self.file = None;
        }
        eprint!("[DSW-JSONL] {line}");
    }

    pub fn flush(&mut self) {
        if let Some(file) = &mut self.file {
            let _ = file.flush();
        }
    }

    pub fn fsync(&mut self) {
        if let Some(file) = &mut self.file {
            let _ = file.sync_all();
        }
    }
}

fn open_append(path: &PathBuf) -> Option<File> {
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    OpenOptions::new().create(true).append(true).open(path).ok()
}
