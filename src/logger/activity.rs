//! Activity logging coordinator.
//!
//! Architecture: a dedicated logger thread owns the `JsonlWriter`. All other
//! threads send `ActivityEvent` via a bounded crossbeam channel. Non-blocking
//! `try_send()` ensures deletion workers are never blocked by logging
//! back-pressure.

#![allow(missing_docs)]

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};

use crate::core::errors::{Result, SweepError};
use crate::logger::jsonl::{EventType, JsonlWriter, LogEntry, Severity};

/// Events flowing through the activity logger.
#[derive(Debug, Clone)]
pub enum ActivityEvent {
    RunStarted {
        categories: Vec<String>,
        dry_run: bool,
    },
    JobStarted {
        label: String,
        targets: usize,
    },
    JobSkipped {
        label: String,
    },
    JobCompleted {
        label: String,
        ok: bool,
        duration_ms: u64,
    },
    PathDeleted {
        path: String,
        method: String,
        duration_ms: u64,
    },
    PathDeleteFailed {
        path: String,
        error_code: String,
        error_message: String,
    },
    /// Sentinel to request graceful shutdown of the logger thread.
    Shutdown,
}

/// Thread-safe, cheaply-cloneable handle for sending log events.
///
/// Internally wraps a bounded crossbeam `Sender`. The `send()` method uses
/// `try_send()` so callers are never blocked by logging back-pressure.
#[derive(Clone)]
pub struct ActivityLoggerHandle {
    tx: Sender<ActivityEvent>,
    dropped_events: Arc<AtomicU64>,
}

impl ActivityLoggerHandle {
    /// Send an event to the logger thread. Non-blocking.
    ///
    /// If the channel is full the event is dropped and the dropped-events
    /// counter is incremented.
    pub fn send(&self, event: ActivityEvent) {
        if let Err(TrySendError::Full(_)) = self.tx.try_send(event) {
            self.dropped_events.fetch_add(1, Ordering::Relaxed);
        }
        // Disconnected is fine during shutdown.
    }

    /// Number of events dropped due to channel back-pressure.
    pub fn dropped_events(&self) -> u64 {
        self.dropped_events.load(Ordering::Relaxed)
    }

    /// Request graceful shutdown of the logger thread.
    pub fn shutdown(&self) {
        let _ = self.tx.send(ActivityEvent::Shutdown);
    }
}

/// Spawn the logger thread and return a handle.
///
/// The returned handle is `Clone + Send` and can be shared across threads.
/// The logger thread runs until `handle.shutdown()` is called or all senders
/// are dropped.
pub fn spawn_logger(
    jsonl_path: PathBuf,
    channel_capacity: usize,
) -> Result<(ActivityLoggerHandle, thread::JoinHandle<()>)> {
    let (tx, rx) = bounded::<ActivityEvent>(channel_capacity);
    let dropped = Arc::new(AtomicU64::new(0));
    let dropped_clone = Arc::clone(&dropped);

    let handle = ActivityLoggerHandle {
        tx,
        dropped_events: dropped,
    };

    let join = thread::Builder::new()
        .name("dsw-logger".to_string())
        .spawn(move || {
            logger_thread_main(rx, jsonl_path, dropped_clone);
        })
        .map_err(|e| SweepError::Runtime {
            details: format!("failed to spawn logger thread: {e}"),
        })?;

    Ok((handle, join))
}

#[allow(clippy::needless_pass_by_value)]
fn logger_thread_main(rx: Receiver<ActivityEvent>, jsonl_path: PathBuf, dropped: Arc<AtomicU64>) {
    let mut jsonl = JsonlWriter::open(jsonl_path);

    while let Ok(event) = rx.recv() {
        // Report dropped events periodically.
        let d = dropped.swap(0, Ordering::Relaxed);
        if d > 0 {
            let mut warn = LogEntry::new(EventType::Error, Severity::Warning);
            warn.details = Some(format!("{d} log events dropped due to back-pressure"));
            jsonl.write_entry(&warn);
        }

        if matches!(event, ActivityEvent::Shutdown) {
            jsonl.flush();
            jsonl.fsync();
            break;
        }

        jsonl.write_entry(&event_to_log_entry(&event));
    }
}

fn event_to_log_entry(event: &ActivityEvent) -> LogEntry {
    match event {
        ActivityEvent::RunStarted {
            categories,
            dry_run,
        } => {
            let mut entry = LogEntry::new(EventType::RunStart, Severity::Info);
            entry.details = Some(format!(
                "categories=[{}] dry_run={dry_run}",
                categories.join(",")
            ));
            entry
        }
        ActivityEvent::JobStarted { label, targets } => {
            let mut entry = LogEntry::new(EventType::JobStart, Severity::Info);
            entry.label = Some(label.clone());
            entry.targets = Some(*targets);
            entry
        }
        ActivityEvent::JobSkipped { label } => {
            let mut entry = LogEntry::new(EventType::JobSkip, Severity::Info);
            entry.label = Some(label.clone());
            entry
        }
        ActivityEvent::JobCompleted {
            label,
            ok,
            duration_ms,
        } => {
            let mut entry = LogEntry::new(
                EventType::JobComplete,
                if *ok { Severity::Info } else { Severity::Warning },
            );
            entry.label = Some(label.clone());
            entry.ok = Some(*ok);
            entry.duration_ms = Some(*duration_ms);
            entry
        }
        ActivityEvent::PathDeleted {
            path,
            method,
            duration_ms,
        } => {
            let mut entry = LogEntry::new(EventType::PathDelete, Severity::Info);
            entry.path = Some(path.clone());
            entry.method = Some(method.clone());
            entry.duration_ms = Some(*duration_ms);
            entry.ok = Some(true);
            entry
        }
        ActivityEvent::PathDeleteFailed {
            path,
            error_code,
            error_message,
        } => {
            let mut entry = LogEntry::new(EventType::PathDelete, Severity::Warning);
            entry.path = Some(path.clone());
            entry.ok = Some(false);
            entry.error_code = Some(error_code.clone());
            entry.details = Some(error_message.clone());
            entry
        }
        ActivityEvent::Shutdown => LogEntry::new(EventType::Error, Severity::Info),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn logger_writes_events_and_shuts_down() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("activity.jsonl");
        let (handle, join) = spawn_logger(path.clone(), 64).expect("spawn logger");

        handle.send(ActivityEvent::RunStarted {
            categories: vec!["trash".to_string()],
            dry_run: false,
        });
        handle.send(ActivityEvent::PathDeleted {
            path: "/tmp/x".to_string(),
            method: "unlinked".to_string(),
            duration_ms: 3,
        });
        handle.shutdown();
        join.join().expect("logger thread joins");

        let raw = fs::read_to_string(&path).unwrap();
        assert_eq!(raw.lines().count(), 2);
        assert!(raw.contains("run_start"));
        assert!(raw.contains("\"method\":\"unlinked\""));
    }

    #[test]
    fn full_channel_drops_instead_of_blocking() {
        // Capacity 1 and no consumer: the second send must drop, not block.
        let (tx, _rx) = bounded::<ActivityEvent>(1);
        let handle = ActivityLoggerHandle {
            tx,
            dropped_events: Arc::new(AtomicU64::new(0)),
        };

        handle.send(ActivityEvent::JobSkipped {
            label: "a".to_string(),
        });
        handle.send(ActivityEvent::JobSkipped {
            label: "b".to_string(),
        });
        assert_eq!(handle.dropped_events(), 1);
    }

    #[test]
    fn failure_event_carries_code_and_severity() {
        let entry = event_to_log_entry(&ActivityEvent::PathDeleteFailed {
            path: "/tmp/locked".to_string(),
            error_code: "DSW-3001".to_string(),
            error_message: "permission denied".to_string(),
        });
        assert_eq!(entry.severity, Severity::Warning);
        assert_eq!(entry.error_code.as_deref(), Some("DSW-3001"));
        assert_eq!(entry.ok, Some(false));
    }
}
