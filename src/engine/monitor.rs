//! Progress monitor: runs a batch job on a background thread and renders a
//! live elapsed-time line while polling for completion.
//!
//! One foreground control thread drives jobs strictly one-at-a-time; each
//! job's deletion work runs on a single background worker whose result comes
//! back over a bounded channel. The foreground thread sleeps between polls
//! and redraws a spinner plus elapsed readout in place.
//!
//! The terminal cursor is process-global state: [`CursorGuard`] hides it for
//! the duration of the poll loop and guarantees restoration on every exit
//! path. A panic hook covers unwinds and a signal-hook flag covers
//! SIGINT/SIGTERM, which the poll loop checks each iteration.

#![allow(missing_docs)]

use std::io::{self, Write};
use std::panic;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, TryRecvError, bounded};
use crossterm::{cursor, execute};
use signal_hook::consts::{SIGINT, SIGTERM};

use crate::core::config::MonitorConfig;
use crate::engine::batch::{BatchJob, ExecutionResult, JobStatus};
use crate::engine::delete::DeleteOp;
use crate::logger::activity::{ActivityEvent, ActivityLoggerHandle};

/// Global flag indicating the cursor is currently hidden. Checked by the
/// panic hook to decide whether restoration is needed.
static CURSOR_HIDDEN: AtomicBool = AtomicBool::new(false);

const SPINNER_FRAMES: [char; 4] = ['|', '/', '-', '\\'];

// ──────────────────── cursor guard ────────────────────

/// RAII guard for terminal cursor visibility.
///
/// On creation: hides the cursor and installs a panic hook that restores it
/// before the default panic message prints. On drop: shows the cursor and
/// removes the hook. Restoration is idempotent via the atomic flag.
pub struct CursorGuard {
    hook_installed: bool,
}

impl CursorGuard {
    pub fn new() -> Self {
        let _ = execute!(io::stdout(), cursor::Hide);
        CURSOR_HIDDEN.store(true, Ordering::SeqCst);

        let prev = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            restore_cursor_best_effort();
            prev(info);
        }));

        Self {
            hook_installed: true,
        }
    }

    /// Whether the guard currently has the cursor hidden.
    pub fn cursor_hidden() -> bool {
        CURSOR_HIDDEN.load(Ordering::SeqCst)
    }
}

impl Default for CursorGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for CursorGuard {
    fn drop(&mut self) {
        restore_cursor_best_effort();
        if self.hook_installed {
            // The previous hook was moved into the closure; reset to default.
            // Safe because the guard's lifetime brackets all monitored work.
            let _ = panic::take_hook();
        }
    }
}

/// Best-effort cursor restoration. Safe to call multiple times.
fn restore_cursor_best_effort() {
    if CURSOR_HIDDEN.swap(false, Ordering::SeqCst) {
        let mut stdout = io::stdout();
        let _ = execute!(stdout, cursor::Show);
        let _ = stdout.flush();
    }
}

// ──────────────────── background job handle ────────────────────

/// Completion handle for a job running on a background thread.
///
/// Replaces polling a child process for liveness: a bounded channel carries
/// the final [`ExecutionResult`], and a disconnected channel (worker panic)
/// is synthesized into a failure rather than propagated.
pub struct JobHandle {
    label: String,
    rx: Receiver<ExecutionResult>,
    started: Instant,
}

impl JobHandle {
    /// Non-blocking completion check.
    pub fn try_result(&self) -> Option<ExecutionResult> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(ExecutionResult {
                label: self.label.clone(),
                status: JobStatus::Failed {
                    code: "DSW-3900".to_string(),
                    message: "background worker terminated abnormally".to_string(),
                },
                duration: self.started.elapsed(),
                attempted: 0,
            }),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Run the job's deletion work on a named background thread.
pub fn spawn_job(
    job: BatchJob,
    op: Arc<dyn DeleteOp>,
    logger: Option<ActivityLoggerHandle>,
) -> JobHandle {
    let label = job.label().to_string();
    let (tx, rx) = bounded::<ExecutionResult>(1);
    let started = Instant::now();

    let spawned = thread::Builder::new()
        .name("dsw-job".to_string())
        .spawn(move || {
            let result = job.run(op.as_ref(), logger.as_ref());
            // Receiver gone means the monitor already bailed; nothing to do.
            let _ = tx.send(result);
        });
    if let Err(e) = spawned {
        eprintln!("[dsw] failed to spawn worker thread: {e}");
    }

    JobHandle { label, rx, started }
}

// ──────────────────── elapsed formatting ────────────────────

/// Render a duration as minutes, seconds, and milliseconds: `1m03s214ms`.
#[must_use]
pub fn format_elapsed(elapsed: Duration) -> String {
    let total_ms = elapsed.as_millis();
    let minutes = total_ms / 60_000;
    let seconds = (total_ms % 60_000) / 1_000;
    let millis = total_ms % 1_000;
    format!("{minutes}m{seconds:02}s{millis:03}ms")
}

// ──────────────────── monitor ────────────────────

/// Drives one job at a time with live progress rendering.
pub struct ProgressMonitor {
    poll_interval: Duration,
    interrupted: Arc<AtomicBool>,
}

impl ProgressMonitor {
    /// Build a monitor and register SIGINT/SIGTERM flags.
    ///
    /// Registration is best-effort; on failure the run simply loses
    /// restore-on-signal coverage (the Drop path still holds).
    #[must_use]
    pub fn new(config: &MonitorConfig) -> Self {
        let interrupted = Arc::new(AtomicBool::new(false));
        for signal in [SIGINT, SIGTERM] {
            if let Err(e) = signal_hook::flag::register(signal, Arc::clone(&interrupted)) {
                eprintln!("[dsw] failed to register signal {signal}: {e}");
            }
        }
        Self {
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            interrupted,
        }
    }

    /// Test constructor: no signal registration, injectable interrupt flag.
    #[must_use]
    pub fn with_interrupt_flag(config: &MonitorConfig, interrupted: Arc<AtomicBool>) -> Self {
        Self {
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            interrupted,
        }
    }

    /// Execute one job with live rendering and return its result.
    ///
    /// A not-found job prints a skip line and returns immediately. A failed
    /// job gets one informational diagnostic line; failure is never escalated
    /// to the process level. The deletion work itself is not cancellable and
    /// runs to completion.
    pub fn execute(
        &self,
        job: BatchJob,
        op: Arc<dyn DeleteOp>,
        logger: Option<&ActivityLoggerHandle>,
    ) -> ExecutionResult {
        let label = job.label().to_string();

        if !job.is_found() {
            println!("{label}: not found, skipping");
            if let Some(logger) = logger {
                logger.send(ActivityEvent::JobSkipped {
                    label: label.clone(),
                });
            }
            return job.run(op.as_ref(), None);
        }

        if let Some(logger) = logger {
            logger.send(ActivityEvent::JobStarted {
                label: label.clone(),
                targets: job.targets().len(),
            });
        }

        let handle = spawn_job(job, op, logger.cloned());
        let guard = CursorGuard::new();

        let mut frame = 0usize;
        let result = loop {
            if let Some(result) = handle.try_result() {
                break result;
            }
            if self.interrupted.load(Ordering::Relaxed) {
                // Cursor back first, then bail with the conventional code.
                // The worker keeps running until the process actually exits.
                drop(guard);
                println!();
                eprintln!("dsw: interrupted");
                std::process::exit(130);
            }

            let spinner = SPINNER_FRAMES[frame % SPINNER_FRAMES.len()];
            frame += 1;
            print!(
                "\r{label}... {spinner} {elapsed}",
                elapsed = format_elapsed(handle.elapsed())
            );
            let _ = io::stdout().flush();
            thread::sleep(self.poll_interval);
        };

        drop(guard);

        // Replace the live line with the terminal report.
        print!("\r");
        let _ = execute!(
            io::stdout(),
            crossterm::terminal::Clear(crossterm::terminal::ClearType::CurrentLine)
        );
        println!(
            "{label}... Done in {elapsed}",
            elapsed = format_elapsed(result.duration)
        );
        if let JobStatus::Failed { code, message } = &result.status {
            println!("  Failed with {code} ({message}); may be normal for some cleanup tasks");
        }

        result
    }
}
