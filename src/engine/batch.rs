//! Batch jobs: a labeled, ordered set of deletion targets run as one unit.
//!
//! Build phase filters candidates to those that exist right now; a job with
//! zero survivors is "not found" and short-circuits to a skip report without
//! touching the monitor machinery. Run phase is fail-fast-but-isolated:
//! the first failing target stops the remainder of this job, but never any
//! other job and never the overall run.

#![allow(missing_docs)]

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::engine::delete::DeleteOp;
use crate::logger::activity::{ActivityEvent, ActivityLoggerHandle};

/// External input contract: a label plus a static candidate list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSpec {
    pub label: String,
    pub candidates: Vec<PathBuf>,
}

impl BatchSpec {
    #[must_use]
    pub fn new(label: impl Into<String>, candidates: Vec<PathBuf>) -> Self {
        Self {
            label: label.into(),
            candidates,
        }
    }
}

/// Terminal status of one batch job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    /// No candidate existed at build time; nothing was attempted.
    NotFound,
    /// Every attempted deletion succeeded.
    Success,
    /// A deletion failed; remaining targets in this job were skipped.
    Failed { code: String, message: String },
}

impl JobStatus {
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Per-job outcome, rendered once and then discarded.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub label: String,
    pub status: JobStatus,
    pub duration: Duration,
    /// Number of targets on which a delete was actually invoked.
    pub attempted: usize,
}

/// A built batch job ready to run.
#[derive(Debug, Clone)]
pub struct BatchJob {
    label: String,
    targets: Vec<PathBuf>,
}

impl BatchJob {
    /// Filter the spec's candidates down to paths that exist at build time.
    ///
    /// Existence may go stale by execution time; the deleter treats a
    /// vanished path as a no-op, so the window is harmless.
    #[must_use]
    pub fn build(spec: BatchSpec) -> Self {
        let targets = spec
            .candidates
            .into_iter()
            .filter(|path| fs::symlink_metadata(path).is_ok())
            .collect();
        Self {
            label: spec.label,
            targets,
        }
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Paths that survived the build-time existence filter, in input order.
    #[must_use]
    pub fn targets(&self) -> &[PathBuf] {
        &self.targets
    }

    /// A job is eligible to run only if at least one candidate existed.
    #[must_use]
    pub fn is_found(&self) -> bool {
        !self.targets.is_empty()
    }

    /// Execute deletions over the surviving targets in input order.
    pub fn run(&self, op: &dyn DeleteOp, logger: Option<&ActivityLoggerHandle>) -> ExecutionResult {
        let started = Instant::now();

        if !self.is_found() {
            return ExecutionResult {
                label: self.label.clone(),
                status: JobStatus::NotFound,
                duration: started.elapsed(),
                attempted: 0,
            };
        }

        let mut attempted = 0;
        let mut status = JobStatus::Success;
        for target in &self.targets {
            attempted += 1;
            if let Err(e) = op.delete(target) {
                status = JobStatus::Failed {
                    code: e.code().to_string(),
                    message: e.to_string(),
                };
                break;
            }
        }

        let duration = started.elapsed();
        if let Some(logger) = logger {
            #[allow(clippy::cast_possible_truncation)]
            logger.send(ActivityEvent::JobCompleted {
                label: self.label.clone(),
                ok: !status.is_failure(),
                duration_ms: duration.as_millis() as u64,
            });
        }

        ExecutionResult {
            label: self.label.clone(),
            status,
            duration,
            attempted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::{Result, SweepError};
    use crate::engine::delete::DeleteAction;
    use parking_lot::Mutex;
    use std::path::Path;

    /// Records every delete call; fails on paths whose name contains "boom".
    #[derive(Default)]
    struct RecordingOp {
        calls: Mutex<Vec<PathBuf>>,
    }

    impl DeleteOp for RecordingOp {
        fn delete(&self, path: &Path) -> Result<DeleteAction> {
            self.calls.lock().push(path.to_path_buf());
            if path.to_string_lossy().contains("boom") {
                return Err(SweepError::UnlinkFailed {
                    path: path.to_path_buf(),
                    source: std::io::Error::other("injected"),
                });
            }
            Ok(DeleteAction::Unlinked)
        }
    }

    #[test]
    fn build_filters_missing_candidates() {
        let dir = tempfile::tempdir().unwrap();
        let exists = dir.path().join("a");
        fs::write(&exists, "x").unwrap();
        let missing = dir.path().join("b");

        let job = BatchJob::build(BatchSpec::new("test", vec![exists.clone(), missing]));
        assert!(job.is_found());
        assert_eq!(job.targets(), &[exists]);
    }

    #[test]
    fn empty_job_is_not_found_and_runs_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let job = BatchJob::build(BatchSpec::new(
            "ghost",
            vec![dir.path().join("x"), dir.path().join("y")],
        ));
        assert!(!job.is_found());

        let op = RecordingOp::default();
        let result = job.run(&op, None);
        assert_eq!(result.status, JobStatus::NotFound);
        assert_eq!(result.attempted, 0);
        assert!(op.calls.lock().is_empty());
    }

    #[test]
    fn targets_run_in_input_order() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        let c = dir.path().join("c");
        for p in [&a, &b, &c] {
            fs::write(p, "x").unwrap();
        }

        let op = RecordingOp::default();
        let job = BatchJob::build(BatchSpec::new("ordered", vec![b.clone(), a.clone(), c.clone()]));
        let result = job.run(&op, None);

        assert_eq!(result.status, JobStatus::Success);
        assert_eq!(result.attempted, 3);
        assert_eq!(&*op.calls.lock(), &[b, a, c]);
    }

    #[test]
    fn failure_skips_remaining_targets() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first");
        let boom = dir.path().join("boom");
        let never = dir.path().join("never");
        for p in [&first, &boom, &never] {
            fs::write(p, "x").unwrap();
        }

        let op = RecordingOp::default();
        let job = BatchJob::build(BatchSpec::new(
            "failing",
            vec![first.clone(), boom.clone(), never],
        ));
        let result = job.run(&op, None);

        assert!(result.status.is_failure());
        assert_eq!(result.attempted, 2);
        assert_eq!(&*op.calls.lock(), &[first, boom]);
        if let JobStatus::Failed { code, .. } = &result.status {
            assert_eq!(code, "DSW-3001");
        }
    }

    #[test]
    fn job_is_found_when_any_candidate_exists() {
        // ["/tmp/a" exists, "/tmp/b" missing] -> job found, the existing
        // file is deleted, the missing one never attempted.
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a");
        fs::write(&a, "x").unwrap();
        let b = dir.path().join("b");

        let op = RecordingOp::default();
        let job = BatchJob::build(BatchSpec::new("partial", vec![a.clone(), b]));
        assert!(job.is_found());

        let result = job.run(&op, None);
        assert_eq!(result.status, JobStatus::Success);
        assert_eq!(result.attempted, 1);
        assert_eq!(&*op.calls.lock(), &[a]);
    }

    #[test]
    fn broken_symlink_counts_as_existing() {
        #[cfg(unix)]
        {
            let dir = tempfile::tempdir().unwrap();
            let link = dir.path().join("dangling");
            std::os::unix::fs::symlink(dir.path().join("gone"), &link).unwrap();

            let job = BatchJob::build(BatchSpec::new("links", vec![link]));
            assert!(job.is_found());
        }
    }
}
