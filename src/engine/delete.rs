//! Destructive operations: drive-aware removal of a single path.
//!
//! Strategy selection per target:
//! - missing path -> no-op success (idempotent; the build/run TOCTOU window
//!   is an accepted, documented risk)
//! - regular file on a rotational device -> zero-fill overwrite, then unlink
//! - regular file elsewhere -> plain unlink (overwrite on flash is wasted
//!   wear; block remapping defeats it anyway)
//! - symlink -> unlink the link itself, never the target
//! - directory -> plain recursive removal; callers needing secure erasure of
//!   directory contents must enumerate files individually

#![allow(missing_docs)]

use std::fs::{self, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use crate::core::config::WipeConfig;
use crate::core::errors::{Result, SweepError};
use crate::device::classifier::DeviceClassifier;
use crate::logger::activity::{ActivityEvent, ActivityLoggerHandle};

/// What a delete call actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteAction {
    /// Path did not exist; nothing to do.
    Missing,
    /// Plain unlink (non-rotational device, or a symlink).
    Unlinked,
    /// Zero-fill overwrite followed by unlink (rotational device).
    Wiped,
    /// Recursive directory removal.
    RemovedTree,
    /// Dry-run: reported without touching the filesystem.
    WouldDelete,
}

impl DeleteAction {
    /// Short label for log entries.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::Unlinked => "unlinked",
            Self::Wiped => "wiped",
            Self::RemovedTree => "removed_tree",
            Self::WouldDelete => "would_delete",
        }
    }
}

/// Seam between the batch runner and the concrete deleter, so batch ordering
/// and fail-fast semantics can be tested with injected failures.
pub trait DeleteOp: Send + Sync {
    fn delete(&self, path: &Path) -> Result<DeleteAction>;
}

/// The real destructive operation, parameterized by a device classifier.
pub struct Deleter {
    classifier: Arc<dyn DeviceClassifier>,
    wipe: WipeConfig,
    dry_run: bool,
    logger: Option<ActivityLoggerHandle>,
}

impl Deleter {
    #[must_use]
    pub fn new(
        classifier: Arc<dyn DeviceClassifier>,
        wipe: WipeConfig,
        dry_run: bool,
        logger: Option<ActivityLoggerHandle>,
    ) -> Self {
        Self {
            classifier,
            wipe,
            dry_run,
            logger,
        }
    }

    fn log(&self, event: ActivityEvent) {
        if let Some(logger) = &self.logger {
            logger.send(event);
        }
    }

    /// Overwrite the file's full length with zeros, `passes` times.
    ///
    /// The data is flushed and fsynced per pass so the zeros actually reach
    /// the platters before the directory entry disappears.
    fn zero_fill(&self, path: &Path) -> std::io::Result<()> {
        let mut file = OpenOptions::new().write(true).open(path)?;
        let len = file.metadata()?.len();
        if len == 0 {
            return Ok(());
        }

        let buffer = vec![0u8; self.wipe.buffer_size_bytes];
        for _ in 0..self.wipe.passes {
            file.seek(SeekFrom::Start(0))?;
            let mut remaining = len;
            while remaining > 0 {
                #[allow(clippy::cast_possible_truncation)]
                let chunk = remaining.min(buffer.len() as u64) as usize;
                file.write_all(&buffer[..chunk])?;
                remaining -= chunk as u64;
            }
            file.flush()?;
            if self.wipe.sync_after_pass {
                file.sync_all()?;
            }
        }
        Ok(())
    }

    fn delete_file(&self, path: &Path) -> Result<DeleteAction> {
        if self.classifier.is_rotational(path) {
            self.zero_fill(path)
                .and_then(|()| fs::remove_file(path))
                .map_err(|e| SweepError::SecureWipeFailed {
                    path: path.to_path_buf(),
                    details: e.to_string(),
                })?;
            Ok(DeleteAction::Wiped)
        } else {
            fs::remove_file(path).map_err(|source| SweepError::UnlinkFailed {
                path: path.to_path_buf(),
                source,
            })?;
            Ok(DeleteAction::Unlinked)
        }
    }
}

impl DeleteOp for Deleter {
    fn delete(&self, path: &Path) -> Result<DeleteAction> {
        // symlink_metadata: a dangling symlink still needs unlinking, and a
        // live one must never be wiped through.
        let Ok(meta) = fs::symlink_metadata(path) else {
            return Ok(DeleteAction::Missing);
        };

        if self.dry_run {
            return Ok(DeleteAction::WouldDelete);
        }

        let started = Instant::now();
        let outcome = if meta.is_dir() {
            fs::remove_dir_all(path)
                .map_err(|source| SweepError::RecursiveRemoveFailed {
                    path: path.to_path_buf(),
                    source,
                })
                .map(|()| DeleteAction::RemovedTree)
        } else if meta.file_type().is_symlink() {
            fs::remove_file(path)
                .map_err(|source| SweepError::UnlinkFailed {
                    path: path.to_path_buf(),
                    source,
                })
                .map(|()| DeleteAction::Unlinked)
        } else {
            self.delete_file(path)
        };

        #[allow(clippy::cast_possible_truncation)]
        let duration_ms = started.elapsed().as_millis() as u64;
        match &outcome {
            Ok(action) => self.log(ActivityEvent::PathDeleted {
                path: path.to_string_lossy().to_string(),
                method: action.label().to_string(),
                duration_ms,
            }),
            Err(e) => self.log(ActivityEvent::PathDeleteFailed {
                path: path.to_string_lossy().to_string(),
                error_code: e.code().to_string(),
                error_message: e.to_string(),
            }),
        }

        outcome
    }
}
