//! Mount table access: `/proc/self/mounts` parsing and path-to-mount lookup.
//!
//! The classifier needs exactly one fact from the operating environment: the
//! block device backing the mount that contains a path. Topology is re-read
//! when the TTL lapses rather than cached for the process lifetime, because
//! removable media may come and go between invocations.

#![allow(missing_docs)]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use parking_lot::RwLock;

use crate::core::errors::{Result, SweepError};

/// Mount-point metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountPoint {
    pub path: PathBuf,
    pub device: String,
    pub fs_type: String,
}

/// Source of mount-point records.
pub trait MountTable: Send + Sync {
    fn mounts(&self) -> Result<Vec<MountPoint>>;
}

/// Linux mount table backed by `/proc/self/mounts`, with a short TTL cache.
#[derive(Debug)]
pub struct ProcMountTable {
    cache: RwLock<Option<(Vec<MountPoint>, Instant)>>,
    cache_ttl: Duration,
}

impl ProcMountTable {
    #[must_use]
    pub fn new(cache_ttl: Duration) -> Self {
        Self {
            cache: RwLock::new(None),
            cache_ttl,
        }
    }
}

impl Default for ProcMountTable {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

impl MountTable for ProcMountTable {
    fn mounts(&self) -> Result<Vec<MountPoint>> {
        {
            let cache = self.cache.read();
            if let Some((mounts, collected_at)) = &*cache
                && collected_at.elapsed() < self.cache_ttl
            {
                return Ok(mounts.clone());
            }
        }

        let raw = fs::read_to_string("/proc/self/mounts").map_err(|source| SweepError::Io {
            path: PathBuf::from("/proc/self/mounts"),
            source,
        })?;
        let mounts = parse_proc_mounts(&raw);

        *self.cache.write() = Some((mounts.clone(), Instant::now()));
        Ok(mounts)
    }
}

/// Fixed mount table for deterministic tests.
#[derive(Debug, Clone, Default)]
pub struct StaticMountTable {
    mounts: Vec<MountPoint>,
}

impl StaticMountTable {
    #[must_use]
    pub fn new(mounts: Vec<MountPoint>) -> Self {
        Self { mounts }
    }
}

impl MountTable for StaticMountTable {
    fn mounts(&self) -> Result<Vec<MountPoint>> {
        Ok(self.mounts.clone())
    }
}

/// Pick the mount containing `path`: longest matching mount-point prefix wins.
pub fn find_mount<'a>(path: &Path, mounts: &'a [MountPoint]) -> Option<&'a MountPoint> {
    mounts
        .iter()
        .filter(|mount| path.starts_with(&mount.path))
        .max_by_key(|mount| mount.path.as_os_str().len())
}

fn parse_proc_mounts(raw: &str) -> Vec<MountPoint> {
    let mut mounts = Vec::new();
    for line in raw.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 3 {
            // Skip malformed lines (pseudo-filesystems or kernel artifacts)
            // rather than failing the entire mount parse.
            eprintln!("[dsw] warning: skipping malformed /proc/self/mounts line: {line}");
            continue;
        }
        mounts.push(MountPoint {
            path: unescape_mount_path(fields[1]),
            device: fields[0].to_string(),
            fs_type: fields[2].to_string(),
        });
    }
    mounts
}

/// Decode octal escape sequences (`\NNN`) used by the Linux kernel.
/// Returns a PathBuf via OsString to preserve raw bytes (e.g. invalid UTF-8).
fn unescape_mount_path(raw: &str) -> PathBuf {
    let mut bytes = Vec::with_capacity(raw.len());
    let raw_bytes = raw.as_bytes();
    let mut i = 0;
    while i < raw_bytes.len() {
        if raw_bytes[i] == b'\\' && i + 3 < raw_bytes.len() {
            let a = raw_bytes[i + 1];
            let b = raw_bytes[i + 2];
            let c = raw_bytes[i + 3];
            if (b'0'..=b'7').contains(&a)
                && (b'0'..=b'7').contains(&b)
                && (b'0'..=b'7').contains(&c)
            {
                let val = (a - b'0') * 64 + (b - b'0') * 8 + (c - b'0');
                bytes.push(val);
                i += 4;
                continue;
            }
        }
        bytes.push(raw_bytes[i]);
        i += 1;
    }

    #[cfg(unix)]
    {
        use std::os::unix::ffi::OsStringExt;
        PathBuf::from(std::ffi::OsString::from_vec(bytes))
    }
    #[cfg(not(unix))]
    {
        PathBuf::from(String::from_utf8_lossy(&bytes).into_owned())
    }
}
