//! Rotational classification: path -> backing device -> verdict.
//!
//! Policy: a device is rotational only when its base name (partition suffix
//! stripped) fully matches one of the configured allow-list patterns. The
//! default list covers legacy ATA-style names (`sdX`, `hdX`). NVMe, loop,
//! mapper, and unresolvable devices all classify as non-rotational, which
//! fails safe toward the plain-unlink path: shredding is the exceptional
//! behavior, never the default.

use std::path::Path;
use std::sync::Arc;

use regex::Regex;

use crate::core::errors::{Result, SweepError};
use crate::device::mounts::{MountTable, find_mount};

/// Answers "does this path live on a rotational device?".
///
/// Implementations never error: any failure in device resolution degrades to
/// a non-rotational verdict.
pub trait DeviceClassifier: Send + Sync {
    /// Classify the device backing the mount that contains `path`.
    fn is_rotational(&self, path: &Path) -> bool;
}

/// Compiled allow-list of rotational base device names.
#[derive(Debug, Clone)]
pub struct RotationalPolicy {
    patterns: Vec<Regex>,
}

impl RotationalPolicy {
    /// Compile the configured pattern list.
    pub fn from_patterns(patterns: &[String]) -> Result<Self> {
        let compiled = patterns
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| SweepError::InvalidConfig {
                    details: format!("bad rotational pattern {p:?}: {e}"),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns: compiled })
    }

    /// Exact-match verdict for an already-stripped base device name.
    #[must_use]
    pub fn is_rotational_base(&self, base: &str) -> bool {
        !base.is_empty() && self.patterns.iter().any(|re| re.is_match(base))
    }
}

/// Strip the `/dev/` prefix and any partition suffix from a device
/// identifier, yielding the name of the physical device.
///
/// Handles both naming families:
/// - `sda1` -> `sda` (trailing digits are the partition number)
/// - `nvme0n1p3` -> `nvme0n1` (partition is the `p<digits>` tail; the
///   namespace digits stay, so whole-disk `nvme0n1` passes through intact)
#[must_use]
pub fn base_device_name(device: &str) -> String {
    let name = device.strip_prefix("/dev/").unwrap_or(device);

    // nvme0n1p3 / mmcblk0p2 style: digits, then 'p', then partition digits.
    if let Some(idx) = name.rfind('p')
        && idx > 0
        && name[idx + 1..].chars().all(|c| c.is_ascii_digit())
        && !name[idx + 1..].is_empty()
        && name[..idx].ends_with(|c: char| c.is_ascii_digit())
    {
        return name[..idx].to_string();
    }

    // Whole-disk names in the p-partition families embed digits that are
    // part of the name (nvme namespace, mmc slot), not a partition number.
    if name.starts_with("nvme") || name.starts_with("mmcblk") {
        return name.to_string();
    }

    // sda1 style: strip the trailing run of digits.
    name.trim_end_matches(|c: char| c.is_ascii_digit()).to_string()
}

/// Classifier that resolves paths through a [`MountTable`].
pub struct MountDeviceClassifier {
    table: Arc<dyn MountTable>,
    policy: RotationalPolicy,
}

impl MountDeviceClassifier {
    #[must_use]
    pub fn new(table: Arc<dyn MountTable>, policy: RotationalPolicy) -> Self {
        Self { table, policy }
    }

    /// Resolve the raw device identifier backing `path`, for diagnostics.
    pub fn device_for(&self, path: &Path) -> Option<String> {
        let mounts = self.table.mounts().ok()?;
        find_mount(path, &mounts).map(|m| m.device.clone())
    }
}

impl DeviceClassifier for MountDeviceClassifier {
    fn is_rotational(&self, path: &Path) -> bool {
        // Mount query failures are absorbed here, never surfaced: the
        // non-rotational default selects the less destructive operation.
        let Ok(mounts) = self.table.mounts() else {
            return false;
        };
        let Some(mount) = find_mount(path, &mounts) else {
            return false;
        };
        if mount.device.is_empty() {
            return false;
        }
        self.policy.is_rotational_base(&base_device_name(&mount.device))
    }
}

/// Test double returning a fixed verdict for every path.
#[derive(Debug, Clone, Copy)]
pub struct FixedClassifier {
    rotational: bool,
}

impl FixedClassifier {
    #[must_use]
    pub const fn new(rotational: bool) -> Self {
        Self { rotational }
    }
}

impl DeviceClassifier for FixedClassifier {
    fn is_rotational(&self, _path: &Path) -> bool {
        self.rotational
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::DeviceConfig;
    use crate::device::mounts::{MountPoint, StaticMountTable};
    use proptest::prelude::*;
    use std::path::PathBuf;

    fn default_policy() -> RotationalPolicy {
        RotationalPolicy::from_patterns(&DeviceConfig::default().rotational_patterns)
            .expect("default patterns compile")
    }

    fn classifier_with_device(device: &str) -> MountDeviceClassifier {
        let table = StaticMountTable::new(vec![MountPoint {
            path: PathBuf::from("/"),
            device: device.to_string(),
            fs_type: "ext4".to_string(),
        }]);
        MountDeviceClassifier::new(Arc::new(table), default_policy())
    }

    #[test]
    fn strips_ata_partition_suffix() {
        assert_eq!(base_device_name("sda1"), "sda");
        assert_eq!(base_device_name("/dev/sda1"), "sda");
        assert_eq!(base_device_name("sdb12"), "sdb");
        assert_eq!(base_device_name("hda2"), "hda");
    }

    #[test]
    fn strips_nvme_partition_suffix() {
        assert_eq!(base_device_name("nvme0n1p3"), "nvme0n1");
        assert_eq!(base_device_name("/dev/nvme1n2p10"), "nvme1n2");
        assert_eq!(base_device_name("mmcblk0p2"), "mmcblk0");
    }

    #[test]
    fn unpartitioned_names_pass_through() {
        assert_eq!(base_device_name("sda"), "sda");
        assert_eq!(base_device_name("tmpfs"), "tmpfs");
        // Whole-disk p-family devices keep their namespace/slot digits.
        assert_eq!(base_device_name("nvme0n1"), "nvme0n1");
        assert_eq!(base_device_name("/dev/mmcblk0"), "mmcblk0");
    }

    #[test]
    fn sda_partition_is_rotational() {
        let c = classifier_with_device("/dev/sda1");
        assert!(c.is_rotational(Path::new("/var/log/syslog")));
    }

    #[test]
    fn nvme_partition_is_not_rotational() {
        let c = classifier_with_device("/dev/nvme0n1p3");
        assert!(!c.is_rotational(Path::new("/home/user/.cache")));
    }

    #[test]
    fn virtual_devices_are_not_rotational() {
        for dev in ["tmpfs", "overlay", "/dev/loop7", "/dev/mapper/root"] {
            let c = classifier_with_device(dev);
            assert!(!c.is_rotational(Path::new("/x")), "device {dev}");
        }
    }

    #[test]
    fn empty_device_defaults_non_rotational() {
        let c = classifier_with_device("");
        assert!(!c.is_rotational(Path::new("/anything")));
    }

    #[test]
    fn unresolvable_path_defaults_non_rotational() {
        let table = StaticMountTable::new(vec![MountPoint {
            path: PathBuf::from("/data"),
            device: "/dev/sda1".to_string(),
            fs_type: "ext4".to_string(),
        }]);
        let c = MountDeviceClassifier::new(Arc::new(table), default_policy());
        assert!(!c.is_rotational(Path::new("/tmp/elsewhere")));
    }

    #[test]
    fn policy_rejects_empty_base() {
        assert!(!default_policy().is_rotational_base(""));
    }

    #[test]
    fn device_for_reports_raw_identifier() {
        let c = classifier_with_device("/dev/sda1");
        assert_eq!(c.device_for(Path::new("/etc")).as_deref(), Some("/dev/sda1"));
    }

    proptest! {
        #[test]
        fn ata_names_always_strip_to_letters(disk in "sd[a-z]{1,2}", part in 1u32..64) {
            let name = format!("{disk}{part}");
            prop_assert_eq!(base_device_name(&name), disk);
        }

        #[test]
        fn nvme_names_keep_namespace(ctrl in 0u32..4, ns in 1u32..4, part in 1u32..16) {
            let name = format!("nvme{ctrl}n{ns}p{part}");
            prop_assert_eq!(base_device_name(&name), format!("nvme{ctrl}n{ns}"));
        }

        #[test]
        fn stripping_is_idempotent(name in "[a-z]{2,6}[0-9]{0,3}") {
            let once = base_device_name(&name);
            prop_assert_eq!(base_device_name(&once), once.clone());
        }

        #[test]
        fn rotational_verdict_requires_allow_list_match(base in "[a-z]{2,8}") {
            let policy = default_policy();
            let expected = (base.starts_with("sd") || base.starts_with("hd"))
                && base.len() > 2
                && base[2..].chars().all(|c| c.is_ascii_lowercase());
            prop_assert_eq!(policy.is_rotational_base(&base), expected);
        }
    }
}
