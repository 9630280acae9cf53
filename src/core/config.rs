//! Configuration system: TOML file + env var overrides + smart defaults.

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{Result, SweepError};

/// Full DSW configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
#[derive(Default)]
pub struct Config {
    pub device: DeviceConfig,
    pub wipe: WipeConfig,
    pub monitor: MonitorConfig,
    pub logging: LoggingConfig,
    pub paths: PathsConfig,
}

/// Device classification policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DeviceConfig {
    /// Regex allow-list matched against base device names (partition suffix
    /// stripped). Only matching devices are treated as rotational; everything
    /// else (NVMe, virtual, unresolvable) gets the plain-unlink path.
    pub rotational_patterns: Vec<String>,
    /// How long a parsed mount table stays valid before re-reading.
    pub mounts_cache_ttl_ms: u64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            // Legacy ATA-style names only. A true read of the sysfs
            // rotational flag is a known limitation, not a bug.
            rotational_patterns: vec!["^sd[a-z]+$".to_string(), "^hd[a-z]+$".to_string()],
            mounts_cache_ttl_ms: 5_000,
        }
    }
}

/// Secure-overwrite tuning for rotational media.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WipeConfig {
    /// Zero-fill passes over the file before unlinking. Single pass is a
    /// best-effort mitigation, not a recovery guarantee.
    pub passes: u32,
    /// Write buffer size for the overwrite loop.
    pub buffer_size_bytes: usize,
    /// fsync after each pass so the zeros reach the platters.
    pub sync_after_pass: bool,
}

impl Default for WipeConfig {
    fn default() -> Self {
        Self {
            passes: 1,
            buffer_size_bytes: 8_192,
            sync_after_pass: true,
        }
    }
}

/// Progress monitor rendering knobs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MonitorConfig {
    /// Interval between completion polls / spinner redraws.
    pub poll_interval_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
        }
    }
}

/// Activity log tuning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    pub jsonl_enabled: bool,
    pub jsonl_path: PathBuf,
    pub channel_capacity: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            jsonl_enabled: true,
            jsonl_path: PathsConfig::default().jsonl_log,
            channel_capacity: 1_024,
        }
    }
}

/// Well-known file locations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathsConfig {
    pub config_file: PathBuf,
    pub jsonl_log: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        let home_dir = env::var_os("HOME").map_or_else(
            || {
                eprintln!("[DSW-CONFIG] WARNING: HOME not set, falling back to /tmp for data paths");
                PathBuf::from("/tmp")
            },
            PathBuf::from,
        );
        let cfg = home_dir.join(".config").join("dsw").join("config.toml");
        let data = home_dir.join(".local").join("share").join("dsw");
        Self {
            config_file: cfg,
            jsonl_log: data.join("activity.jsonl"),
        }
    }
}

impl Config {
    /// Default configuration path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        PathsConfig::default().config_file
    }

    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// Missing config file is not an error when loading from default path;
    /// defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);
        let is_explicit_path = path.is_some();

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| SweepError::Io {
                path: path_buf.clone(),
                source,
            })?;
            let parsed: Self = toml::from_str(&raw)?;
            parsed
        } else if is_explicit_path {
            return Err(SweepError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.paths.config_file = path_buf;
        cfg.apply_env_overrides()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(env_var)
    }

    /// Apply overrides from an injectable lookup, so the parsing and
    /// precedence rules are testable without mutating process environment.
    fn apply_overrides_from<F>(&mut self, mut lookup: F) -> Result<()>
    where
        F: FnMut(&str) -> Option<String>,
    {
        // device
        if let Some(raw) = lookup("DSW_DEVICE_ROTATIONAL_PATTERNS") {
            self.device.rotational_patterns = raw
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(raw) = lookup("DSW_DEVICE_MOUNTS_CACHE_TTL_MS") {
            self.device.mounts_cache_ttl_ms = parse_env_u64("DSW_DEVICE_MOUNTS_CACHE_TTL_MS", &raw)?;
        }

        // wipe
        if let Some(raw) = lookup("DSW_WIPE_PASSES") {
            self.wipe.passes = parse_env_u32("DSW_WIPE_PASSES", &raw)?;
        }
        if let Some(raw) = lookup("DSW_WIPE_BUFFER_SIZE_BYTES") {
            self.wipe.buffer_size_bytes = parse_env_usize("DSW_WIPE_BUFFER_SIZE_BYTES", &raw)?;
        }
        if let Some(raw) = lookup("DSW_WIPE_SYNC_AFTER_PASS") {
            self.wipe.sync_after_pass = parse_env_bool("DSW_WIPE_SYNC_AFTER_PASS", &raw)?;
        }

        // monitor
        if let Some(raw) = lookup("DSW_MONITOR_POLL_INTERVAL_MS") {
            self.monitor.poll_interval_ms = parse_env_u64("DSW_MONITOR_POLL_INTERVAL_MS", &raw)?;
        }

        // logging
        if let Some(raw) = lookup("DSW_LOGGING_JSONL_ENABLED") {
            self.logging.jsonl_enabled = parse_env_bool("DSW_LOGGING_JSONL_ENABLED", &raw)?;
        }
        if let Some(raw) = lookup("DSW_LOGGING_JSONL_PATH") {
            self.logging.jsonl_path = PathBuf::from(raw);
        }
        if let Some(raw) = lookup("DSW_LOGGING_CHANNEL_CAPACITY") {
            self.logging.channel_capacity = parse_env_usize("DSW_LOGGING_CHANNEL_CAPACITY", &raw)?;
        }

        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.wipe.passes == 0 {
            return Err(SweepError::InvalidConfig {
                details: "wipe.passes must be at least 1".to_string(),
            });
        }
        if self.wipe.buffer_size_bytes == 0 {
            return Err(SweepError::InvalidConfig {
                details: "wipe.buffer_size_bytes must be nonzero".to_string(),
            });
        }
        if self.monitor.poll_interval_ms == 0 || self.monitor.poll_interval_ms >= 1_000 {
            return Err(SweepError::InvalidConfig {
                details: format!(
                    "monitor.poll_interval_ms must be in 1..1000, got {}",
                    self.monitor.poll_interval_ms
                ),
            });
        }
        if self.logging.channel_capacity == 0 {
            return Err(SweepError::InvalidConfig {
                details: "logging.channel_capacity must be nonzero".to_string(),
            });
        }
        for pattern in &self.device.rotational_patterns {
            regex::Regex::new(pattern).map_err(|e| SweepError::InvalidConfig {
                details: format!("bad rotational pattern {pattern:?}: {e}"),
            })?;
        }
        Ok(())
    }
}

fn env_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}

fn parse_env_u64(key: &str, raw: &str) -> Result<u64> {
    raw.parse().map_err(|e| SweepError::InvalidConfig {
        details: format!("{key}={raw:?}: {e}"),
    })
}

fn parse_env_u32(key: &str, raw: &str) -> Result<u32> {
    raw.parse().map_err(|e| SweepError::InvalidConfig {
        details: format!("{key}={raw:?}: {e}"),
    })
}

fn parse_env_usize(key: &str, raw: &str) -> Result<usize> {
    raw.parse().map_err(|e| SweepError::InvalidConfig {
        details: format!("{key}={raw:?}: {e}"),
    })
}

fn parse_env_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(SweepError::InvalidConfig {
            details: format!("{key}={other:?}: expected boolean"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn numeric_overrides_replace_defaults() {
        let mut cfg = Config::default();
        let overrides = vars(&[
            ("DSW_WIPE_PASSES", "3"),
            ("DSW_MONITOR_POLL_INTERVAL_MS", "250"),
        ]);

        cfg.apply_overrides_from(|name| overrides.get(name).cloned())
            .expect("overrides should parse");

        assert_eq!(cfg.wipe.passes, 3);
        assert_eq!(cfg.monitor.poll_interval_ms, 250);
        assert_eq!(cfg.wipe.buffer_size_bytes, 8_192, "untouched field keeps default");
    }

    #[test]
    fn boolean_overrides_accept_common_spellings() {
        for (raw, expected) in [("0", false), ("off", false), ("YES", true), ("1", true)] {
            let mut cfg = Config::default();
            let overrides = vars(&[("DSW_WIPE_SYNC_AFTER_PASS", raw)]);
            cfg.apply_overrides_from(|name| overrides.get(name).cloned())
                .expect("boolean should parse");
            assert_eq!(cfg.wipe.sync_after_pass, expected, "raw {raw:?}");
        }
    }

    #[test]
    fn pattern_override_splits_on_commas() {
        let mut cfg = Config::default();
        let overrides = vars(&[(
            "DSW_DEVICE_ROTATIONAL_PATTERNS",
            "^sd[a-z]+$, ^vd[a-z]+$ ,,",
        )]);

        cfg.apply_overrides_from(|name| overrides.get(name).cloned())
            .expect("patterns should parse");

        assert_eq!(
            cfg.device.rotational_patterns,
            vec!["^sd[a-z]+$".to_string(), "^vd[a-z]+$".to_string()]
        );
    }

    #[test]
    fn malformed_numeric_override_rejected() {
        let mut cfg = Config::default();
        let overrides = vars(&[("DSW_WIPE_PASSES", "many")]);

        let err = cfg
            .apply_overrides_from(|name| overrides.get(name).cloned())
            .expect_err("non-numeric passes should fail");
        assert_eq!(err.code(), "DSW-1001");
        assert!(err.to_string().contains("DSW_WIPE_PASSES"));
    }

    #[test]
    fn malformed_boolean_override_rejected() {
        let mut cfg = Config::default();
        let overrides = vars(&[("DSW_LOGGING_JSONL_ENABLED", "maybe")]);

        let err = cfg
            .apply_overrides_from(|name| overrides.get(name).cloned())
            .expect_err("bad boolean should fail");
        assert_eq!(err.code(), "DSW-1001");
    }

    #[test]
    fn absent_overrides_leave_config_untouched() {
        let mut cfg = Config::default();
        cfg.apply_overrides_from(|_| None)
            .expect("empty lookup is a no-op");
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn defaults_are_valid() {
        let cfg = Config::default();
        cfg.validate().expect("default config must validate");
        assert_eq!(cfg.wipe.passes, 1);
        assert_eq!(cfg.monitor.poll_interval_ms, 100);
        assert_eq!(cfg.device.rotational_patterns.len(), 2);
    }

    #[test]
    fn zero_wipe_passes_rejected() {
        let mut cfg = Config::default();
        cfg.wipe.passes = 0;
        let err = cfg.validate().expect_err("should reject zero passes");
        assert_eq!(err.code(), "DSW-1001");
    }

    #[test]
    fn second_scale_poll_interval_rejected() {
        // The monitor contract is sub-second polling.
        let mut cfg = Config::default();
        cfg.monitor.poll_interval_ms = 1_000;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn bad_rotational_pattern_rejected() {
        let mut cfg = Config::default();
        cfg.device.rotational_patterns = vec!["[unclosed".to_string()];
        let err = cfg.validate().expect_err("should reject bad regex");
        assert!(err.to_string().contains("rotational pattern"));
    }

    #[test]
    fn parses_partial_toml_with_defaults() {
        let raw = "[wipe]\npasses = 3\n";
        let cfg: Config = toml::from_str(raw).expect("partial toml should parse");
        assert_eq!(cfg.wipe.passes, 3);
        assert_eq!(cfg.wipe.buffer_size_bytes, 8_192);
        assert_eq!(cfg.monitor.poll_interval_ms, 100);
    }

    #[test]
    fn missing_explicit_config_is_error() {
        let err = Config::load(Some(Path::new("/nonexistent/dsw/config.toml")))
            .expect_err("explicit missing path should fail");
        assert_eq!(err.code(), "DSW-1002");
    }

    #[test]
    fn load_from_file_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[monitor]\npoll_interval_ms = 50\n").unwrap();
        let cfg = Config::load(Some(&path)).expect("load should succeed");
        assert_eq!(cfg.monitor.poll_interval_ms, 50);
        assert_eq!(cfg.paths.config_file, path);
    }
}
