//! DSW-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, SweepError>;

/// Top-level error type for Drive Sweep Helper.
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("[DSW-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[DSW-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[DSW-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[DSW-1101] unsupported platform: {details}")]
    UnsupportedPlatform { details: String },

    #[error("[DSW-2001] mount table parse failure: {details}")]
    MountParse { details: String },

    #[error("[DSW-2101] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[DSW-3001] unlink failed for {path}: {source}")]
    UnlinkFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[DSW-3002] secure wipe failed for {path}: {details}")]
    SecureWipeFailed { path: PathBuf, details: String },

    #[error("[DSW-3003] recursive removal failed for {path}: {source}")]
    RecursiveRemoveFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[DSW-3004] category {category} requires elevated privileges")]
    ElevationRequired { category: String },

    #[error("[DSW-3101] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[DSW-3102] channel closed in component {component}")]
    ChannelClosed { component: &'static str },

    #[error("[DSW-3900] runtime failure: {details}")]
    Runtime { details: String },
}

impl SweepError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "DSW-1001",
            Self::MissingConfig { .. } => "DSW-1002",
            Self::ConfigParse { .. } => "DSW-1003",
            Self::UnsupportedPlatform { .. } => "DSW-1101",
            Self::MountParse { .. } => "DSW-2001",
            Self::Serialization { .. } => "DSW-2101",
            Self::UnlinkFailed { .. } => "DSW-3001",
            Self::SecureWipeFailed { .. } => "DSW-3002",
            Self::RecursiveRemoveFailed { .. } => "DSW-3003",
            Self::ElevationRequired { .. } => "DSW-3004",
            Self::Io { .. } => "DSW-3101",
            Self::ChannelClosed { .. } => "DSW-3102",
            Self::Runtime { .. } => "DSW-3900",
        }
    }

    /// Whether retrying might resolve the failure.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Io { .. }
                | Self::ChannelClosed { .. }
                | Self::MountParse { .. }
                | Self::UnlinkFailed { .. }
                | Self::SecureWipeFailed { .. }
                | Self::RecursiveRemoveFailed { .. }
                | Self::Runtime { .. }
        )
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl From<serde_json::Error> for SweepError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for SweepError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}
