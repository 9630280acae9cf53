//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use drive_sweep_helper::prelude::*;
//! ```

// Core
pub use crate::core::config::Config;
pub use crate::core::errors::{Result, SweepError};

// Device
pub use crate::device::classifier::{
    DeviceClassifier, MountDeviceClassifier, RotationalPolicy, base_device_name,
};
pub use crate::device::mounts::{MountPoint, MountTable, ProcMountTable};

// Engine
pub use crate::engine::batch::{BatchJob, BatchSpec, ExecutionResult, JobStatus};
pub use crate::engine::delete::{DeleteAction, DeleteOp, Deleter};
pub use crate::engine::monitor::ProgressMonitor;

// Catalog
pub use crate::catalog::{ALL_CATEGORIES, Category, expand_selection};
