#![forbid(unsafe_code)]

//! Drive Sweep Helper (dsw) — cleanup utility that picks its deletion
//! strategy per target based on the backing storage device.
//!
//! Rotational (mechanical) media get a zero-fill overwrite before unlink;
//! flash/SSD media get a plain unlink. Targets are grouped into batch jobs
//! that run on a background worker while a foreground monitor renders live
//! progress.
//!
//! # Library usage
//!
//! Use the [`prelude`] for convenient access to the most common types:
//!
//! ```rust,no_run
//! use drive_sweep_helper::prelude::*;
//! ```
//!
//! Individual modules can also be imported directly:
//!
//! ```rust,no_run
//! use drive_sweep_helper::core::config::Config;
//! use drive_sweep_helper::engine::batch::{BatchJob, BatchSpec};
//! ```

pub mod prelude;

pub mod catalog;
pub mod core;
pub mod device;
pub mod engine;
pub mod logger;
