//! The drive-aware deletion engine: destructive operations, batch jobs,
//! and the progress monitor that runs them.

pub mod batch;
pub mod delete;
pub mod monitor;
