//! Block-device resolution and rotational classification.

pub mod classifier;
pub mod mounts;
