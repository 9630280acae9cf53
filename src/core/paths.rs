//! Path resolution for cleanup targets.
//!
//! Classification follows the mount table, so a target must be resolved to
//! the real filesystem location before the device lookup. Cleanup candidates
//! routinely do not exist, in which case canonicalization is impossible and
//! a syntactic cleanup of `.`/`..` components has to do.

use std::env;
use std::path::{Component, Path, PathBuf};

/// Resolve a cleanup target to an absolute path, following symlinks when the
/// path exists and normalizing syntactically when it does not.
pub fn resolve_target_path(target: &Path) -> PathBuf {
    let absolute = if target.is_absolute() {
        target.to_path_buf()
    } else {
        env::current_dir().map_or_else(|_| target.to_path_buf(), |cwd| cwd.join(target))
    };

    std::fs::canonicalize(&absolute).unwrap_or_else(|_| strip_dot_components(&absolute))
}

/// Remove `.` components and resolve `..` against the preceding normal
/// component. Purely lexical; never touches the filesystem.
fn strip_dot_components(path: &Path) -> PathBuf {
    path.components()
        .fold(Vec::new(), |mut kept, component| {
            match component {
                Component::CurDir => {}
                Component::ParentDir => {
                    if matches!(kept.last(), Some(Component::Normal(_))) {
                        kept.pop();
                    }
                }
                other => kept.push(other),
            }
            kept
        })
        .into_iter()
        .collect()
}
