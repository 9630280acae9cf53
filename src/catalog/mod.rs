//! Category catalog: the closed set of cleanup targets.
//!
//! Each category maps to one or more batch specs with static candidate path
//! lists. This is deliberately an enum rather than any string-to-handler
//! dispatch; the engine interprets typed specs natively, so paths with
//! spaces or shell metacharacters need no quoting anywhere.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use crate::engine::batch::BatchSpec;

/// A selectable cleanup category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    BrowserCaches,
    BrowserHistory,
    ShellHistory,
    UserCaches,
    UserLogs,
    Thumbnails,
    Trash,
    TempFiles,
    SystemLogs,
}

/// Every category, in menu order.
pub const ALL_CATEGORIES: [Category; 9] = [
    Category::BrowserCaches,
    Category::BrowserHistory,
    Category::ShellHistory,
    Category::UserCaches,
    Category::UserLogs,
    Category::Thumbnails,
    Category::Trash,
    Category::TempFiles,
    Category::SystemLogs,
];

impl Category {
    /// Stable identifier used on the command line.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::BrowserCaches => "browser-caches",
            Self::BrowserHistory => "browser-history",
            Self::ShellHistory => "shell-history",
            Self::UserCaches => "user-caches",
            Self::UserLogs => "user-logs",
            Self::Thumbnails => "thumbnails",
            Self::Trash => "trash",
            Self::TempFiles => "temp-files",
            Self::SystemLogs => "system-logs",
        }
    }

    /// Human-readable menu title.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::BrowserCaches => "Browser caches",
            Self::BrowserHistory => "Browser history",
            Self::ShellHistory => "Shell history",
            Self::UserCaches => "User caches",
            Self::UserLogs => "User logs",
            Self::Thumbnails => "Thumbnail caches",
            Self::Trash => "Trash",
            Self::TempFiles => "Temporary files",
            Self::SystemLogs => "System logs",
        }
    }

    /// Parse a command-line identifier.
    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        ALL_CATEGORIES.iter().copied().find(|c| c.id() == id)
    }

    /// Whether the category touches paths owned by root.
    #[must_use]
    pub const fn requires_root(self) -> bool {
        matches!(self, Self::SystemLogs)
    }

    /// Expand the category into batch specs rooted at `home`.
    #[must_use]
    pub fn batch_specs(self, home: &Path) -> Vec<BatchSpec> {
        match self {
            Self::BrowserCaches => vec![
                BatchSpec::new(
                    "Firefox cache",
                    vec![home.join(".cache/mozilla/firefox")],
                ),
                BatchSpec::new(
                    "Chromium-family caches",
                    vec![
                        home.join(".cache/google-chrome"),
                        home.join(".cache/chromium"),
                        home.join(".cache/BraveSoftware"),
                    ],
                ),
            ],
            Self::BrowserHistory => vec![
                BatchSpec::new(
                    "Firefox history",
                    firefox_profile_files(home, &["places.sqlite", "formhistory.sqlite"]),
                ),
                BatchSpec::new(
                    "Chromium-family history",
                    vec![
                        home.join(".config/google-chrome/Default/History"),
                        home.join(".config/chromium/Default/History"),
                    ],
                ),
            ],
            Self::ShellHistory => vec![BatchSpec::new(
                "Shell history",
                vec![
                    home.join(".bash_history"),
                    home.join(".zsh_history"),
                    home.join(".local/share/fish/fish_history"),
                    home.join(".python_history"),
                    home.join(".lesshst"),
                ],
            )],
            Self::UserCaches => vec![BatchSpec::new(
                "User caches",
                vec![
                    home.join(".cache/pip"),
                    home.join(".cache/fontconfig"),
                    home.join(".cache/mesa_shader_cache"),
                ],
            )],
            Self::UserLogs => vec![BatchSpec::new(
                "User logs",
                vec![home.join(".xsession-errors"), home.join(".wget-hsts")],
            )],
            Self::Thumbnails => vec![BatchSpec::new(
                "Thumbnail caches",
                vec![
                    home.join(".cache/thumbnails"),
                    home.join(".thumbnails"),
                ],
            )],
            Self::Trash => vec![BatchSpec::new(
                "Trash",
                vec![
                    home.join(".local/share/Trash/files"),
                    home.join(".local/share/Trash/info"),
                ],
            )],
            Self::TempFiles => vec![BatchSpec::new(
                "Session temp files",
                vec![home.join(".local/share/xorg"), home.join(".cache/event-sound-cache")],
            )],
            Self::SystemLogs => vec![BatchSpec::new(
                "System logs",
                vec![
                    PathBuf::from("/var/log/syslog.1"),
                    PathBuf::from("/var/log/kern.log.1"),
                    PathBuf::from("/var/log/auth.log.1"),
                    PathBuf::from("/var/log/dmesg.0"),
                ],
            )],
        }
    }

    /// Directories that dependent applications expect to keep existing, so
    /// the run loop recreates them empty right after removal.
    #[must_use]
    pub fn recreate_after(self, home: &Path) -> Vec<PathBuf> {
        match self {
            Self::Thumbnails => vec![home.join(".cache/thumbnails")],
            Self::Trash => vec![
                home.join(".local/share/Trash/files"),
                home.join(".local/share/Trash/info"),
            ],
            _ => Vec::new(),
        }
    }
}

/// Resolve candidate files inside Firefox profile directories.
///
/// Profile names are randomized (`xxxxxxxx.default-release`), so the static
/// list is produced by a shallow scan of the profiles root.
fn firefox_profile_files(home: &Path, names: &[&str]) -> Vec<PathBuf> {
    let profiles_root = home.join(".mozilla/firefox");
    let Ok(entries) = std::fs::read_dir(&profiles_root) else {
        return Vec::new();
    };

    let mut out = Vec::new();
    for entry in entries.flatten() {
        let profile = entry.path();
        if !profile.is_dir() {
            continue;
        }
        for name in names {
            out.push(profile.join(name));
        }
    }
    out.sort();
    out
}

/// Collapse duplicate selections to one execution per distinct category,
/// preserving first-occurrence order, then expand into batch specs.
#[must_use]
pub fn expand_selection(categories: &[Category], home: &Path) -> Vec<BatchSpec> {
    let mut seen = std::collections::HashSet::new();
    let mut specs = Vec::new();
    for category in categories {
        if seen.insert(*category) {
            specs.extend(category.batch_specs(home));
        }
    }
    specs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip() {
        for category in ALL_CATEGORIES {
            assert_eq!(Category::from_id(category.id()), Some(category));
        }
        assert_eq!(Category::from_id("nonsense"), None);
    }

    #[test]
    fn ids_are_unique() {
        let ids: std::collections::HashSet<&str> =
            ALL_CATEGORIES.iter().map(|c| c.id()).collect();
        assert_eq!(ids.len(), ALL_CATEGORIES.len());
    }

    #[test]
    fn only_system_logs_requires_root() {
        for category in ALL_CATEGORIES {
            assert_eq!(
                category.requires_root(),
                category == Category::SystemLogs,
                "{}",
                category.id()
            );
        }
    }

    #[test]
    fn every_category_yields_specs_with_candidates() {
        let home = Path::new("/home/someone");
        for category in ALL_CATEGORIES {
            let specs = category.batch_specs(home);
            assert!(!specs.is_empty(), "{} has no specs", category.id());
            for spec in &specs {
                // Firefox history expands empty when no profiles exist.
                if spec.label == "Firefox history" {
                    continue;
                }
                assert!(
                    !spec.candidates.is_empty(),
                    "{} spec {:?} has no candidates",
                    category.id(),
                    spec.label
                );
            }
        }
    }

    #[test]
    fn candidate_paths_are_absolute() {
        let home = Path::new("/home/someone");
        for category in ALL_CATEGORIES {
            for spec in category.batch_specs(home) {
                for path in &spec.candidates {
                    assert!(path.is_absolute(), "{path:?} not absolute");
                }
            }
        }
    }

    #[test]
    fn duplicate_selections_collapse() {
        let home = Path::new("/home/someone");
        let once = expand_selection(&[Category::ShellHistory], home);
        let twice = expand_selection(
            &[Category::ShellHistory, Category::ShellHistory],
            home,
        );
        assert_eq!(once.len(), twice.len());
    }

    #[test]
    fn selection_preserves_first_occurrence_order() {
        let home = Path::new("/home/someone");
        let specs = expand_selection(
            &[
                Category::Trash,
                Category::ShellHistory,
                Category::Trash,
            ],
            home,
        );
        assert_eq!(specs[0].label, "Trash");
        assert_eq!(specs[1].label, "Shell history");
        assert_eq!(specs.len(), 2);
    }

    #[test]
    fn firefox_profile_scan_finds_history_files() {
        let dir = tempfile::tempdir().unwrap();
        let profile = dir.path().join(".mozilla/firefox/ab12cd34.default-release");
        std::fs::create_dir_all(&profile).unwrap();

        let files = firefox_profile_files(dir.path(), &["places.sqlite"]);
        assert_eq!(files, vec![profile.join("places.sqlite")]);
    }

    #[test]
    fn firefox_profile_scan_tolerates_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        assert!(firefox_profile_files(dir.path(), &["places.sqlite"]).is_empty());
    }

    #[test]
    fn trash_dirs_marked_for_recreation() {
        let home = Path::new("/home/someone");
        assert_eq!(Category::Trash.recreate_after(home).len(), 2);
        assert!(Category::ShellHistory.recreate_after(home).is_empty());
    }
}
