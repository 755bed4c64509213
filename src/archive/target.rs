//! Destination resolution for archive and unarchive transitions.
//!
//! Archiving mirrors a document's relative directory under the root;
//! unarchiving strips the root prefix and restores the remainder. The
//! two are exact inverses, modulo collision suffixes added later.

use crate::paths;

/// Which way a document is crossing the archive-root boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Archive,
    Unarchive,
}

/// Resolved destination for one transition. Collision-free only after
/// the engine has run it past the collision resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetDecision {
    pub direction: Direction,
    /// Destination directory; empty means the store's document root
    pub dir: String,
    /// Full destination path
    pub full_path: String,
}

/// Mirror `current` under `root`, preserving its relative directory.
pub fn resolve_archive_target(current: &str, root: &str) -> TargetDecision {
    let root = paths::normalize(root);
    let (rel_dir, name) = paths::split_dir_and_name(&paths::normalize(current));

    let dir = if rel_dir.is_empty() {
        root
    } else {
        format!("{}/{}", root, rel_dir)
    };
    let full_path = format!("{}/{}", dir, name);

    TargetDecision {
        direction: Direction::Archive,
        dir,
        full_path,
    }
}

/// Restore `current` to its pre-archive position.
///
/// `None` when `current` is not under `root`, or is the root itself:
/// a document sitting literally at the root has no subpath to restore.
pub fn resolve_unarchive_target(current: &str, root: &str) -> Option<TargetDecision> {
    let remainder = paths::strip_root_prefix(current, root)?;
    let (dir, _) = paths::split_dir_and_name(&remainder);

    Some(TargetDecision {
        direction: Direction::Unarchive,
        dir,
        full_path: remainder,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_target_mirrors_relative_dir() {
        let target = resolve_archive_target("Task/Sub/TASK-1.md", "Archive");
        assert_eq!(target.dir, "Archive/Task/Sub");
        assert_eq!(target.full_path, "Archive/Task/Sub/TASK-1.md");
        assert_eq!(target.direction, Direction::Archive);
    }

    #[test]
    fn test_archive_target_root_level_file() {
        let target = resolve_archive_target("TASK-1.md", "Archive");
        assert_eq!(target.dir, "Archive");
        assert_eq!(target.full_path, "Archive/TASK-1.md");
    }

    #[test]
    fn test_unarchive_target_restores_remainder() {
        let target = resolve_unarchive_target("Archive/Task/TASK-1.md", "Archive").unwrap();
        assert_eq!(target.dir, "Task");
        assert_eq!(target.full_path, "Task/TASK-1.md");
        assert_eq!(target.direction, Direction::Unarchive);
    }

    #[test]
    fn test_unarchive_target_root_level_file() {
        let target = resolve_unarchive_target("Archive/TASK-1.md", "Archive").unwrap();
        assert_eq!(target.dir, "");
        assert_eq!(target.full_path, "TASK-1.md");
    }

    #[test]
    fn test_unarchive_target_out_of_domain() {
        assert_eq!(resolve_unarchive_target("Task/TASK-1.md", "Archive"), None);
        // The root itself is never a valid unarchive source.
        assert_eq!(resolve_unarchive_target("Archive", "Archive"), None);
    }

    #[test]
    fn test_path_symmetry() {
        for path in ["TASK-1.md", "Task/TASK-1.md", "Task/Sub/Deep/TASK-1.md"] {
            let archived = resolve_archive_target(path, "Archive");
            let restored = resolve_unarchive_target(&archived.full_path, "Archive").unwrap();
            assert_eq!(restored.full_path, path);
        }
    }
}
