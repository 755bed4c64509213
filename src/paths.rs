//! Path utilities for store-relative document paths.
//!
//! Every logical path handled by the archiver is a store-relative string
//! with `/` separators, the same keying the rules layer uses for files.
//! Conversion to and from real filesystem paths happens at the store
//! boundary, never here.

/// Canonicalize a store-relative path.
///
/// Backslashes become `/`, repeated separators collapse, and leading or
/// trailing separators are stripped. Malformed input degrades to a
/// best-effort canonical form; this never fails.
pub fn normalize(path: &str) -> String {
    path.replace('\\', "/")
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// True iff `path` equals `root` or sits anywhere below it.
///
/// Both sides are normalized before comparison, so a trailing separator
/// on the configured root does not break containment checks.
pub fn is_under_root(path: &str, root: &str) -> bool {
    let path = normalize(path);
    let root = normalize(root);
    path == root || path.starts_with(&format!("{}/", root))
}

/// Strip `root + "/"` from the front of `path`.
///
/// Returns `None` when `path` is not below `root`, including the case
/// where `path` IS the root and there is no remainder to restore.
pub fn strip_root_prefix(path: &str, root: &str) -> Option<String> {
    let path = normalize(path);
    let root = normalize(root);
    let rest = path.strip_prefix(&format!("{}/", root))?;
    if rest.is_empty() {
        None
    } else {
        Some(rest.to_string())
    }
}

/// Split a path into its directory part and final component.
///
/// The directory is empty when the path has no separator.
pub fn split_dir_and_name(path: &str) -> (String, String) {
    match path.rsplit_once('/') {
        Some((dir, name)) => (dir.to_string(), name.to_string()),
        None => (String::new(), path.to_string()),
    }
}

/// Join a directory and a file name, tolerating an empty directory.
pub fn join(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", dir, name)
    }
}
