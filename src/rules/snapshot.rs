//! Document snapshot: the read-only view of one document at evaluation time.
//!
//! A snapshot is built fresh for every evaluation and never cached;
//! metadata may change between change events, and a stale view would
//! reintroduce exactly the drift the classifier exists to observe.

use serde_json::{Map, Value};
use std::collections::HashSet;

/// Normalize one tag token: trim, lowercase, strip a leading `#`.
pub fn normalize_tag(raw: &str) -> String {
    let trimmed = raw.trim();
    let stripped = trimmed.strip_prefix('#').unwrap_or(trimmed);
    stripped.to_lowercase()
}

/// Lightweight view of a single document for rule evaluation.
///
/// `fields` is the parsed frontmatter mapping as the store handed it
/// over; `tags` holds inline tags, already normalized. The snapshot is
/// never mutated after construction.
#[derive(Debug, Clone)]
pub struct DocumentSnapshot {
    /// Store-relative path of the document
    pub path: String,
    /// Metadata field name -> raw value
    pub fields: Map<String, Value>,
    /// Normalized inline tags
    pub tags: HashSet<String>,
}

impl DocumentSnapshot {
    /// Build a snapshot, normalizing the provided inline tags.
    pub fn new(
        path: impl Into<String>,
        fields: Map<String, Value>,
        tags: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            path: path.into(),
            fields,
            tags: tags
                .into_iter()
                .map(|t| normalize_tag(&t))
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }

    /// Extension of the final path component (lowercase, no dot).
    pub fn extension(&self) -> Option<String> {
        let name = self.path.rsplit('/').next()?;
        let (stem, ext) = name.rsplit_once('.')?;
        if stem.is_empty() {
            // Dotfiles have no extension.
            return None;
        }
        Some(ext.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_tag() {
        assert_eq!(normalize_tag("#Archived"), "archived");
        assert_eq!(normalize_tag("archived"), "archived");
        assert_eq!(normalize_tag(" Archived "), "archived");
        assert_eq!(normalize_tag("#"), "");
    }

    #[test]
    fn test_snapshot_normalizes_inline_tags() {
        let snapshot = DocumentSnapshot::new(
            "Task/note.md",
            Map::new(),
            vec!["#Done".to_string(), "  keep ".to_string(), "#".to_string()],
        );
        assert!(snapshot.tags.contains("done"));
        assert!(snapshot.tags.contains("keep"));
        assert_eq!(snapshot.tags.len(), 2);
    }

    #[test]
    fn test_extension() {
        let snap = |p: &str| DocumentSnapshot::new(p, Map::new(), Vec::new());
        assert_eq!(snap("Task/NOTE.MD").extension(), Some("md".to_string()));
        assert_eq!(snap("Task/README").extension(), None);
        assert_eq!(snap("Task/.hidden").extension(), None);
    }
}
