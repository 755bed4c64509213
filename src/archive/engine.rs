//! Transition engine: classifies documents and moves them across the
//! archive-root boundary.
//!
//! A document is Active or Archived purely by where its path sits
//! relative to the configured root; that state is recomputed on every
//! call and never stored, so path and state cannot diverge. Duplicate
//! change events are harmless: a second pass over an already-settled
//! document is a no-op.

use super::collision::resolve_collision;
use super::target::{resolve_archive_target, resolve_unarchive_target};
use crate::config::{ArchiveConfig, RuleSet};
use crate::paths;
use crate::rules::{should_archive, DocumentSnapshot};
use crate::store::{DocumentStore, StoreError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::RwLock;
use thiserror::Error;

/// The one document extension the engine recognizes
const DOCUMENT_EXTENSION: &str = "md";

/// Result of processing a single document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// Nothing to do: rules and location already agree
    NoAction,
    /// Dry run: would move into the archive at this path
    WouldArchive(String),
    /// Dry run: would move out of the archive to this path
    WouldUnarchive(String),
    /// Moved into the archive at this path
    Archived(String),
    /// Moved out of the archive to this path
    Unarchived(String),
}

impl TransitionOutcome {
    /// Destination of a performed move, if one happened.
    pub fn moved_to(&self) -> Option<&str> {
        match self {
            TransitionOutcome::Archived(path) | TransitionOutcome::Unarchived(path) => Some(path),
            _ => None,
        }
    }
}

/// Failure while transitioning one document.
#[derive(Debug, Error)]
#[error("{path}: {source}")]
pub struct EngineError {
    pub path: String,
    #[source]
    pub source: StoreError,
}

/// Aggregate result of a full-store scan.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanSummary {
    /// Documents that crossed into the archive
    pub archived_count: usize,
    /// Documents that crossed back out
    pub unarchived_count: usize,
    /// Dry-run only: transitions that would have happened
    pub would_archive_count: usize,
    pub would_unarchive_count: usize,
    /// Per-document failures; these never abort the scan
    pub errors: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ScanSummary {
    pub fn success(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Classification plus move orchestration over a document store.
///
/// The compiled rule set can be hot-swapped between calls; every call
/// reads the value current at its start.
pub struct ArchiveEngine<S> {
    store: S,
    rules: RwLock<RuleSet>,
}

impl<S: DocumentStore> ArchiveEngine<S> {
    pub fn new(store: S, config: &ArchiveConfig) -> Self {
        Self {
            store,
            rules: RwLock::new(config.compile()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Atomically swap the active rule set.
    pub fn update_config(&self, config: &ArchiveConfig) {
        let compiled = config.compile();
        let mut rules = self
            .rules
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *rules = compiled;
    }

    fn current_rules(&self) -> RuleSet {
        self.rules
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Classify one document and perform (or preview) the warranted move.
    ///
    /// Non-markdown paths and paths under an excluded prefix are skipped
    /// outright. Store failures other than "directory already exists"
    /// surface as errors; nothing is retried here.
    pub fn process_document(&self, path: &str) -> Result<TransitionOutcome, EngineError> {
        let rules = self.current_rules();
        let path = paths::normalize(path);

        if !is_document(&path) {
            return Ok(TransitionOutcome::NoAction);
        }
        if rules
            .excluded_roots
            .iter()
            .any(|prefix| paths::is_under_root(&path, prefix))
        {
            tracing::debug!(path = %path, "Skipping excluded path");
            return Ok(TransitionOutcome::NoAction);
        }

        let metadata = self.store.metadata(&path).map_err(|e| EngineError {
            path: path.clone(),
            source: e,
        })?;
        let snapshot = DocumentSnapshot::new(path.clone(), metadata.fields, metadata.tags);

        let want_archive = should_archive(&snapshot, &rules);
        let in_archive = paths::is_under_root(&path, &rules.archive_root);

        if want_archive && !in_archive {
            let target = resolve_archive_target(&path, &rules.archive_root);
            if rules.dry_run {
                return Ok(TransitionOutcome::WouldArchive(target.full_path));
            }
            let final_path = self.perform_move(&path, &target.dir, &target.full_path)?;
            tracing::info!(from = %path, to = %final_path, "Archived document");
            Ok(TransitionOutcome::Archived(final_path))
        } else if !want_archive && in_archive && rules.unarchive_on_clear {
            let Some(target) = resolve_unarchive_target(&path, &rules.archive_root) else {
                // A document literally at the root has nowhere to go back to.
                return Ok(TransitionOutcome::NoAction);
            };
            if rules.dry_run {
                return Ok(TransitionOutcome::WouldUnarchive(target.full_path));
            }
            let final_path = self.perform_move(&path, &target.dir, &target.full_path)?;
            tracing::info!(from = %path, to = %final_path, "Unarchived document");
            Ok(TransitionOutcome::Unarchived(final_path))
        } else {
            Ok(TransitionOutcome::NoAction)
        }
    }

    /// Ensure the destination directory, resolve collisions, move.
    fn perform_move(
        &self,
        from: &str,
        dest_dir: &str,
        desired: &str,
    ) -> Result<String, EngineError> {
        if !dest_dir.is_empty() {
            match self.store.create_dir_all(dest_dir) {
                Ok(()) | Err(StoreError::AlreadyExists(_)) => {}
                Err(e) => {
                    return Err(EngineError {
                        path: from.to_string(),
                        source: e,
                    })
                }
            }
        }

        let final_path = resolve_collision(desired, |p| self.store.exists(p));
        if final_path != desired {
            tracing::debug!(desired = %desired, resolved = %final_path, "Destination collision");
        }

        self.store
            .rename(from, &final_path)
            .map_err(|e| EngineError {
                path: from.to_string(),
                source: e,
            })?;
        Ok(final_path)
    }

    /// Process every document in the store, tallying containment flips.
    ///
    /// Containment is re-derived from the post-move path, and failures
    /// on individual documents are collected without aborting the sweep.
    pub fn scan_all(&self) -> ScanSummary {
        let started_at = Utc::now();
        let root = self.current_rules().archive_root;

        let mut archived_count = 0;
        let mut unarchived_count = 0;
        let mut would_archive_count = 0;
        let mut would_unarchive_count = 0;
        let mut errors = Vec::new();

        for path in self.store.list_documents() {
            let was_archived = paths::is_under_root(&path, &root);
            match self.process_document(&path) {
                Ok(outcome) => {
                    if let Some(new_path) = outcome.moved_to() {
                        let now_archived = paths::is_under_root(new_path, &root);
                        if now_archived && !was_archived {
                            archived_count += 1;
                        } else if was_archived && !now_archived {
                            unarchived_count += 1;
                        }
                    }
                    match outcome {
                        TransitionOutcome::WouldArchive(_) => would_archive_count += 1,
                        TransitionOutcome::WouldUnarchive(_) => would_unarchive_count += 1,
                        _ => {}
                    }
                }
                Err(e) => {
                    tracing::warn!(path = %path, error = %e, "Scan: document failed");
                    errors.push(e.to_string());
                }
            }
        }

        let summary = ScanSummary {
            archived_count,
            unarchived_count,
            would_archive_count,
            would_unarchive_count,
            errors,
            started_at,
            finished_at: Utc::now(),
        };
        tracing::info!(
            archived = summary.archived_count,
            unarchived = summary.unarchived_count,
            errors = summary.errors.len(),
            "Scan complete"
        );
        summary
    }
}

fn is_document(path: &str) -> bool {
    let (_, name) = paths::split_dir_and_name(path);
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext.eq_ignore_ascii_case(DOCUMENT_EXTENSION),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::{json, Map, Value};

    fn fields(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn engine_with(config: ArchiveConfig) -> ArchiveEngine<MemoryStore> {
        ArchiveEngine::new(MemoryStore::new(), &config)
    }

    fn default_engine() -> ArchiveEngine<MemoryStore> {
        engine_with(ArchiveConfig::default())
    }

    #[test]
    fn test_archives_matching_document() {
        let engine = default_engine();
        engine.store().add_document(
            "Task/TASK-1234.md",
            fields(&[("archived", json!(true))]),
            Vec::new(),
        );

        let outcome = engine.process_document("Task/TASK-1234.md").unwrap();
        assert_eq!(
            outcome,
            TransitionOutcome::Archived("Archive/Task/TASK-1234.md".to_string())
        );
        assert!(engine.store().exists("Archive/Task/TASK-1234.md"));
        assert!(!engine.store().exists("Task/TASK-1234.md"));
    }

    #[test]
    fn test_unarchives_when_rules_clear() {
        let engine = default_engine();
        engine
            .store()
            .add_document("Archive/Task/TASK-1234.md", Map::new(), Vec::new());

        let outcome = engine.process_document("Archive/Task/TASK-1234.md").unwrap();
        assert_eq!(
            outcome,
            TransitionOutcome::Unarchived("Task/TASK-1234.md".to_string())
        );
        assert!(engine.store().exists("Task/TASK-1234.md"));
    }

    #[test]
    fn test_unarchive_disabled_leaves_document() {
        let engine = engine_with(ArchiveConfig {
            unarchive_on_clear: false,
            ..Default::default()
        });
        engine
            .store()
            .add_document("Archive/Task/TASK-1.md", Map::new(), Vec::new());

        let outcome = engine.process_document("Archive/Task/TASK-1.md").unwrap();
        assert_eq!(outcome, TransitionOutcome::NoAction);
    }

    #[test]
    fn test_dry_run_previews_without_moving() {
        let engine = engine_with(ArchiveConfig {
            dry_run: true,
            ..Default::default()
        });
        engine.store().add_document(
            "Task/TASK-1234.md",
            fields(&[("archived", json!(true))]),
            Vec::new(),
        );

        let outcome = engine.process_document("Task/TASK-1234.md").unwrap();
        assert_eq!(
            outcome,
            TransitionOutcome::WouldArchive("Archive/Task/TASK-1234.md".to_string())
        );
        // No store mutation.
        assert!(engine.store().exists("Task/TASK-1234.md"));
        assert!(!engine.store().exists("Archive/Task/TASK-1234.md"));
    }

    #[test]
    fn test_idempotence_second_pass_is_noop() {
        let engine = default_engine();
        engine.store().add_document(
            "Task/TASK-1.md",
            fields(&[("archived", json!(true))]),
            Vec::new(),
        );

        let first = engine.process_document("Task/TASK-1.md").unwrap();
        let moved_to = first.moved_to().unwrap().to_string();
        // Same document, unchanged metadata, re-delivered event.
        let second = engine.process_document(&moved_to).unwrap();
        assert_eq!(second, TransitionOutcome::NoAction);
    }

    #[test]
    fn test_excluded_prefix_wins_over_rules() {
        let engine = engine_with(ArchiveConfig {
            excluded_roots: vec!["Templates".to_string()],
            ..Default::default()
        });
        engine.store().add_document(
            "Templates/TASK.md",
            fields(&[("archived", json!(true))]),
            Vec::new(),
        );

        let outcome = engine.process_document("Templates/TASK.md").unwrap();
        assert_eq!(outcome, TransitionOutcome::NoAction);
        assert!(engine.store().exists("Templates/TASK.md"));
    }

    #[test]
    fn test_non_markdown_is_skipped() {
        let engine = default_engine();
        engine.store().add_document(
            "Task/data.csv",
            fields(&[("archived", json!(true))]),
            Vec::new(),
        );

        let outcome = engine.process_document("Task/data.csv").unwrap();
        assert_eq!(outcome, TransitionOutcome::NoAction);
    }

    #[test]
    fn test_document_exactly_at_root_is_left_alone() {
        // Pathological config where the root itself names a document:
        // there is no trailing subpath to restore, so nothing moves.
        let engine = engine_with(ArchiveConfig {
            archive_root: "Archive.md".to_string(),
            ..Default::default()
        });
        engine.store().add_document("Archive.md", Map::new(), Vec::new());

        let outcome = engine.process_document("Archive.md").unwrap();
        assert_eq!(outcome, TransitionOutcome::NoAction);
        assert!(engine.store().exists("Archive.md"));
    }

    #[test]
    fn test_collision_appends_suffix() {
        let engine = default_engine();
        engine.store().add_document(
            "Task/TASK-1.md",
            fields(&[("archived", json!(true))]),
            Vec::new(),
        );
        // Destination and its first suffix are both taken.
        engine
            .store()
            .add_document("Archive/Task/TASK-1.md", fields(&[("archived", json!(true))]), Vec::new());
        engine.store().add_document(
            "Archive/Task/TASK-1 (1).md",
            fields(&[("archived", json!(true))]),
            Vec::new(),
        );

        let outcome = engine.process_document("Task/TASK-1.md").unwrap();
        assert_eq!(
            outcome,
            TransitionOutcome::Archived("Archive/Task/TASK-1 (2).md".to_string())
        );
    }

    #[test]
    fn test_tag_triggered_archive() {
        let engine = default_engine();
        engine.store().add_document(
            "Task/TASK-1.md",
            Map::new(),
            vec!["#Archived".to_string()],
        );

        let outcome = engine.process_document("Task/TASK-1.md").unwrap();
        assert_eq!(
            outcome,
            TransitionOutcome::Archived("Archive/Task/TASK-1.md".to_string())
        );
    }

    #[test]
    fn test_missing_document_surfaces_error() {
        let engine = default_engine();
        let err = engine.process_document("Task/gone.md").unwrap_err();
        assert!(matches!(err.source, StoreError::NotFound(_)));
    }

    #[test]
    fn test_update_config_takes_effect() {
        let engine = default_engine();
        engine.store().add_document(
            "Task/TASK-1.md",
            fields(&[("completed", json!(true))]),
            Vec::new(),
        );

        assert_eq!(
            engine.process_document("Task/TASK-1.md").unwrap(),
            TransitionOutcome::NoAction
        );

        engine.update_config(&ArchiveConfig {
            trigger_fields: vec!["completed".to_string()],
            ..Default::default()
        });
        assert_eq!(
            engine.process_document("Task/TASK-1.md").unwrap(),
            TransitionOutcome::Archived("Archive/Task/TASK-1.md".to_string())
        );
    }

    #[test]
    fn test_scan_all_tallies_both_directions() {
        let engine = default_engine();
        engine.store().add_document(
            "Task/in.md",
            fields(&[("archived", json!(true))]),
            Vec::new(),
        );
        engine.store().add_document(
            "Task/stays.md",
            fields(&[("archived", json!(false))]),
            Vec::new(),
        );
        engine
            .store()
            .add_document("Archive/Task/out.md", Map::new(), Vec::new());

        let summary = engine.scan_all();
        assert_eq!(summary.archived_count, 1);
        assert_eq!(summary.unarchived_count, 1);
        assert!(summary.success());
        assert!(engine.store().exists("Archive/Task/in.md"));
        assert!(engine.store().exists("Task/out.md"));
    }

    #[test]
    fn test_scan_all_dry_run_counts_previews() {
        let engine = engine_with(ArchiveConfig {
            dry_run: true,
            ..Default::default()
        });
        engine.store().add_document(
            "Task/in.md",
            fields(&[("archived", json!(true))]),
            Vec::new(),
        );
        engine
            .store()
            .add_document("Archive/Task/out.md", Map::new(), Vec::new());

        let summary = engine.scan_all();
        assert_eq!(summary.archived_count, 0);
        assert_eq!(summary.unarchived_count, 0);
        assert_eq!(summary.would_archive_count, 1);
        assert_eq!(summary.would_unarchive_count, 1);
    }

    #[test]
    fn test_scan_is_idempotent() {
        let engine = default_engine();
        engine.store().add_document(
            "Task/TASK-1.md",
            fields(&[("archived", json!(true))]),
            Vec::new(),
        );

        let first = engine.scan_all();
        assert_eq!(first.archived_count, 1);

        let second = engine.scan_all();
        assert_eq!(second.archived_count, 0);
        assert_eq!(second.unarchived_count, 0);
        assert!(second.success());
    }
}
