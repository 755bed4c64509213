//! Vault change watcher.
//!
//! Debounced filesystem events feed the archive engine one document at
//! a time. The debounce window doubles as the settle delay after an
//! edit, so metadata is re-read only once the writer has finished.
//! Delivery is at-least-once: duplicates are absorbed by the engine's
//! idempotent processing.

use crate::archive::ArchiveEngine;
use crate::store::VaultStore;
use notify::{EventKind, RecommendedWatcher, RecursiveMode};
use notify_debouncer_full::{new_debouncer, DebouncedEvent, Debouncer, RecommendedCache};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

/// Default settle delay before a changed document is re-evaluated
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(500);

/// Running watcher over one vault
#[allow(dead_code)]
struct VaultWatcher {
    debouncer: Debouncer<RecommendedWatcher, RecommendedCache>,
}

/// Watcher state behind the shared handle
#[derive(Default)]
pub struct WatcherState {
    watcher: Option<VaultWatcher>,
    pub enabled: bool,
}

/// Shared watcher handle
pub type WatcherHandle = Arc<Mutex<WatcherState>>;

/// Create a new watcher handle
pub fn create_watcher_handle() -> WatcherHandle {
    Arc::new(Mutex::new(WatcherState::default()))
}

/// Start watching the engine's vault root recursively.
///
/// Replaces any watcher already running on this handle.
pub fn start_watcher(
    handle: WatcherHandle,
    engine: Arc<ArchiveEngine<VaultStore>>,
    settle: Duration,
) -> Result<(), String> {
    let mut state = handle.lock().unwrap_or_else(|poisoned| {
        tracing::warn!("Watcher state mutex was poisoned, recovering");
        poisoned.into_inner()
    });

    let root = engine.store().root().to_path_buf();
    let engine_clone = Arc::clone(&engine);

    let mut debouncer = new_debouncer(
        settle,
        None,
        move |result: Result<Vec<DebouncedEvent>, Vec<notify::Error>>| match result {
            Ok(events) => {
                for event in events {
                    handle_file_event(&engine_clone, &event);
                }
            }
            Err(errors) => {
                for error in errors {
                    tracing::warn!(error = ?error, "Watcher error");
                }
            }
        },
    )
    .map_err(|e| format!("Failed to create watcher: {}", e))?;

    debouncer
        .watch(&root, RecursiveMode::Recursive)
        .map_err(|e| format!("Failed to watch {}: {}", root.display(), e))?;

    tracing::info!(root = %root.display(), "Watching vault");
    state.watcher = Some(VaultWatcher { debouncer });
    state.enabled = true;
    Ok(())
}

/// Stop the running watcher, if any.
pub fn stop_watcher(handle: WatcherHandle) -> Result<(), String> {
    let mut state = handle.lock().unwrap_or_else(|poisoned| {
        tracing::warn!("Watcher state mutex was poisoned, recovering");
        poisoned.into_inner()
    });
    state.watcher = None;
    state.enabled = false;
    Ok(())
}

/// Check if the watcher is running
pub fn is_watcher_running(handle: &WatcherHandle) -> bool {
    match handle.lock() {
        Ok(state) => state.enabled && state.watcher.is_some(),
        Err(poisoned) => {
            let state = poisoned.into_inner();
            state.enabled && state.watcher.is_some()
        }
    }
}

/// Dispatch one debounced event to the engine.
fn handle_file_event(engine: &Arc<ArchiveEngine<VaultStore>>, event: &DebouncedEvent) {
    let relevant = matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_));
    if !relevant {
        return;
    }

    let event_id = Uuid::new_v4();
    for path in &event.paths {
        if path.is_dir() || path.is_symlink() {
            continue;
        }
        let Some(rel) = engine.store().relative_path(path) else {
            continue;
        };

        tracing::debug!(event = %event_id, path = %rel, "Change event");
        match engine.process_document(&rel) {
            Ok(outcome) => {
                tracing::debug!(event = %event_id, path = %rel, outcome = ?outcome, "Processed");
            }
            Err(e) => {
                // The document may have been moved or deleted between the
                // event and this dispatch; log and move on.
                tracing::warn!(event = %event_id, error = %e, "Failed to process change");
            }
        }
    }
}
