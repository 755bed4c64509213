//! In-memory document store.
//!
//! Holds documents and directories in plain maps so transitions can be
//! exercised, or previewed, without touching a real filesystem. The
//! engine tests run against this store.

use super::{DocumentMetadata, DocumentStore, StoreError};
use crate::paths;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

#[derive(Default)]
struct MemoryInner {
    docs: HashMap<String, DocumentMetadata>,
    dirs: HashSet<String>,
}

/// Map-backed store; interior mutability so it can be shared like the
/// filesystem-backed one.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a document, registering its parent directories.
    pub fn add_document(
        &self,
        path: &str,
        fields: Map<String, Value>,
        tags: Vec<String>,
    ) {
        let path = paths::normalize(path);
        let mut inner = self.lock();
        register_ancestors(&mut inner.dirs, &path);
        inner.docs.insert(path, DocumentMetadata { fields, tags });
    }

    /// Replace a document's metadata in place.
    pub fn set_metadata(&self, path: &str, fields: Map<String, Value>, tags: Vec<String>) {
        let path = paths::normalize(path);
        self.lock().docs.insert(path, DocumentMetadata { fields, tags });
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn register_ancestors(dirs: &mut HashSet<String>, path: &str) {
    let (mut dir, _) = paths::split_dir_and_name(path);
    while !dir.is_empty() {
        dirs.insert(dir.clone());
        dir = paths::split_dir_and_name(&dir).0;
    }
}

impl DocumentStore for MemoryStore {
    fn list_documents(&self) -> Vec<String> {
        let mut list: Vec<String> = self.lock().docs.keys().cloned().collect();
        list.sort();
        list
    }

    fn metadata(&self, path: &str) -> Result<DocumentMetadata, StoreError> {
        let path = paths::normalize(path);
        self.lock()
            .docs
            .get(&path)
            .cloned()
            .ok_or(StoreError::NotFound(path))
    }

    fn exists(&self, path: &str) -> bool {
        let path = paths::normalize(path);
        let inner = self.lock();
        inner.docs.contains_key(&path) || inner.dirs.contains(&path)
    }

    fn create_dir_all(&self, dir: &str) -> Result<(), StoreError> {
        let dir = paths::normalize(dir);
        if dir.is_empty() {
            return Ok(());
        }
        let mut inner = self.lock();
        if inner.dirs.contains(&dir) {
            return Err(StoreError::AlreadyExists(dir));
        }
        let mut current = dir;
        while !current.is_empty() {
            inner.dirs.insert(current.clone());
            current = paths::split_dir_and_name(&current).0;
        }
        Ok(())
    }

    fn rename(&self, from: &str, to: &str) -> Result<(), StoreError> {
        let from = paths::normalize(from);
        let to = paths::normalize(to);
        let mut inner = self.lock();
        if inner.docs.contains_key(&to) || inner.dirs.contains(&to) {
            return Err(StoreError::AlreadyExists(to));
        }
        let metadata = inner
            .docs
            .remove(&from)
            .ok_or(StoreError::NotFound(from))?;
        register_ancestors(&mut inner.dirs, &to);
        inner.docs.insert(to, metadata);
        Ok(())
    }
}
