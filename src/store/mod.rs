//! Document store abstraction.
//!
//! The engine consumes a narrow capability surface: enumerate documents,
//! read parsed metadata, probe existence, create directories, and move
//! atomically. `MemoryStore` backs tests and previews; `VaultStore` is
//! the real directory-tree implementation.

mod memory;
mod vault;

pub use memory::MemoryStore;
pub use vault::VaultStore;

use serde_json::{Map, Value};
use thiserror::Error;

/// Failure reported by a document store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document not found: {0}")]
    NotFound(String),

    /// Creation or move target already present. For directory creation
    /// the caller treats this as success.
    #[error("destination already exists: {0}")]
    AlreadyExists(String),

    #[error("failed to read metadata for {path}: {message}")]
    Metadata { path: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Parsed metadata for one document, as handed over by the store.
///
/// `fields` is the raw frontmatter mapping; `tags` are inline tags as
/// found in the body, not yet normalized.
#[derive(Debug, Clone, Default)]
pub struct DocumentMetadata {
    pub fields: Map<String, Value>,
    pub tags: Vec<String>,
}

/// Capability surface the archive engine depends on.
///
/// All paths are store-relative strings with `/` separators. Moves are
/// atomic: they either complete or fail, never half-apply.
pub trait DocumentStore {
    /// Enumerate every document path in the store. Finite, restartable.
    fn list_documents(&self) -> Vec<String>;

    /// Parsed metadata for the document at `path`.
    fn metadata(&self, path: &str) -> Result<DocumentMetadata, StoreError>;

    /// Whether anything (document or directory) exists at `path`.
    fn exists(&self, path: &str) -> bool;

    /// Create `dir` and any missing intermediate segments.
    fn create_dir_all(&self, dir: &str) -> Result<(), StoreError>;

    /// Atomically move a document. Fails with `AlreadyExists` rather
    /// than overwriting.
    fn rename(&self, from: &str, to: &str) -> Result<(), StoreError>;
}
