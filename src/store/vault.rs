//! Filesystem-backed document store.
//!
//! A vault is a directory tree of markdown files. Frontmatter is parsed
//! as YAML into the raw field mapping; inline `#tags` are collected from
//! the body. All paths exposed upward are vault-relative with `/`
//! separators regardless of platform.

use super::{DocumentMetadata, DocumentStore, StoreError};
use crate::paths;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Frontmatter fence line
const FRONTMATTER_FENCE: &str = "---";

/// Inline tags: `#` followed by a word, optionally nested with `/`
static INLINE_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#([A-Za-z][A-Za-z0-9_/-]*)").expect("valid regex"));

/// Store rooted at a real directory.
#[derive(Debug, Clone)]
pub struct VaultStore {
    root: PathBuf,
}

impl VaultStore {
    /// Open a vault at `root`. The directory must already exist.
    pub fn new(root: PathBuf) -> Result<Self, String> {
        if !root.is_dir() {
            return Err(format!("Vault root is not a directory: {}", root.display()));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute filesystem path for a vault-relative one.
    fn absolute(&self, rel: &str) -> PathBuf {
        let mut abs = self.root.clone();
        for segment in paths::normalize(rel).split('/') {
            if !segment.is_empty() {
                abs.push(segment);
            }
        }
        abs
    }

    /// Vault-relative `/`-separated path for an absolute one, or `None`
    /// when the path lies outside the vault.
    pub fn relative_path(&self, abs: &Path) -> Option<String> {
        let rel = abs.strip_prefix(&self.root).ok()?;
        let segments: Vec<String> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().to_string())
            .collect();
        if segments.is_empty() {
            return None;
        }
        Some(segments.join("/"))
    }
}

/// Split a document into its frontmatter block and body.
///
/// Frontmatter is the YAML between a `---` first line and the next
/// fence line; documents without one parse as an empty mapping.
fn split_frontmatter(content: &str) -> (Option<&str>, &str) {
    let mut lines = content.split_inclusive('\n');
    let Some(first) = lines.next() else {
        return (None, content);
    };
    if first.trim_end() != FRONTMATTER_FENCE {
        return (None, content);
    }

    let after_open = first.len();
    let mut offset = after_open;
    for line in lines {
        let trimmed = line.trim_end();
        if trimmed == FRONTMATTER_FENCE || trimmed == "..." {
            let block = &content[after_open..offset];
            let body = &content[offset + line.len()..];
            return (Some(block), body);
        }
        offset += line.len();
    }

    // Unterminated fence: treat the whole document as body.
    (None, content)
}

fn parse_fields(path: &str, block: &str) -> Result<serde_json::Map<String, Value>, StoreError> {
    let yaml: serde_yaml::Value =
        serde_yaml::from_str(block).map_err(|e| StoreError::Metadata {
            path: path.to_string(),
            message: format!("invalid frontmatter: {}", e),
        })?;
    let json = serde_json::to_value(yaml).map_err(|e| StoreError::Metadata {
        path: path.to_string(),
        message: format!("unsupported frontmatter shape: {}", e),
    })?;
    match json {
        Value::Object(map) => Ok(map),
        // Scalar or list frontmatter carries no usable fields.
        _ => Ok(serde_json::Map::new()),
    }
}

fn inline_tags(body: &str) -> Vec<String> {
    INLINE_TAG
        .captures_iter(body)
        .map(|c| c[1].to_string())
        .collect()
}

impl DocumentStore for VaultStore {
    fn list_documents(&self) -> Vec<String> {
        let mut docs = Vec::new();
        for entry in WalkDir::new(&self.root).into_iter().filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            let is_markdown = entry
                .path()
                .extension()
                .map(|e| e.eq_ignore_ascii_case("md"))
                .unwrap_or(false);
            if !is_markdown {
                continue;
            }
            if let Some(rel) = self.relative_path(entry.path()) {
                docs.push(rel);
            }
        }
        docs.sort();
        docs
    }

    fn metadata(&self, path: &str) -> Result<DocumentMetadata, StoreError> {
        let abs = self.absolute(path);
        if !abs.is_file() {
            return Err(StoreError::NotFound(path.to_string()));
        }
        let content = fs::read_to_string(&abs)?;

        let (block, body) = split_frontmatter(&content);
        let fields = match block {
            Some(block) => parse_fields(path, block)?,
            None => serde_json::Map::new(),
        };

        Ok(DocumentMetadata {
            fields,
            tags: inline_tags(body),
        })
    }

    fn exists(&self, path: &str) -> bool {
        self.absolute(path).exists()
    }

    fn create_dir_all(&self, dir: &str) -> Result<(), StoreError> {
        fs::create_dir_all(self.absolute(dir))?;
        Ok(())
    }

    fn rename(&self, from: &str, to: &str) -> Result<(), StoreError> {
        let source = self.absolute(from);
        let destination = self.absolute(to);
        if !source.exists() {
            return Err(StoreError::NotFound(from.to_string()));
        }
        if destination.exists() {
            return Err(StoreError::AlreadyExists(to.to_string()));
        }
        fs::rename(&source, &destination)?;
        Ok(())
    }
}
