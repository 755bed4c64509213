//! Archiver configuration: the persisted rule record and its compiled form.
//!
//! `ArchiveConfig` is the flat record the host edits and persists.
//! `RuleSet` is the case-folded, normalized form every classification and
//! resolution call reads. Compilation happens once per config swap, not
//! per document.

use crate::paths;
use crate::rules::normalize_tag;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;

/// Config filename inside the app config directory
const CONFIG_FILENAME: &str = "config.json";

/// Fallback archive root when the configured one normalizes to empty
const DEFAULT_ARCHIVE_ROOT: &str = "Archive";

/// User-facing archiver configuration.
///
/// Field and tag matching is case-insensitive; values are stored as the
/// user typed them and folded at compile time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ArchiveConfig {
    /// Metadata field names whose truthy value triggers archiving
    pub trigger_fields: Vec<String>,

    /// Extra strings treated as truthy beyond `true` and `1`
    pub extra_truthy: Vec<String>,

    /// Tag names (without the leading `#`) that trigger archiving
    pub trigger_tags: Vec<String>,

    /// Store-relative root the archive mirror lives under
    pub archive_root: String,

    /// Store-relative prefixes the archiver never touches
    pub excluded_roots: Vec<String>,

    /// Move documents back out of the archive when no rule matches
    pub unarchive_on_clear: bool,

    /// Report transitions without performing them
    pub dry_run: bool,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            trigger_fields: vec!["archived".to_string()],
            extra_truthy: Vec::new(),
            trigger_tags: vec!["archived".to_string()],
            archive_root: DEFAULT_ARCHIVE_ROOT.to_string(),
            excluded_roots: Vec::new(),
            unarchive_on_clear: true,
            dry_run: false,
        }
    }
}

impl ArchiveConfig {
    /// Compile into the normalized form the engine evaluates against.
    pub fn compile(&self) -> RuleSet {
        let archive_root = {
            let root = paths::normalize(&self.archive_root);
            if root.is_empty() {
                // Malformed config is normalized, not rejected.
                DEFAULT_ARCHIVE_ROOT.to_string()
            } else {
                root
            }
        };

        RuleSet {
            trigger_fields: self
                .trigger_fields
                .iter()
                .map(|f| f.trim().to_lowercase())
                .filter(|f| !f.is_empty())
                .collect(),
            extra_truthy: self
                .extra_truthy
                .iter()
                .map(|s| s.to_lowercase())
                .collect(),
            trigger_tags: self
                .trigger_tags
                .iter()
                .map(|t| normalize_tag(t))
                .filter(|t| !t.is_empty())
                .collect(),
            archive_root,
            excluded_roots: self
                .excluded_roots
                .iter()
                .map(|p| paths::normalize(p))
                .filter(|p| !p.is_empty())
                .collect(),
            unarchive_on_clear: self.unarchive_on_clear,
            dry_run: self.dry_run,
        }
    }
}

/// Compiled, read-only rule set.
///
/// Sets are lowercased (tags additionally `#`-stripped), the root and
/// exclusion prefixes normalized. One instance is shared per config
/// generation and swapped atomically by the engine.
#[derive(Debug, Clone)]
pub struct RuleSet {
    pub trigger_fields: HashSet<String>,
    pub extra_truthy: HashSet<String>,
    pub trigger_tags: HashSet<String>,
    pub archive_root: String,
    pub excluded_roots: Vec<String>,
    pub unarchive_on_clear: bool,
    pub dry_run: bool,
}

/// JSON-file persistence for `ArchiveConfig`.
///
/// The file lives at `{config_dir}/archivist/config.json`. A missing file
/// loads as defaults; a malformed one is an error the caller surfaces.
pub struct ConfigStore {
    base_dir: PathBuf,
}

impl ConfigStore {
    /// Store rooted at the platform config directory
    pub fn new() -> Result<Self, String> {
        let base_dir = dirs::config_dir()
            .ok_or("Could not determine config directory")?
            .join("archivist");
        Ok(Self { base_dir })
    }

    /// Store rooted at an explicit directory (tests, --config overrides)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    fn config_path(&self) -> PathBuf {
        self.base_dir.join(CONFIG_FILENAME)
    }

    /// Load the persisted config, falling back to defaults when absent.
    pub fn load(&self) -> Result<ArchiveConfig, String> {
        let path = self.config_path();
        if !path.exists() {
            return Ok(ArchiveConfig::default());
        }

        let file = File::open(&path)
            .map_err(|e| format!("Failed to open config {}: {}", path.display(), e))?;
        serde_json::from_reader(BufReader::new(file))
            .map_err(|e| format!("Failed to parse config {}: {}", path.display(), e))
    }

    /// Persist the config as pretty JSON, creating the directory if needed.
    pub fn save(&self, config: &ArchiveConfig) -> Result<(), String> {
        fs::create_dir_all(&self.base_dir)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;

        let path = self.config_path();
        let file = File::create(&path)
            .map_err(|e| format!("Failed to write config {}: {}", path.display(), e))?;
        serde_json::to_writer_pretty(BufWriter::new(file), config)
            .map_err(|e| format!("Failed to serialize config: {}", e))
    }
}
