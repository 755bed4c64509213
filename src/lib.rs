//! Rule-driven document archiver.
//!
//! Documents are classified from their metadata fields and tags; a
//! match moves them under the archive root with their folder structure
//! mirrored, and a cleared match moves them back. The engine is pure
//! orchestration over a narrow store trait, so it runs the same against
//! a real vault directory or the in-memory store.

pub mod archive;
pub mod config;
pub mod paths;
pub mod rules;
pub mod store;
pub mod watch;

pub use archive::{ArchiveEngine, EngineError, ScanSummary, TransitionOutcome};
pub use config::{ArchiveConfig, ConfigStore, RuleSet};
pub use rules::DocumentSnapshot;
pub use store::{DocumentStore, MemoryStore, StoreError, VaultStore};
