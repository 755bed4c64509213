//! Archive transitions: target resolution, collision handling, and the
//! engine that performs (or previews) moves across the archive root.

mod collision;
mod engine;
mod target;

pub use collision::resolve_collision;
pub use engine::{ArchiveEngine, EngineError, ScanSummary, TransitionOutcome};
pub use target::{resolve_archive_target, resolve_unarchive_target, Direction, TargetDecision};
