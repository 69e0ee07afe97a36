//! Core of the patch classification service.
//!
//! The [`Engine`] owns the database handle and exposes the operations the
//! server and the admin tooling need: pair selection, verdict recording,
//! patch loading, member management and statistics.

pub use classifications::ClassificationRecord;
pub use error::EngineError;
pub use loader::{PatchFile, PatchScan, parse_patch_filename, scan_patch_dir};
pub use members::Member;
pub use ops::{
    Engine, EngineBuilder, LoadSummary, MemberReport, PairSelection, SelectionStrategy,
    StatisticsSummary, Submission,
};
pub use patches::{Patch, PatchId, PatchKind};
pub use statistics::{
    ErrorStats, Judgment, StatsReport, TimingStats, VersionStats, WeightedAggregate,
};

mod classifications;
mod error;
mod loader;
mod members;
mod ops;
mod patches;
pub mod statistics;

type ResultEngine<T> = Result<T, EngineError>;
