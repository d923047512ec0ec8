//! High-level SDK for docvc.
//!
//! [`DocumentVersioning`] wires the version graph, merge engine, restore
//! point manager, and retention cleaner over one [`VersionStore`] and
//! exposes the whole public operation surface. This is the main entry
//! point for applications embedding docvc.

pub mod config;
pub mod error;
pub mod versioning;

pub use config::EngineConfig;
pub use error::{SdkError, SdkResult};
pub use versioning::DocumentVersioning;

// Re-export key types
pub use docvc_diff::{DiffHunk, DiffLine, TextDiff};
pub use docvc_graph::{
    CreateVersionOptions, FieldTextDiff, HistorySubscription, NewBranch, VersionComparison,
    VersionError,
};
pub use docvc_merge::{MergeOutcome, MergeRequest};
pub use docvc_restore::NewRestorePoint;
pub use docvc_retention::{RetentionPolicy, RetentionReport};
pub use docvc_store::{InMemoryVersionStore, StoreSnapshot, VersionStore};
pub use docvc_types::{
    Branch, BranchProtection, BranchStatus, ChangeKind, Clock, ConflictResolution,
    DocumentVersion, HybridLogicalClock, ManualClock, MergeStrategy, ResolutionChoice,
    RestorePoint, Value, ValuePath, VersionId,
};
