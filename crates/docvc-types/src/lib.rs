//! Foundation types for docvc, the document version-control engine.
//!
//! Every other docvc crate depends on `docvc-types`. Nothing here performs
//! I/O: these are the values that flow between the hasher, the differ, the
//! store, and the version graph.
//!
//! # Key Types
//!
//! - [`Value`] -- Opaque structured document content (map / sequence / scalar)
//! - [`ValuePath`] -- Locator into a [`Value`] tree
//! - [`ContentHash`] -- BLAKE3 digest of canonicalized content
//! - [`TemporalAnchor`] -- Hybrid Logical Clock timestamp assigned at write time
//! - [`DocumentVersion`] / [`VersionChange`] -- Immutable snapshots and their change-sets
//! - [`Branch`] / [`MergeRecord`] / [`ConflictResolution`] -- Branch graph records
//! - [`RestorePoint`] -- Named bookmark to a version

pub mod branch;
pub mod change;
pub mod clock;
pub mod error;
pub mod hash;
pub mod ids;
pub mod path;
pub mod restore;
pub mod temporal;
pub mod value;
pub mod version;

pub use branch::{
    Branch, BranchProtection, BranchStatus, ConflictResolution, MergeRecord, MergeStrategy,
    ResolutionChoice,
};
pub use change::{ChangeKind, VersionChange};
pub use clock::{Clock, HybridLogicalClock, ManualClock};
pub use error::TypeError;
pub use hash::ContentHash;
pub use ids::{BranchId, MergeId, RestorePointId, VersionId};
pub use path::{PathSegment, ValuePath};
pub use restore::RestorePoint;
pub use temporal::TemporalAnchor;
pub use value::Value;
pub use version::{DocumentVersion, VersionMetadata, VersionNumber};
