//! Version graph for docvc.
//!
//! [`VersionGraph`] turns edited document content into immutable
//! [`DocumentVersion`](docvc_types::DocumentVersion)s: it diffs against the
//! branch head, hashes the content, numbers the version per branch,
//! persists it, and advances the branch head with a compare-and-swap.
//!
//! # Key Types
//!
//! - [`VersionGraph`] / [`GraphConfig`] -- Version creation, reads, branches
//! - [`CreateVersionOptions`] / [`NewBranch`] -- Write arguments
//! - [`HistorySubscription`] -- Push-style history snapshots
//! - [`VersionComparison`] -- Change set, counts, and text hunks between two versions

pub mod ancestry;
pub mod compare;
pub mod error;
pub mod graph;
pub mod names;
pub mod options;
pub mod subscription;
pub mod visibility;

pub use compare::{FieldTextDiff, VersionComparison};
pub use error::{VersionError, VersionResult};
pub use graph::{GraphConfig, VersionGraph};
pub use names::validate_branch_name;
pub use options::{CreateVersionOptions, NewBranch, WriteOrigin};
pub use subscription::HistorySubscription;
pub use visibility::visible_versions;

#[cfg(test)]
pub(crate) mod testing;
