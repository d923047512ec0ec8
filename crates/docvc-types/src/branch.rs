//! Branch pointers and the merge log they carry.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::ids::{BranchId, MergeId, VersionId};
use crate::path::ValuePath;
use crate::temporal::TemporalAnchor;
use crate::value::Value;

/// Lifecycle state of a branch. Branches are never deleted, only archived.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BranchStatus {
    #[default]
    Active,
    /// Merged into another branch at least once. Still writable.
    Merged,
    /// Read-only.
    Archived,
    /// Accepts only merge and rollback writes.
    Protected,
}

impl fmt::Display for BranchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BranchStatus::Active => "active",
            BranchStatus::Merged => "merged",
            BranchStatus::Archived => "archived",
            BranchStatus::Protected => "protected",
        };
        f.write_str(s)
    }
}

/// Write restrictions on a branch.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchProtection {
    /// Only merges and rollbacks may advance the head.
    pub prevent_direct_push: bool,
    /// Informational; review happens outside the engine.
    pub require_review: bool,
    /// When non-empty, only these authors may write to the branch.
    #[serde(default)]
    pub restricted_users: Vec<String>,
}

impl BranchProtection {
    pub fn is_unrestricted(&self) -> bool {
        !self.prevent_direct_push && self.restricted_users.is_empty()
    }
}

/// A named, mutable pointer to the latest version of a line of work.
///
/// `head_version_id` always references an existing version. Apart from a
/// freshly created branch, whose head is its base version, the head version
/// belongs to this branch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub id: BranchId,
    /// Unique per document.
    pub name: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub document_id: String,
    pub project_id: String,
    /// Branch the base version lives on; `None` for a root branch.
    pub base_branch: Option<String>,
    pub base_version_id: Option<VersionId>,
    pub head_version_id: VersionId,
    pub author: String,
    pub created_at: TemporalAnchor,
    pub last_activity: TemporalAnchor,
    pub status: BranchStatus,
    #[serde(default)]
    pub merge_history: Vec<MergeRecord>,
    #[serde(default)]
    pub protection: BranchProtection,
}

impl Branch {
    pub fn is_root(&self) -> bool {
        self.base_version_id.is_none()
    }
}

/// How a merge combines two branch heads.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategy {
    /// Adopt the source content wholesale.
    FastForward,
    /// Overlay the source's changes onto the target.
    #[default]
    ThreeWay,
    /// Like three-way, with conflicts settled by caller-supplied resolutions.
    Manual,
}

impl fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MergeStrategy::FastForward => "fast_forward",
            MergeStrategy::ThreeWay => "three_way",
            MergeStrategy::Manual => "manual",
        };
        f.write_str(s)
    }
}

impl FromStr for MergeStrategy {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.replace('-', "_").as_str() {
            "fast_forward" => Ok(MergeStrategy::FastForward),
            "three_way" => Ok(MergeStrategy::ThreeWay),
            "manual" => Ok(MergeStrategy::Manual),
            _ => Err(TypeError::InvalidId(format!("unknown merge strategy: {s}"))),
        }
    }
}

/// Which side wins a conflicting path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionChoice {
    Source,
    Target,
    /// The caller supplies `resolved_value`.
    Manual,
    /// Keep both values.
    Both,
}

impl FromStr for ResolutionChoice {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "source" => Ok(ResolutionChoice::Source),
            "target" => Ok(ResolutionChoice::Target),
            "manual" => Ok(ResolutionChoice::Manual),
            "both" => Ok(ResolutionChoice::Both),
            _ => Err(TypeError::InvalidId(format!("unknown resolution: {s}"))),
        }
    }
}

/// One path-level conflict and, once settled, how it was settled.
///
/// `None` for a side means the path is absent on that side.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictResolution {
    pub path: ValuePath,
    pub source_value: Option<Value>,
    pub target_value: Option<Value>,
    pub resolved_value: Option<Value>,
    pub resolved_by: Option<String>,
    pub resolution: ResolutionChoice,
}

impl ConflictResolution {
    /// A conflict awaiting a decision.
    pub fn unresolved(
        path: ValuePath,
        source_value: Option<Value>,
        target_value: Option<Value>,
    ) -> Self {
        Self {
            path,
            source_value,
            target_value,
            resolved_value: None,
            resolved_by: None,
            resolution: ResolutionChoice::Manual,
        }
    }

    /// A caller decision for `path`, used when resubmitting a manual merge.
    pub fn decide(path: ValuePath, resolution: ResolutionChoice) -> Self {
        Self {
            path,
            source_value: None,
            target_value: None,
            resolved_value: None,
            resolved_by: None,
            resolution,
        }
    }

    /// A caller decision that sets `path` to an explicit value.
    pub fn manual(path: ValuePath, value: Value) -> Self {
        Self {
            resolved_value: Some(value),
            ..Self::decide(path, ResolutionChoice::Manual)
        }
    }
}

/// Immutable log entry of a completed merge.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeRecord {
    pub id: MergeId,
    pub source_branch: String,
    pub target_branch: String,
    pub source_version_id: VersionId,
    pub target_version_id: VersionId,
    pub result_version_id: VersionId,
    pub merged_by: String,
    pub timestamp: TemporalAnchor,
    pub strategy: MergeStrategy,
    pub conflicts: Vec<ConflictResolution>,
    pub commit_message: String,
}
