use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::change::VersionChange;
use crate::error::TypeError;
use crate::hash::ContentHash;
use crate::ids::VersionId;
use crate::temporal::TemporalAnchor;
use crate::value::Value;

/// Branch-scoped version number, displayed as `major.minor`.
///
/// The first version on a branch is `1.0`; each later version on the same
/// branch increments the minor component by one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionNumber {
    pub major: u32,
    pub minor: u32,
}

impl VersionNumber {
    pub fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// `1.0`.
    pub fn initial() -> Self {
        Self { major: 1, minor: 0 }
    }

    /// The same major with `minor + 1`.
    pub fn next_minor(&self) -> Self {
        Self {
            major: self.major,
            minor: self.minor + 1,
        }
    }
}

impl Default for VersionNumber {
    fn default() -> Self {
        Self::initial()
    }
}

impl fmt::Display for VersionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for VersionNumber {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TypeError::InvalidVersionNumber(s.to_string());
        let (major, minor) = s.split_once('.').ok_or_else(invalid)?;
        Ok(Self {
            major: major.parse().map_err(|_| invalid())?,
            minor: minor.parse().map_err(|_| invalid())?,
        })
    }
}

impl TryFrom<String> for VersionNumber {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<VersionNumber> for String {
    fn from(value: VersionNumber) -> Self {
        value.to_string()
    }
}

/// Bookkeeping attached to every version.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionMetadata {
    /// Size of the serialized content in bytes.
    pub size_bytes: u64,
    /// Number of changes from the parent (leaf count for a first version).
    pub change_count: usize,
    /// Whether this version was written as an explicit snapshot.
    pub is_snapshot: bool,
    /// What caused the write (`merge`, `rollback`, an editor event, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_event: Option<String>,
    /// For merge results: the source head that was merged in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merged_from: Option<VersionId>,
}

/// An immutable snapshot of a document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentVersion {
    pub id: VersionId,
    pub document_id: String,
    pub project_id: String,
    pub version_number: VersionNumber,
    pub branch_name: String,
    /// `None` only for the first version of a root branch.
    pub parent_version_id: Option<VersionId>,
    pub content: Value,
    pub content_hash: ContentHash,
    pub author: String,
    pub timestamp: TemporalAnchor,
    pub commit_message: String,
    pub tags: BTreeSet<String>,
    pub metadata: VersionMetadata,
    /// Ordered edits that turn the parent's content into `content`.
    pub changes: Vec<VersionChange>,
}

impl DocumentVersion {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}
