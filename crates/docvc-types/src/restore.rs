use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ids::{RestorePointId, VersionId};
use crate::temporal::TemporalAnchor;
use crate::value::Value;

/// A named bookmark to a version, independent of the branch graph.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestorePoint {
    pub id: RestorePointId,
    pub name: String,
    pub description: String,
    pub document_id: String,
    pub version_id: VersionId,
    pub created_by: String,
    pub created_at: TemporalAnchor,
    /// Created by the engine rather than a user.
    pub is_automatic: bool,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
}
