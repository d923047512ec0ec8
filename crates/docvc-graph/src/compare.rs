//! Side-by-side comparison of two versions.

use serde::Serialize;

use docvc_diff::{diff, diff_text, ChangeStats, TextDiff};
use docvc_types::{ChangeKind, ValuePath, VersionChange, VersionId, VersionNumber};

use crate::error::VersionResult;
use crate::graph::VersionGraph;

/// Line diff of one string field that changed between two versions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldTextDiff {
    pub path: ValuePath,
    pub diff: TextDiff,
}

/// The difference between two versions of a document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VersionComparison {
    pub from_id: VersionId,
    pub to_id: VersionId,
    pub from_number: VersionNumber,
    pub to_number: VersionNumber,
    /// Content hashes are equal.
    pub identical: bool,
    pub changes: Vec<VersionChange>,
    pub creates: usize,
    pub updates: usize,
    pub deletes: usize,
    pub moves: usize,
    pub renames: usize,
    /// Line hunks for every string field updated in place.
    pub text_diffs: Vec<FieldTextDiff>,
}

impl VersionComparison {
    pub fn total_changes(&self) -> usize {
        self.changes.len()
    }
}

impl VersionGraph {
    /// Compare two versions, `from` being the older side.
    pub async fn compare_versions(
        &self,
        from: &VersionId,
        to: &VersionId,
    ) -> VersionResult<VersionComparison> {
        let old = self.get_version(from).await?;
        let new = self.get_version(to).await?;

        let changes = diff(&old.content, &new.content);
        let stats = ChangeStats::from_changes(&changes);
        let text_diffs = changes
            .iter()
            .filter(|c| c.kind == ChangeKind::Update)
            .filter_map(|c| {
                let old_text = c.old_value.as_ref()?.as_str()?;
                let new_text = c.new_value.as_ref()?.as_str()?;
                Some(FieldTextDiff {
                    path: c.path.clone(),
                    diff: diff_text(old_text, new_text),
                })
            })
            .collect();

        Ok(VersionComparison {
            from_id: old.id,
            to_id: new.id,
            from_number: old.version_number,
            to_number: new.version_number,
            identical: old.content_hash == new.content_hash,
            changes,
            creates: stats.creates,
            updates: stats.updates,
            deletes: stats.deletes,
            moves: stats.moves,
            renames: stats.renames,
            text_diffs,
        })
    }
}
