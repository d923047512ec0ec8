//! Deletion of versions outside the retention window.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use docvc_graph::{VersionGraph, VersionResult};
use docvc_store::VersionQuery;
use docvc_types::VersionId;

use crate::policy::RetentionPolicy;

/// What a cleanup pass examined, kept, and deleted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RetentionReport {
    pub document_id: String,
    pub examined: usize,
    /// Versions older than the keep window.
    pub candidates: usize,
    pub kept_recent: usize,
    pub kept_protected: usize,
    /// Kept because a branch head, branch base, or restore point points at it.
    pub kept_referenced: usize,
    pub deleted: Vec<VersionId>,
}

impl RetentionReport {
    pub fn deleted_count(&self) -> usize {
        self.deleted.len()
    }
}

/// Deletes old versions of a document under a [`RetentionPolicy`].
///
/// A version is deleted only if it is older than `keep_days`, is not among
/// the `keep_count` newest such versions, carries no protected tag (`final`
/// and `approved` are always protected), and is not referenced by a branch
/// head, a branch base, or a restore point.
#[derive(Clone)]
pub struct RetentionCleaner {
    graph: Arc<VersionGraph>,
    policy: RetentionPolicy,
}

impl RetentionCleaner {
    pub fn new(graph: Arc<VersionGraph>, policy: RetentionPolicy) -> Self {
        Self { graph, policy }
    }

    pub fn policy(&self) -> &RetentionPolicy {
        &self.policy
    }

    /// Clean up with the configured policy.
    pub async fn cleanup(&self, document_id: &str) -> VersionResult<RetentionReport> {
        self.cleanup_with_report(document_id, &self.policy).await
    }

    /// Clean up with the given window and the protected tags of the
    /// configured policy.
    /// Returns the number of versions deleted.
    pub async fn cleanup_old_versions(
        &self,
        document_id: &str,
        keep_count: usize,
        keep_days: u64,
    ) -> VersionResult<usize> {
        let policy = self.policy.clone().with_window(keep_count, keep_days);
        let report = self.cleanup_with_report(document_id, &policy).await?;
        Ok(report.deleted_count())
    }

    pub async fn cleanup_with_report(
        &self,
        document_id: &str,
        policy: &RetentionPolicy,
    ) -> VersionResult<RetentionReport> {
        let store = self.graph.store();
        let versions = store.query_versions(&VersionQuery::document(document_id)).await?;
        let referenced = self.referenced(document_id).await?;

        let now = self.graph.now();
        let max_age = policy.max_age();
        let candidates: Vec<_> = versions
            .iter()
            .filter(|v| v.timestamp.age_at(&now) > max_age)
            .collect();

        let mut report = RetentionReport {
            document_id: document_id.to_string(),
            examined: versions.len(),
            candidates: candidates.len(),
            kept_recent: candidates.len().min(policy.keep_count),
            ..RetentionReport::default()
        };

        // Query results are newest first.
        for version in candidates.into_iter().skip(policy.keep_count) {
            if policy.is_protected(version) {
                report.kept_protected += 1;
            } else if referenced.contains(&version.id) {
                report.kept_referenced += 1;
            } else if store.delete_version(&version.id).await? {
                debug!(
                    document = document_id,
                    version = %version.id,
                    number = %version.version_number,
                    "version deleted"
                );
                report.deleted.push(version.id.clone());
            }
        }

        info!(
            document = document_id,
            examined = report.examined,
            candidates = report.candidates,
            deleted = report.deleted.len(),
            kept_protected = report.kept_protected,
            kept_referenced = report.kept_referenced,
            "retention cleanup finished"
        );
        Ok(report)
    }

    async fn referenced(&self, document_id: &str) -> VersionResult<HashSet<VersionId>> {
        let store = self.graph.store();
        let mut ids = HashSet::new();
        for branch in store.list_branches(document_id).await? {
            ids.insert(branch.head_version_id);
            ids.extend(branch.base_version_id);
        }
        for point in store.list_restore_points(document_id).await? {
            ids.insert(point.version_id);
        }
        Ok(ids)
    }
}
