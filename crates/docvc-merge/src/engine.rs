//! Branch merging.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use docvc_diff::{conflicting_paths, three_way_merge};
use docvc_graph::{CreateVersionOptions, VersionGraph, VersionResult, WriteOrigin};
use docvc_types::{
    BranchStatus, ConflictResolution, MergeId, MergeRecord, MergeStrategy, VersionId,
};

use crate::resolve::{conflict_report, settle};

/// A request to merge `source_branch` into `target_branch`.
#[derive(Clone, Debug)]
pub struct MergeRequest {
    pub document_id: String,
    pub source_branch: String,
    pub target_branch: String,
    pub merger: String,
    pub commit_message: Option<String>,
    pub strategy: MergeStrategy,
    /// Decisions for conflicting paths, used by [`MergeStrategy::Manual`].
    pub resolutions: Vec<ConflictResolution>,
}

impl MergeRequest {
    pub fn new(
        document_id: impl Into<String>,
        source_branch: impl Into<String>,
        target_branch: impl Into<String>,
        merger: impl Into<String>,
    ) -> Self {
        Self {
            document_id: document_id.into(),
            source_branch: source_branch.into(),
            target_branch: target_branch.into(),
            merger: merger.into(),
            commit_message: None,
            strategy: MergeStrategy::default(),
            resolutions: Vec::new(),
        }
    }

    pub fn with_strategy(mut self, strategy: MergeStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.commit_message = Some(message.into());
        self
    }

    pub fn with_resolution(mut self, resolution: ConflictResolution) -> Self {
        self.resolutions.push(resolution);
        self
    }

    pub fn with_resolutions(mut self, resolutions: impl IntoIterator<Item = ConflictResolution>) -> Self {
        self.resolutions.extend(resolutions);
        self
    }

    fn message(&self) -> String {
        self.commit_message.clone().unwrap_or_else(|| {
            format!("Merge {} into {}", self.source_branch, self.target_branch)
        })
    }
}

/// What a merge did.
///
/// `success == false` means nothing was written; `conflicts` then lists
/// the paths still needing a decision.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MergeOutcome {
    pub success: bool,
    pub merge_id: MergeId,
    pub result_version_id: Option<VersionId>,
    pub conflicts: Vec<ConflictResolution>,
    /// The target already contained the source head; no version was written.
    pub up_to_date: bool,
}

impl MergeOutcome {
    fn conflicted(merge_id: MergeId, conflicts: Vec<ConflictResolution>) -> Self {
        Self {
            success: false,
            merge_id,
            result_version_id: None,
            conflicts,
            up_to_date: false,
        }
    }
}

/// Merges branch heads through a [`VersionGraph`].
#[derive(Clone)]
pub struct MergeEngine {
    graph: Arc<VersionGraph>,
}

impl MergeEngine {
    pub fn new(graph: Arc<VersionGraph>) -> Self {
        Self { graph }
    }

    /// Merge the source branch head into the target branch.
    ///
    /// The merge result is committed on the target with the target head
    /// pinned as parent, so a concurrent write to the target fails the
    /// merge with `HeadConflict` instead of being overwritten.
    pub async fn merge_branches(&self, request: MergeRequest) -> VersionResult<MergeOutcome> {
        let doc = request.document_id.as_str();
        let source = self.graph.get_branch(doc, &request.source_branch).await?;
        let target = self.graph.get_branch(doc, &request.target_branch).await?;
        let source_head = self.graph.get_version(&source.head_version_id).await?;
        let target_head = self.graph.get_version(&target.head_version_id).await?;
        let merge_id = MergeId::new();

        if self.graph.is_ancestor(&source_head.id, &target_head.id).await? {
            debug!(
                document = doc,
                source = %request.source_branch,
                target = %request.target_branch,
                "target already contains source head"
            );
            return Ok(MergeOutcome {
                success: true,
                merge_id,
                result_version_id: Some(target_head.id),
                conflicts: Vec::new(),
                up_to_date: true,
            });
        }

        let base = self
            .graph
            .common_ancestor(&source_head.id, &target_head.id)
            .await?;
        let base_content = base.as_ref().map(|b| &b.content);

        let paths = conflicting_paths(base_content, &source_head.content, &target_head.content);
        let conflicts = conflict_report(&paths, &source_head.content, &target_head.content);

        if !conflicts.is_empty() && request.strategy != MergeStrategy::Manual {
            info!(
                document = doc,
                source = %request.source_branch,
                target = %request.target_branch,
                conflicts = conflicts.len(),
                strategy = %request.strategy,
                "merge stopped on conflicts"
            );
            return Ok(MergeOutcome::conflicted(merge_id, conflicts));
        }

        let settlement = settle(conflicts, &request.resolutions, &request.merger);
        if !settlement.unresolved.is_empty() {
            info!(
                document = doc,
                unresolved = settlement.unresolved.len(),
                "manual merge missing decisions"
            );
            return Ok(MergeOutcome::conflicted(merge_id, settlement.unresolved));
        }

        let merged = match request.strategy {
            MergeStrategy::FastForward => {
                if !self.graph.is_ancestor(&target_head.id, &source_head.id).await? {
                    warn!(
                        document = doc,
                        source = %request.source_branch,
                        target = %request.target_branch,
                        "fast-forward over a diverged target; target-only edits are dropped"
                    );
                }
                source_head.content.clone()
            }
            MergeStrategy::ThreeWay | MergeStrategy::Manual => three_way_merge(
                base_content,
                &source_head.content,
                &target_head.content,
                &settlement.overrides,
            ),
        };

        let message = request.message();
        let options = CreateVersionOptions::new(message.clone())
            .with_branch(request.target_branch.clone())
            .with_parent(target_head.id.clone())
            .with_merged_from(source_head.id.clone())
            .with_origin(WriteOrigin::Merge);
        let result = self
            .graph
            .commit(doc, &target.project_id, merged, &request.merger, options)
            .await?;

        let record = MergeRecord {
            id: merge_id.clone(),
            source_branch: request.source_branch.clone(),
            target_branch: request.target_branch.clone(),
            source_version_id: source_head.id.clone(),
            target_version_id: target_head.id.clone(),
            result_version_id: result.id.clone(),
            merged_by: request.merger.clone(),
            timestamp: result.timestamp,
            strategy: request.strategy,
            conflicts: settlement.resolved.clone(),
            commit_message: message,
        };
        self.graph
            .store()
            .append_merge_record(doc, &request.target_branch, record)
            .await?;

        if source.status == BranchStatus::Active {
            self.graph
                .set_branch_status(doc, &request.source_branch, BranchStatus::Merged)
                .await?;
        }

        info!(
            document = doc,
            source = %request.source_branch,
            target = %request.target_branch,
            strategy = %request.strategy,
            resolved = settlement.resolved.len(),
            version = %result.id,
            "branches merged"
        );

        Ok(MergeOutcome {
            success: true,
            merge_id,
            result_version_id: Some(result.id),
            conflicts: settlement.resolved,
            up_to_date: false,
        })
    }
}
