use std::sync::Arc;

use docvc_graph::{
    CreateVersionOptions, HistorySubscription, NewBranch, VersionComparison, VersionGraph,
};
use docvc_merge::{MergeEngine, MergeOutcome, MergeRequest};
use docvc_restore::{NewRestorePoint, RestorePointManager};
use docvc_retention::{RetentionCleaner, RetentionReport};
use docvc_store::{InMemoryVersionStore, VersionStore};
use docvc_types::{
    Branch, BranchId, BranchProtection, Clock, DocumentVersion, HybridLogicalClock, RestorePoint,
    Value, VersionId,
};

use crate::config::EngineConfig;
use crate::error::SdkResult;

/// High-level document versioning API.
#[derive(Clone)]
pub struct DocumentVersioning {
    graph: Arc<VersionGraph>,
    merges: MergeEngine,
    restores: RestorePointManager,
    retention: RetentionCleaner,
    config: EngineConfig,
}

impl DocumentVersioning {
    /// An engine over `store`, timestamping with a hybrid logical clock.
    pub fn new(store: Arc<dyn VersionStore>, config: EngineConfig) -> Self {
        let clock = Arc::new(HybridLogicalClock::new(config.node_id));
        Self::with_clock(store, clock, config)
    }

    pub fn with_clock(
        store: Arc<dyn VersionStore>,
        clock: Arc<dyn Clock>,
        config: EngineConfig,
    ) -> Self {
        let graph = Arc::new(VersionGraph::new(store, clock, config.graph_config()));
        Self {
            merges: MergeEngine::new(Arc::clone(&graph)),
            restores: RestorePointManager::new(Arc::clone(&graph)),
            retention: RetentionCleaner::new(Arc::clone(&graph), config.retention.clone()),
            graph,
            config,
        }
    }

    /// An engine over a fresh in-memory store.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryVersionStore::new()), EngineConfig::default())
    }

    // ---- Versions ----

    pub async fn create_version(
        &self,
        document_id: &str,
        project_id: &str,
        content: Value,
        author: &str,
        options: CreateVersionOptions,
    ) -> SdkResult<VersionId> {
        Ok(self
            .graph
            .create_version(document_id, project_id, content, author, options)
            .await?)
    }

    /// Like [`create_version`](Self::create_version) but returns the stored version.
    pub async fn commit(
        &self,
        document_id: &str,
        project_id: &str,
        content: Value,
        author: &str,
        options: CreateVersionOptions,
    ) -> SdkResult<DocumentVersion> {
        Ok(self
            .graph
            .commit(document_id, project_id, content, author, options)
            .await?)
    }

    pub async fn get_version(&self, id: &VersionId) -> SdkResult<DocumentVersion> {
        Ok(self.graph.get_version(id).await?)
    }

    pub async fn find_version(
        &self,
        document_id: &str,
        branch_name: &str,
        number: &str,
    ) -> SdkResult<DocumentVersion> {
        Ok(self.graph.find_version(document_id, branch_name, number).await?)
    }

    pub async fn get_version_history(
        &self,
        document_id: &str,
        branch_name: Option<&str>,
        limit: Option<usize>,
    ) -> SdkResult<Vec<DocumentVersion>> {
        Ok(self
            .graph
            .get_version_history(document_id, branch_name, limit)
            .await?)
    }

    pub async fn subscribe_to_version_history(
        &self,
        document_id: &str,
        branch_name: Option<&str>,
        limit: Option<usize>,
    ) -> SdkResult<HistorySubscription> {
        Ok(self
            .graph
            .subscribe_to_version_history(document_id, branch_name, limit)
            .await?)
    }

    pub async fn compare_versions(
        &self,
        from: &VersionId,
        to: &VersionId,
    ) -> SdkResult<VersionComparison> {
        Ok(self.graph.compare_versions(from, to).await?)
    }

    pub async fn verify_integrity(&self, id: &VersionId) -> SdkResult<()> {
        Ok(self.graph.verify_integrity(id).await?)
    }

    // ---- Branches ----

    pub async fn create_branch(&self, request: NewBranch) -> SdkResult<BranchId> {
        Ok(self.graph.create_branch(request).await?)
    }

    pub async fn get_branch(&self, document_id: &str, name: &str) -> SdkResult<Branch> {
        Ok(self.graph.get_branch(document_id, name).await?)
    }

    pub async fn get_branches(&self, document_id: &str) -> SdkResult<Vec<Branch>> {
        Ok(self.graph.get_branches(document_id).await?)
    }

    pub async fn archive_branch(&self, document_id: &str, name: &str) -> SdkResult<Branch> {
        Ok(self.graph.archive_branch(document_id, name).await?)
    }

    pub async fn set_branch_protection(
        &self,
        document_id: &str,
        name: &str,
        protection: BranchProtection,
    ) -> SdkResult<Branch> {
        Ok(self
            .graph
            .set_branch_protection(document_id, name, protection)
            .await?)
    }

    pub async fn merge_branches(&self, request: MergeRequest) -> SdkResult<MergeOutcome> {
        Ok(self.merges.merge_branches(request).await?)
    }

    // ---- Restore points ----

    pub async fn rollback_to_version(
        &self,
        document_id: &str,
        version_id: &VersionId,
        author: &str,
        commit_message: Option<&str>,
    ) -> SdkResult<VersionId> {
        Ok(self
            .restores
            .rollback_to_version(document_id, version_id, author, commit_message)
            .await?)
    }

    pub async fn create_restore_point(&self, request: NewRestorePoint) -> SdkResult<RestorePoint> {
        Ok(self.restores.create_restore_point(request).await?)
    }

    pub async fn get_restore_points(&self, document_id: &str) -> SdkResult<Vec<RestorePoint>> {
        Ok(self.restores.get_restore_points(document_id).await?)
    }

    // ---- Retention ----

    pub async fn cleanup_old_versions(
        &self,
        document_id: &str,
        keep_count: usize,
        keep_days: u64,
    ) -> SdkResult<usize> {
        Ok(self
            .retention
            .cleanup_old_versions(document_id, keep_count, keep_days)
            .await?)
    }

    /// Clean up with the configured retention policy.
    pub async fn cleanup(&self, document_id: &str) -> SdkResult<RetentionReport> {
        Ok(self.retention.cleanup(document_id).await?)
    }

    // ---- Accessors ----

    pub fn graph(&self) -> &Arc<VersionGraph> {
        &self.graph
    }

    pub fn store(&self) -> &Arc<dyn VersionStore> {
        self.graph.store()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}
