//! Fixtures shared by the graph tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use docvc_crypto::ContentHasher;
use docvc_diff::diff;
use docvc_store::{
    BranchUpdate, InMemoryVersionStore, StoreEventStream, StoreResult, VersionQuery, VersionStore,
};
use docvc_types::{
    Branch, Clock, DocumentVersion, ManualClock, MergeRecord, RestorePoint, TemporalAnchor, Value,
    VersionId,
};

use crate::graph::{GraphConfig, VersionGraph};
use crate::options::CreateVersionOptions;

pub(crate) const DOC: &str = "doc-1";
pub(crate) const PROJECT: &str = "proj-1";

pub(crate) fn graph() -> VersionGraph {
    graph_with(GraphConfig::default())
}

pub(crate) fn graph_with(config: GraphConfig) -> VersionGraph {
    VersionGraph::new(
        Arc::new(InMemoryVersionStore::new()),
        Arc::new(ManualClock::new(1_000)),
        config,
    )
}

pub(crate) fn doc(json: serde_json::Value) -> Value {
    Value::from(json)
}

pub(crate) async fn commit_on(
    graph: &VersionGraph,
    branch: &str,
    content: serde_json::Value,
) -> DocumentVersion {
    graph
        .commit(
            DOC,
            PROJECT,
            doc(content),
            "ana",
            CreateVersionOptions::new("edit").with_branch(branch),
        )
        .await
        .unwrap()
}

/// A store where a rival writer advances a branch head just before the
/// first head compare-and-swap, so that swap loses.
pub(crate) struct RacingStore {
    inner: InMemoryVersionStore,
    clock: Arc<ManualClock>,
    raced: AtomicBool,
}

impl RacingStore {
    pub(crate) fn new(clock: Arc<ManualClock>) -> Self {
        Self {
            inner: InMemoryVersionStore::new(),
            clock,
            raced: AtomicBool::new(false),
        }
    }

    /// Write a rival version on top of `head` and move the branch to it.
    async fn rival_write(
        &self,
        document_id: &str,
        name: &str,
        head: &VersionId,
    ) -> StoreResult<()> {
        let Some(parent) = self.inner.get_version(head).await? else {
            return Ok(());
        };
        let content = doc(serde_json::json!({"rival": true}));
        let timestamp = self.clock.now();
        let rival = DocumentVersion {
            id: VersionId::new(),
            version_number: parent.version_number.next_minor(),
            parent_version_id: Some(parent.id.clone()),
            content_hash: ContentHasher::CONTENT.hash_value(&content),
            changes: diff(&parent.content, &content),
            content,
            timestamp,
            commit_message: "rival".into(),
            ..parent
        };
        let rival_id = rival.id.clone();
        self.inner.insert_version(rival).await?;
        self.inner
            .compare_and_swap_head(document_id, name, head, &rival_id, timestamp)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl VersionStore for RacingStore {
    async fn insert_version(&self, version: DocumentVersion) -> StoreResult<()> {
        self.inner.insert_version(version).await
    }

    async fn get_version(&self, id: &VersionId) -> StoreResult<Option<DocumentVersion>> {
        self.inner.get_version(id).await
    }

    async fn query_versions(&self, query: &VersionQuery) -> StoreResult<Vec<DocumentVersion>> {
        self.inner.query_versions(query).await
    }

    async fn delete_version(&self, id: &VersionId) -> StoreResult<bool> {
        self.inner.delete_version(id).await
    }

    async fn insert_branch(&self, branch: Branch) -> StoreResult<()> {
        self.inner.insert_branch(branch).await
    }

    async fn get_branch(&self, document_id: &str, name: &str) -> StoreResult<Option<Branch>> {
        self.inner.get_branch(document_id, name).await
    }

    async fn list_branches(&self, document_id: &str) -> StoreResult<Vec<Branch>> {
        self.inner.list_branches(document_id).await
    }

    async fn compare_and_swap_head(
        &self,
        document_id: &str,
        name: &str,
        expected: &VersionId,
        new: &VersionId,
        at: TemporalAnchor,
    ) -> StoreResult<bool> {
        if !self.raced.swap(true, Ordering::SeqCst) {
            self.rival_write(document_id, name, expected).await?;
        }
        self.inner
            .compare_and_swap_head(document_id, name, expected, new, at)
            .await
    }

    async fn update_branch(
        &self,
        document_id: &str,
        name: &str,
        update: BranchUpdate,
    ) -> StoreResult<Branch> {
        self.inner.update_branch(document_id, name, update).await
    }

    async fn append_merge_record(
        &self,
        document_id: &str,
        name: &str,
        record: MergeRecord,
    ) -> StoreResult<()> {
        self.inner.append_merge_record(document_id, name, record).await
    }

    async fn insert_restore_point(&self, point: RestorePoint) -> StoreResult<()> {
        self.inner.insert_restore_point(point).await
    }

    async fn list_restore_points(&self, document_id: &str) -> StoreResult<Vec<RestorePoint>> {
        self.inner.list_restore_points(document_id).await
    }

    fn subscribe(&self, document_id: &str) -> StoreEventStream {
        self.inner.subscribe(document_id)
    }
}
