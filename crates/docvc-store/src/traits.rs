use async_trait::async_trait;

use docvc_types::{
    Branch, BranchProtection, BranchStatus, DocumentVersion, MergeRecord, RestorePoint,
    TemporalAnchor, VersionId,
};

use crate::error::StoreResult;
use crate::event::StoreEventStream;
use crate::query::VersionQuery;

/// Branch fields that may change after creation, other than the head.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BranchUpdate {
    pub status: Option<BranchStatus>,
    pub protection: Option<BranchProtection>,
    pub display_name: Option<String>,
}

impl BranchUpdate {
    pub fn status(status: BranchStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn protection(protection: BranchProtection) -> Self {
        Self {
            protection: Some(protection),
            ..Self::default()
        }
    }

    /// Write the set fields into `branch`.
    pub fn apply_to(&self, branch: &mut Branch) {
        if let Some(status) = self.status {
            branch.status = status;
        }
        if let Some(protection) = &self.protection {
            branch.protection = protection.clone();
        }
        if let Some(display_name) = &self.display_name {
            branch.display_name = display_name.clone();
        }
    }
}

/// Durable storage the engine runs against.
///
/// All implementations must satisfy these invariants:
/// - Versions are immutable once inserted; only retention deletes them.
/// - Branch names are unique per document and branches are never deleted.
/// - The head pointer changes only through `compare_and_swap_head`, which
///   is atomic with respect to concurrent callers on the same branch.
/// - Subscribers of a document see every write to it, in write order.
#[async_trait]
pub trait VersionStore: Send + Sync {
    /// Persist a new version. Fails if the id is already stored.
    async fn insert_version(&self, version: DocumentVersion) -> StoreResult<()>;

    /// Returns `Ok(None)` if the version does not exist.
    async fn get_version(&self, id: &VersionId) -> StoreResult<Option<DocumentVersion>>;

    async fn query_versions(&self, query: &VersionQuery) -> StoreResult<Vec<DocumentVersion>>;

    /// Delete a version. Returns `true` if it existed.
    ///
    /// Intended for retention only.
    async fn delete_version(&self, id: &VersionId) -> StoreResult<bool>;

    /// Persist a new branch. Fails if the name is taken for the document.
    async fn insert_branch(&self, branch: Branch) -> StoreResult<()>;

    async fn get_branch(&self, document_id: &str, name: &str) -> StoreResult<Option<Branch>>;

    /// All branches of a document, ordered by name.
    async fn list_branches(&self, document_id: &str) -> StoreResult<Vec<Branch>>;

    /// Move the head from `expected` to `new` and stamp `last_activity`.
    ///
    /// Returns `false`, leaving the branch untouched, if the head is no
    /// longer `expected`.
    async fn compare_and_swap_head(
        &self,
        document_id: &str,
        name: &str,
        expected: &VersionId,
        new: &VersionId,
        at: TemporalAnchor,
    ) -> StoreResult<bool>;

    /// Apply a status, protection, or display-name change.
    async fn update_branch(
        &self,
        document_id: &str,
        name: &str,
        update: BranchUpdate,
    ) -> StoreResult<Branch>;

    /// Append to a branch's merge log.
    async fn append_merge_record(
        &self,
        document_id: &str,
        name: &str,
        record: MergeRecord,
    ) -> StoreResult<()>;

    async fn insert_restore_point(&self, point: RestorePoint) -> StoreResult<()>;

    /// All restore points of a document, oldest first.
    async fn list_restore_points(&self, document_id: &str) -> StoreResult<Vec<RestorePoint>>;

    /// Receive every subsequent write to `document_id`.
    fn subscribe(&self, document_id: &str) -> StoreEventStream;
}
