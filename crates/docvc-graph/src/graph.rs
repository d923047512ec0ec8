use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use docvc_crypto::ContentHasher;
use docvc_diff::{apply_changes, diff, initial_changes};
use docvc_store::{BranchUpdate, StoreError, VersionQuery, VersionStore};
use docvc_types::{
    Branch, BranchId, BranchProtection, BranchStatus, Clock, DocumentVersion, RestorePoint,
    RestorePointId, TemporalAnchor, Value, VersionId, VersionMetadata, VersionNumber,
};

use crate::error::{VersionError, VersionResult};
use crate::names::validate_branch_name;
use crate::options::{CreateVersionOptions, NewBranch, WriteOrigin};
use crate::subscription::HistorySubscription;
use crate::visibility::visible_versions;

/// Tunables for the version graph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GraphConfig {
    /// Branch used when a write names none.
    pub default_branch: String,
    /// A version with more changes than this gets an automatic restore
    /// point unless it is itself a snapshot.
    pub significant_change_threshold: usize,
    /// Head compare-and-swap attempts before giving up with `HeadConflict`.
    pub max_head_retries: u32,
    /// History length returned when the caller gives no limit.
    pub history_page_size: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            default_branch: "main".into(),
            significant_change_threshold: 10,
            max_head_retries: 5,
            history_page_size: 50,
        }
    }
}

/// Creates versions and maintains branch heads.
///
/// Holds no state of its own beyond its collaborators: every read and
/// write goes through the [`VersionStore`], and every timestamp comes from
/// the injected [`Clock`].
pub struct VersionGraph {
    store: Arc<dyn VersionStore>,
    clock: Arc<dyn Clock>,
    hasher: ContentHasher,
    config: GraphConfig,
}

impl VersionGraph {
    pub fn new(store: Arc<dyn VersionStore>, clock: Arc<dyn Clock>, config: GraphConfig) -> Self {
        Self {
            store,
            clock,
            hasher: ContentHasher::CONTENT,
            config,
        }
    }

    pub fn store(&self) -> &Arc<dyn VersionStore> {
        &self.store
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// A fresh timestamp from the engine clock.
    pub fn now(&self) -> TemporalAnchor {
        self.clock.now()
    }

    // ---- Version creation ----

    /// Record `content` as a new version and advance the branch head to it.
    ///
    /// Returns the new version id.
    pub async fn create_version(
        &self,
        document_id: &str,
        project_id: &str,
        content: Value,
        author: &str,
        options: CreateVersionOptions,
    ) -> VersionResult<VersionId> {
        self.commit(document_id, project_id, content, author, options)
            .await
            .map(|version| version.id)
    }

    /// Like [`create_version`](Self::create_version), returning the stored
    /// version.
    ///
    /// The head advance is a compare-and-swap. When another writer moves
    /// the head first, the write is rebuilt against the new head and
    /// retried up to `max_head_retries` times, unless the caller pinned a
    /// parent, in which case it fails with `HeadConflict` at once. A
    /// version persisted by a losing attempt stays in the store but never
    /// enters history.
    pub async fn commit(
        &self,
        document_id: &str,
        project_id: &str,
        content: Value,
        author: &str,
        options: CreateVersionOptions,
    ) -> VersionResult<DocumentVersion> {
        let branch_name = options
            .branch_name
            .clone()
            .unwrap_or_else(|| self.config.default_branch.clone());
        validate_branch_name(&branch_name)?;

        let mut attempt: u32 = 0;
        let version = loop {
            let branch = self.store.get_branch(document_id, &branch_name).await?;
            if let Some(branch) = &branch {
                check_writable(branch, author, options.origin)?;
            }
            let head = branch.as_ref().map(|b| b.head_version_id.clone());

            let parent_id = match (&options.parent_version_id, &head) {
                (Some(pinned), Some(head)) if pinned != head => {
                    return Err(head_conflict(&branch_name, pinned.to_string()));
                }
                (Some(pinned), None) => Some(pinned.clone()),
                _ => head.clone(),
            };
            let parent = match &parent_id {
                Some(id) => Some(self.get_version(id).await?),
                None => None,
            };

            let version = self.build_version(
                document_id,
                project_id,
                &content,
                author,
                &options,
                &branch_name,
                parent.as_ref(),
            );
            self.store.insert_version(version.clone()).await?;

            let advanced = match &head {
                Some(expected) => {
                    self.store
                        .compare_and_swap_head(
                            document_id,
                            &branch_name,
                            expected,
                            &version.id,
                            version.timestamp,
                        )
                        .await?
                }
                None => {
                    let branch = new_branch_for(&version, parent.as_ref(), author);
                    match self.store.insert_branch(branch).await {
                        Ok(()) => {
                            debug!(document = document_id, branch = %branch_name, "branch created on first write");
                            true
                        }
                        Err(StoreError::DuplicateBranch { .. }) => false,
                        Err(e) => return Err(e.into()),
                    }
                }
            };

            if advanced {
                break version;
            }

            attempt += 1;
            let expected = head.as_ref().map_or_else(|| "none".to_string(), ToString::to_string);
            if options.parent_version_id.is_some() || attempt >= self.config.max_head_retries {
                return Err(head_conflict(&branch_name, expected));
            }
            warn!(
                document = document_id,
                branch = %branch_name,
                attempt,
                orphaned = %version.id,
                "branch head moved during write, retrying"
            );
        };

        debug!(
            document = document_id,
            branch = %branch_name,
            version = %version.id,
            number = %version.version_number,
            changes = version.metadata.change_count,
            "head advanced"
        );

        if version.metadata.change_count > self.config.significant_change_threshold
            && !version.metadata.is_snapshot
        {
            self.record_automatic_restore_point(&version).await?;
        }

        Ok(version)
    }

    #[allow(clippy::too_many_arguments)]
    fn build_version(
        &self,
        document_id: &str,
        project_id: &str,
        content: &Value,
        author: &str,
        options: &CreateVersionOptions,
        branch_name: &str,
        parent: Option<&DocumentVersion>,
    ) -> DocumentVersion {
        let timestamp = self.clock.now();

        let (changes, change_count) = match parent {
            Some(parent) => {
                let changes = diff(&parent.content, content);
                let count = changes.len();
                (changes, count)
            }
            None => (initial_changes(content), content.leaf_count()),
        };
        let changes = changes.into_iter().map(|c| c.stamped(timestamp)).collect();

        let version_number = match parent {
            Some(parent) if parent.branch_name == branch_name => parent.version_number.next_minor(),
            _ => VersionNumber::initial(),
        };

        let size_bytes = serde_json::to_vec(content).map_or(0, |bytes| bytes.len() as u64);

        DocumentVersion {
            id: VersionId::new(),
            document_id: document_id.to_string(),
            project_id: project_id.to_string(),
            version_number,
            branch_name: branch_name.to_string(),
            parent_version_id: parent.map(|p| p.id.clone()),
            content: content.clone(),
            content_hash: self.hasher.hash_value(content),
            author: author.to_string(),
            timestamp,
            commit_message: options.commit_message.clone(),
            tags: options.tags.clone(),
            metadata: VersionMetadata {
                size_bytes,
                change_count,
                is_snapshot: options.is_snapshot,
                trigger_event: options.effective_trigger(),
                merged_from: options.merged_from.clone(),
            },
            changes,
        }
    }

    async fn record_automatic_restore_point(&self, version: &DocumentVersion) -> VersionResult<()> {
        let count = version.metadata.change_count;
        let mut metadata = BTreeMap::new();
        metadata.insert("changeCount".to_string(), Value::from(count as i64));
        let point = RestorePoint {
            id: RestorePointId::new(),
            name: format!("Auto: {} v{}", version.branch_name, version.version_number),
            description: format!("Significant change ({count} changes)"),
            document_id: version.document_id.clone(),
            version_id: version.id.clone(),
            created_by: version.author.clone(),
            created_at: self.clock.now(),
            is_automatic: true,
            metadata,
        };
        info!(
            document = %version.document_id,
            version = %version.id,
            changes = count,
            "automatic restore point created"
        );
        self.store.insert_restore_point(point).await?;
        Ok(())
    }

    // ---- Reads ----

    pub async fn get_version(&self, id: &VersionId) -> VersionResult<DocumentVersion> {
        self.store
            .get_version(id)
            .await?
            .ok_or_else(|| VersionError::VersionNotFound(id.to_string()))
    }

    /// Look up a history version by its branch-scoped number, such as `"1.3"`.
    pub async fn find_version(
        &self,
        document_id: &str,
        branch_name: &str,
        number: &str,
    ) -> VersionResult<DocumentVersion> {
        let number: VersionNumber = number
            .parse()
            .map_err(|_| VersionError::InvalidVersionNumber(number.to_string()))?;
        visible_versions(self.store.as_ref(), document_id)
            .await?
            .into_iter()
            .find(|v| v.branch_name == branch_name && v.version_number == number)
            .ok_or_else(|| VersionError::VersionNotFound(format!("{branch_name}@{number}")))
    }

    /// History versions of a document, newest first. Versions no branch
    /// head has reached are left out.
    ///
    /// `limit` defaults to the configured history page size.
    pub async fn get_version_history(
        &self,
        document_id: &str,
        branch_name: Option<&str>,
        limit: Option<usize>,
    ) -> VersionResult<Vec<DocumentVersion>> {
        let query = self.history_query(document_id, branch_name, limit);
        let history = visible_versions(self.store.as_ref(), document_id)
            .await?
            .into_iter()
            .filter(|v| query.matches(v))
            .collect();
        Ok(query.finish(history))
    }

    /// A stream of history snapshots: the current history first, then a
    /// fresh snapshot after every write that changes it.
    pub async fn subscribe_to_version_history(
        &self,
        document_id: &str,
        branch_name: Option<&str>,
        limit: Option<usize>,
    ) -> VersionResult<HistorySubscription> {
        let query = self.history_query(document_id, branch_name, limit);
        Ok(HistorySubscription::new(Arc::clone(&self.store), query))
    }

    fn history_query(
        &self,
        document_id: &str,
        branch_name: Option<&str>,
        limit: Option<usize>,
    ) -> VersionQuery {
        let mut query = VersionQuery::document(document_id)
            .limit(limit.unwrap_or(self.config.history_page_size));
        if let Some(name) = branch_name {
            query = query.branch(name);
        }
        query
    }

    /// Check a stored version against its hash and, when its parent is
    /// still stored, replay its change set over the parent.
    pub async fn verify_integrity(&self, id: &VersionId) -> VersionResult<()> {
        let version = self.get_version(id).await?;
        let mismatch = |reason: &str| VersionError::IntegrityMismatch {
            version: version.id.to_string(),
            reason: reason.to_string(),
        };

        if !self.hasher.verify_version(&version) {
            return Err(mismatch("content hash does not match content"));
        }

        let base = match &version.parent_version_id {
            Some(parent_id) => match self.store.get_version(parent_id).await? {
                Some(parent) => parent.content,
                None => return Ok(()),
            },
            None => Value::Null,
        };
        let replayed = apply_changes(&base, &version.changes)
            .map_err(|e| mismatch(&format!("change set does not apply: {e}")))?;
        if replayed != version.content {
            return Err(mismatch("change set does not reproduce content"));
        }
        Ok(())
    }

    // ---- Branches ----

    /// Create a branch whose head is an existing version.
    pub async fn create_branch(&self, request: NewBranch) -> VersionResult<BranchId> {
        validate_branch_name(&request.name)?;

        let base = self.get_version(&request.base_version_id).await?;
        if base.document_id != request.document_id {
            return Err(VersionError::VersionNotFound(request.base_version_id.to_string()));
        }
        if self
            .store
            .get_branch(&request.document_id, &request.name)
            .await?
            .is_some()
        {
            return Err(VersionError::BranchAlreadyExists(request.name));
        }

        let now = self.clock.now();
        let branch = Branch {
            id: BranchId::new(),
            display_name: request.display_name.unwrap_or_else(|| request.name.clone()),
            name: request.name,
            description: request.description,
            document_id: request.document_id,
            project_id: request.project_id,
            base_branch: Some(base.branch_name.clone()),
            base_version_id: Some(base.id.clone()),
            head_version_id: base.id.clone(),
            author: request.author,
            created_at: now,
            last_activity: now,
            status: BranchStatus::Active,
            merge_history: Vec::new(),
            protection: BranchProtection::default(),
        };
        let id = branch.id.clone();
        let name = branch.name.clone();

        match self.store.insert_branch(branch).await {
            Ok(()) => {}
            Err(StoreError::DuplicateBranch { name, .. }) => {
                return Err(VersionError::BranchAlreadyExists(name));
            }
            Err(e) => return Err(e.into()),
        }

        info!(
            document = %base.document_id,
            branch = %name,
            base = %base.id,
            base_branch = %base.branch_name,
            "branch created"
        );
        Ok(id)
    }

    pub async fn get_branch(&self, document_id: &str, name: &str) -> VersionResult<Branch> {
        self.store
            .get_branch(document_id, name)
            .await?
            .ok_or_else(|| VersionError::BranchNotFound(name.to_string()))
    }

    pub async fn get_branches(&self, document_id: &str) -> VersionResult<Vec<Branch>> {
        Ok(self.store.list_branches(document_id).await?)
    }

    /// Make a branch read-only. Branches are never deleted.
    pub async fn archive_branch(&self, document_id: &str, name: &str) -> VersionResult<Branch> {
        let branch = self
            .update_branch(document_id, name, BranchUpdate::status(BranchStatus::Archived))
            .await?;
        info!(document = document_id, branch = name, "branch archived");
        Ok(branch)
    }

    pub async fn set_branch_protection(
        &self,
        document_id: &str,
        name: &str,
        protection: BranchProtection,
    ) -> VersionResult<Branch> {
        self.update_branch(document_id, name, BranchUpdate::protection(protection))
            .await
    }

    pub async fn set_branch_status(
        &self,
        document_id: &str,
        name: &str,
        status: BranchStatus,
    ) -> VersionResult<Branch> {
        self.update_branch(document_id, name, BranchUpdate::status(status))
            .await
    }

    async fn update_branch(
        &self,
        document_id: &str,
        name: &str,
        update: BranchUpdate,
    ) -> VersionResult<Branch> {
        match self.store.update_branch(document_id, name, update).await {
            Ok(branch) => Ok(branch),
            Err(StoreError::BranchNotFound { name, .. }) => Err(VersionError::BranchNotFound(name)),
            Err(e) => Err(e.into()),
        }
    }
}

fn head_conflict(branch: &str, expected: String) -> VersionError {
    VersionError::HeadConflict {
        branch: branch.to_string(),
        expected,
    }
}

/// Reject writes the branch does not accept.
///
/// Archived branches accept nothing. Restricted users apply to every
/// write. Protected status and `prevent_direct_push` only admit merges and
/// rollbacks.
fn check_writable(branch: &Branch, author: &str, origin: WriteOrigin) -> VersionResult<()> {
    let locked = |reason: String| VersionError::BranchLocked {
        branch: branch.name.clone(),
        reason,
    };

    if branch.status == BranchStatus::Archived {
        return Err(locked("branch is archived".into()));
    }
    let restricted = &branch.protection.restricted_users;
    if !restricted.is_empty() && !restricted.iter().any(|user| user == author) {
        return Err(locked(format!("{author} may not write to this branch")));
    }
    let direct_blocked =
        branch.status == BranchStatus::Protected || branch.protection.prevent_direct_push;
    if origin == WriteOrigin::Direct && direct_blocked {
        return Err(locked("direct writes are disabled; merge into it instead".into()));
    }
    Ok(())
}

/// The branch created by the first write to a branch name.
///
/// With no parent this is a root branch; with a pinned parent from another
/// branch, that parent is recorded as the branch point.
fn new_branch_for(version: &DocumentVersion, parent: Option<&DocumentVersion>, author: &str) -> Branch {
    Branch {
        id: BranchId::new(),
        name: version.branch_name.clone(),
        display_name: version.branch_name.clone(),
        description: None,
        document_id: version.document_id.clone(),
        project_id: version.project_id.clone(),
        base_branch: parent.map(|p| p.branch_name.clone()),
        base_version_id: parent.map(|p| p.id.clone()),
        head_version_id: version.id.clone(),
        author: author.to_string(),
        created_at: version.timestamp,
        last_activity: version.timestamp,
        status: BranchStatus::Active,
        merge_history: Vec::new(),
        protection: BranchProtection::default(),
    }
}
