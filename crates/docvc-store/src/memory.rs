use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use tracing::trace;

use docvc_types::{Branch, DocumentVersion, MergeRecord, RestorePoint, TemporalAnchor, VersionId};

use crate::error::{StoreError, StoreResult};
use crate::event::{EventRouter, StoreEvent, StoreEventStream};
use crate::query::VersionQuery;
use crate::snapshot::StoreSnapshot;
use crate::traits::{BranchUpdate, VersionStore};

/// Capacity of per-subscriber broadcast channels.
const CHANNEL_CAPACITY: usize = 256;

#[derive(Default)]
struct State {
    versions: HashMap<VersionId, DocumentVersion>,
    /// Keyed by `(document_id, name)`.
    branches: BTreeMap<(String, String), Branch>,
    restore_points: Vec<RestorePoint>,
}

/// In-memory version store.
///
/// Intended for tests, embedding, and the CLI. All state sits behind one
/// `RwLock`, so a head compare-and-swap is atomic with respect to every
/// other write. Records are cloned on read and write.
pub struct InMemoryVersionStore {
    state: RwLock<State>,
    router: EventRouter,
}

impl InMemoryVersionStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State::default()),
            router: EventRouter::new(CHANNEL_CAPACITY),
        }
    }

    /// Rebuild a store from a previously taken snapshot.
    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        let state = State {
            versions: snapshot
                .versions
                .into_iter()
                .map(|v| (v.id.clone(), v))
                .collect(),
            branches: snapshot
                .branches
                .into_iter()
                .map(|b| ((b.document_id.clone(), b.name.clone()), b))
                .collect(),
            restore_points: snapshot.restore_points,
        };
        Self {
            state: RwLock::new(state),
            router: EventRouter::new(CHANNEL_CAPACITY),
        }
    }

    /// Copy out the full store contents in a stable order.
    pub fn snapshot(&self) -> StoreResult<StoreSnapshot> {
        let state = self.read()?;
        let mut versions: Vec<DocumentVersion> = state.versions.values().cloned().collect();
        versions.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Ok(StoreSnapshot {
            versions,
            branches: state.branches.values().cloned().collect(),
            restore_points: state.restore_points.clone(),
        })
    }

    /// Number of versions currently stored, across all documents.
    pub fn version_count(&self) -> StoreResult<usize> {
        Ok(self.read()?.versions.len())
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.router.subscriber_count()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, State>> {
        self.state.read().map_err(|_| StoreError::LockPoisoned)
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, State>> {
        self.state.write().map_err(|_| StoreError::LockPoisoned)
    }
}

impl Default for InMemoryVersionStore {
    fn default() -> Self {
        Self::new()
    }
}

fn branch_not_found(document_id: &str, name: &str) -> StoreError {
    StoreError::BranchNotFound {
        document_id: document_id.to_string(),
        name: name.to_string(),
    }
}

fn branch_key(document_id: &str, name: &str) -> (String, String) {
    (document_id.to_string(), name.to_string())
}

#[async_trait]
impl VersionStore for InMemoryVersionStore {
    async fn insert_version(&self, version: DocumentVersion) -> StoreResult<()> {
        let event = StoreEvent::VersionInserted {
            document_id: version.document_id.clone(),
            version_id: version.id.clone(),
            branch_name: version.branch_name.clone(),
        };
        {
            let mut state = self.write()?;
            if state.versions.contains_key(&version.id) {
                return Err(StoreError::DuplicateVersion(version.id));
            }
            trace!(version = %version.id, document = %version.document_id, "insert version");
            state.versions.insert(version.id.clone(), version);
        }
        self.router.route(&event);
        Ok(())
    }

    async fn get_version(&self, id: &VersionId) -> StoreResult<Option<DocumentVersion>> {
        Ok(self.read()?.versions.get(id).cloned())
    }

    async fn query_versions(&self, query: &VersionQuery) -> StoreResult<Vec<DocumentVersion>> {
        let matched = self
            .read()?
            .versions
            .values()
            .filter(|v| query.matches(v))
            .cloned()
            .collect();
        Ok(query.finish(matched))
    }

    async fn delete_version(&self, id: &VersionId) -> StoreResult<bool> {
        let removed = self.write()?.versions.remove(id);
        match removed {
            Some(version) => {
                self.router.route(&StoreEvent::VersionDeleted {
                    document_id: version.document_id,
                    version_id: version.id,
                });
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn insert_branch(&self, branch: Branch) -> StoreResult<()> {
        let event = StoreEvent::BranchUpdated {
            document_id: branch.document_id.clone(),
            branch_name: branch.name.clone(),
        };
        {
            let mut state = self.write()?;
            let key = branch_key(&branch.document_id, &branch.name);
            if state.branches.contains_key(&key) {
                return Err(StoreError::DuplicateBranch {
                    document_id: key.0,
                    name: key.1,
                });
            }
            state.branches.insert(key, branch);
        }
        self.router.route(&event);
        Ok(())
    }

    async fn get_branch(&self, document_id: &str, name: &str) -> StoreResult<Option<Branch>> {
        Ok(self
            .read()?
            .branches
            .get(&branch_key(document_id, name))
            .cloned())
    }

    async fn list_branches(&self, document_id: &str) -> StoreResult<Vec<Branch>> {
        Ok(self
            .read()?
            .branches
            .values()
            .filter(|b| b.document_id == document_id)
            .cloned()
            .collect())
    }

    async fn compare_and_swap_head(
        &self,
        document_id: &str,
        name: &str,
        expected: &VersionId,
        new: &VersionId,
        at: TemporalAnchor,
    ) -> StoreResult<bool> {
        {
            let mut state = self.write()?;
            let branch = state
                .branches
                .get_mut(&branch_key(document_id, name))
                .ok_or_else(|| branch_not_found(document_id, name))?;
            if &branch.head_version_id != expected {
                return Ok(false);
            }
            branch.head_version_id = new.clone();
            branch.last_activity = at;
        }
        self.router.route(&StoreEvent::BranchUpdated {
            document_id: document_id.to_string(),
            branch_name: name.to_string(),
        });
        Ok(true)
    }

    async fn update_branch(
        &self,
        document_id: &str,
        name: &str,
        update: BranchUpdate,
    ) -> StoreResult<Branch> {
        let updated = {
            let mut state = self.write()?;
            let branch = state
                .branches
                .get_mut(&branch_key(document_id, name))
                .ok_or_else(|| branch_not_found(document_id, name))?;
            update.apply_to(branch);
            branch.clone()
        };
        self.router.route(&StoreEvent::BranchUpdated {
            document_id: document_id.to_string(),
            branch_name: name.to_string(),
        });
        Ok(updated)
    }

    async fn append_merge_record(
        &self,
        document_id: &str,
        name: &str,
        record: MergeRecord,
    ) -> StoreResult<()> {
        {
            let mut state = self.write()?;
            let branch = state
                .branches
                .get_mut(&branch_key(document_id, name))
                .ok_or_else(|| branch_not_found(document_id, name))?;
            branch.merge_history.push(record);
        }
        self.router.route(&StoreEvent::BranchUpdated {
            document_id: document_id.to_string(),
            branch_name: name.to_string(),
        });
        Ok(())
    }

    async fn insert_restore_point(&self, point: RestorePoint) -> StoreResult<()> {
        let event = StoreEvent::RestorePointCreated {
            document_id: point.document_id.clone(),
            restore_point_id: point.id.clone(),
        };
        self.write()?.restore_points.push(point);
        self.router.route(&event);
        Ok(())
    }

    async fn list_restore_points(&self, document_id: &str) -> StoreResult<Vec<RestorePoint>> {
        let mut points: Vec<RestorePoint> = self
            .read()?
            .restore_points
            .iter()
            .filter(|p| p.document_id == document_id)
            .cloned()
            .collect();
        points.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(points)
    }

    fn subscribe(&self, document_id: &str) -> StoreEventStream {
        self.router.subscribe(document_id)
    }
}

impl std::fmt::Debug for InMemoryVersionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.version_count().unwrap_or_default();
        f.debug_struct("InMemoryVersionStore")
            .field("version_count", &count)
            .finish()
    }
}
