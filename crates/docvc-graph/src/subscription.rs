//! Push-style version history subscriptions.

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

use docvc_store::{StoreEvent, StoreEventStream, VersionQuery, VersionStore};
use docvc_types::{DocumentVersion, VersionId};

use crate::error::VersionResult;
use crate::visibility::visible_versions;

/// An ordered stream of history snapshots for one query.
///
/// The first call to [`next`](Self::next) yields the current history; each
/// later call waits for a write that changes it and yields the refreshed
/// history. Dropping the subscription cancels it.
pub struct HistorySubscription {
    store: Arc<dyn VersionStore>,
    query: VersionQuery,
    events: StoreEventStream,
    last: Option<Vec<VersionId>>,
}

impl HistorySubscription {
    pub(crate) fn new(store: Arc<dyn VersionStore>, query: VersionQuery) -> Self {
        // Subscribe before the first read so no write falls in between.
        let events = store.subscribe(&query.document_id);
        Self {
            store,
            query,
            events,
            last: None,
        }
    }

    /// The next history snapshot, newest first. Returns `None` once the
    /// store stops publishing.
    pub async fn next(&mut self) -> Option<VersionResult<Vec<DocumentVersion>>> {
        if self.last.is_none() {
            return Some(self.snapshot().await);
        }
        loop {
            match self.events.recv().await {
                Ok(event) if self.affects(&event) => {}
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, document = %self.query.document_id, "history subscription lagged");
                }
                Err(RecvError::Closed) => return None,
            }
            let previous = self.last.clone();
            match self.snapshot().await {
                Ok(_) if self.last == previous => continue,
                result => return Some(result),
            }
        }
    }

    /// History changes when a head moves or retention deletes a version.
    /// An inserted version stays out of history until a head reaches it.
    fn affects(&self, event: &StoreEvent) -> bool {
        match event {
            StoreEvent::BranchUpdated { branch_name, .. } => self
                .query
                .branch_name
                .as_ref()
                .map_or(true, |wanted| wanted == branch_name),
            StoreEvent::VersionDeleted { .. } => true,
            StoreEvent::VersionInserted { .. } | StoreEvent::RestorePointCreated { .. } => false,
        }
    }

    async fn snapshot(&mut self) -> VersionResult<Vec<DocumentVersion>> {
        let history: Vec<DocumentVersion> =
            visible_versions(self.store.as_ref(), &self.query.document_id)
                .await?
                .into_iter()
                .filter(|v| self.query.matches(v))
                .collect();
        let history = self.query.finish(history);
        self.last = Some(history.iter().map(|v| v.id.clone()).collect());
        Ok(history)
    }
}
