//! Change notifications pushed to store subscribers.

use std::sync::RwLock;

use tokio::sync::broadcast;

use docvc_types::{RestorePointId, VersionId};

/// A write that happened in the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreEvent {
    VersionInserted {
        document_id: String,
        version_id: VersionId,
        branch_name: String,
    },
    VersionDeleted {
        document_id: String,
        version_id: VersionId,
    },
    /// Head, status, protection, or merge log changed.
    BranchUpdated {
        document_id: String,
        branch_name: String,
    },
    RestorePointCreated {
        document_id: String,
        restore_point_id: RestorePointId,
    },
}

impl StoreEvent {
    /// The document the write belongs to.
    pub fn document_id(&self) -> &str {
        match self {
            StoreEvent::VersionInserted { document_id, .. }
            | StoreEvent::VersionDeleted { document_id, .. }
            | StoreEvent::BranchUpdated { document_id, .. }
            | StoreEvent::RestorePointCreated { document_id, .. } => document_id,
        }
    }
}

/// Receiver half of a per-document subscription.
pub type StoreEventStream = broadcast::Receiver<StoreEvent>;

struct Subscriber {
    document_id: String,
    sender: broadcast::Sender<StoreEvent>,
}

/// Fan-out router that delivers store events to subscribers of a document.
pub(crate) struct EventRouter {
    subscribers: RwLock<Vec<Subscriber>>,
    capacity: usize,
}

impl EventRouter {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
            capacity,
        }
    }

    pub(crate) fn subscribe(&self, document_id: &str) -> StoreEventStream {
        let (tx, rx) = broadcast::channel(self.capacity);
        let sub = Subscriber {
            document_id: document_id.to_string(),
            sender: tx,
        };
        self.subscribers
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(sub);
        rx
    }

    /// Deliver `event` to matching subscribers, pruning closed channels.
    pub(crate) fn route(&self, event: &StoreEvent) {
        let mut subs = self
            .subscribers
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        subs.retain(|sub| {
            if sub.document_id == event.document_id() {
                sub.sender.send(event.clone()).is_ok()
            } else {
                sub.sender.receiver_count() > 0
            }
        });
    }

    pub(crate) fn subscriber_count(&self) -> usize {
        self.subscribers
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deleted(document_id: &str) -> StoreEvent {
        StoreEvent::VersionDeleted {
            document_id: document_id.into(),
            version_id: VersionId::new(),
        }
    }

    #[tokio::test]
    async fn routes_only_matching_document() {
        let router = EventRouter::new(16);
        let mut rx = router.subscribe("doc-1");
        router.route(&deleted("doc-2"));
        router.route(&deleted("doc-1"));
        let event = rx.recv().await.unwrap();
        assert_eq!(event.document_id(), "doc-1");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn dropped_receivers_are_pruned() {
        let router = EventRouter::new(16);
        let rx = router.subscribe("doc-1");
        assert_eq!(router.subscriber_count(), 1);
        drop(rx);
        router.route(&deleted("doc-1"));
        assert_eq!(router.subscriber_count(), 0);
    }
}
