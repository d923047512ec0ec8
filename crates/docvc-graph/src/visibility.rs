//! Which stored versions belong to a document's history.
//!
//! A version becomes history once a branch head reaches it through parent
//! and merged-from links. A version written by a writer that lost the head
//! compare-and-swap is never reached and stays hidden, as does a version
//! whose head advance has not landed yet.
//!
//! Retention can delete a version in the middle of a line. The versions
//! behind such a gap are no longer reachable, so every version older than
//! the version that lost its link is treated as history too.

use std::collections::{HashMap, HashSet, VecDeque};

use docvc_store::{VersionQuery, VersionStore};
use docvc_types::{DocumentVersion, TemporalAnchor, VersionId};

use crate::error::VersionResult;

/// Every history version of `document_id`, newest first.
pub async fn visible_versions(
    store: &dyn VersionStore,
    document_id: &str,
) -> VersionResult<Vec<DocumentVersion>> {
    // Heads are read before versions, so every listed head is in `all`.
    let branches = store.list_branches(document_id).await?;
    let all = store.query_versions(&VersionQuery::document(document_id)).await?;

    let by_id: HashMap<&VersionId, &DocumentVersion> = all.iter().map(|v| (&v.id, v)).collect();
    let mut reachable: HashSet<VersionId> = HashSet::new();
    let mut gap: Option<TemporalAnchor> = None;
    let mut queue: VecDeque<VersionId> =
        branches.into_iter().map(|b| b.head_version_id).collect();

    while let Some(id) = queue.pop_front() {
        if reachable.contains(&id) {
            continue;
        }
        let Some(version) = by_id.get(&id) else {
            continue;
        };
        let links = version
            .parent_version_id
            .iter()
            .chain(version.metadata.merged_from.iter());
        for next in links {
            if !by_id.contains_key(next) {
                gap = gap.max(Some(version.timestamp));
            } else if !reachable.contains(next) {
                queue.push_back(next.clone());
            }
        }
        reachable.insert(id);
    }

    Ok(all
        .into_iter()
        .filter(|v| reachable.contains(&v.id) || gap.is_some_and(|cut| v.timestamp < cut))
        .collect())
}
