//! Ancestry queries over the version graph.
//!
//! A version's ancestors are reached through its parent link and, for
//! merge results, the merged-in source head. Versions removed by retention
//! end the walk along that line.

use std::collections::{HashMap, VecDeque};

use docvc_types::{DocumentVersion, VersionId};

use crate::error::VersionResult;
use crate::graph::VersionGraph;

impl VersionGraph {
    /// Every stored ancestor of `start`, including `start` itself.
    pub async fn ancestors(
        &self,
        start: &VersionId,
    ) -> VersionResult<HashMap<VersionId, DocumentVersion>> {
        let mut visited: HashMap<VersionId, DocumentVersion> = HashMap::new();
        let mut queue = VecDeque::from([start.clone()]);

        while let Some(id) = queue.pop_front() {
            if visited.contains_key(&id) {
                continue;
            }
            let Some(version) = self.store().get_version(&id).await? else {
                continue;
            };
            let links = version
                .parent_version_id
                .iter()
                .chain(version.metadata.merged_from.iter());
            for next in links {
                if !visited.contains_key(next) {
                    queue.push_back(next.clone());
                }
            }
            visited.insert(id, version);
        }

        Ok(visited)
    }

    /// The lowest common ancestor of two versions: among the versions both
    /// descend from, the one written last.
    pub async fn common_ancestor(
        &self,
        a: &VersionId,
        b: &VersionId,
    ) -> VersionResult<Option<DocumentVersion>> {
        let ancestors_a = self.ancestors(a).await?;
        let mut ancestors_b = self.ancestors(b).await?;

        let lca = ancestors_a
            .keys()
            .filter_map(|id| ancestors_b.remove(id))
            .max_by_key(|version| version.timestamp);
        Ok(lca)
    }

    /// Returns `true` if `ancestor` is `descendant` or one of its ancestors.
    pub async fn is_ancestor(
        &self,
        ancestor: &VersionId,
        descendant: &VersionId,
    ) -> VersionResult<bool> {
        Ok(self.ancestors(descendant).await?.contains_key(ancestor))
    }
}

#[cfg(test)]
mod tests {
    use crate::options::{CreateVersionOptions, NewBranch};
    use crate::testing::{commit_on, doc, graph, DOC, PROJECT};
    use serde_json::json;

    #[tokio::test]
    async fn lca_of_linear_history_is_the_older_version() {
        let g = graph();
        let v0 = commit_on(&g, "main", json!({"a": 1})).await;
        let v1 = commit_on(&g, "main", json!({"a": 2})).await;
        let lca = g.common_ancestor(&v0.id, &v1.id).await.unwrap().unwrap();
        assert_eq!(lca.id, v0.id);
        assert!(g.is_ancestor(&v0.id, &v1.id).await.unwrap());
        assert!(!g.is_ancestor(&v1.id, &v0.id).await.unwrap());
    }

    #[tokio::test]
    async fn lca_of_forked_branches_is_the_branch_point() {
        let g = graph();
        commit_on(&g, "main", json!({"a": 1})).await;
        let fork = commit_on(&g, "main", json!({"a": 2})).await;
        g.create_branch(NewBranch::new(DOC, PROJECT, "draft", "ana", fork.id.clone()))
            .await
            .unwrap();
        let main_head = commit_on(&g, "main", json!({"a": 3})).await;
        let draft_head = commit_on(&g, "draft", json!({"a": 2, "b": 1})).await;

        let lca = g
            .common_ancestor(&main_head.id, &draft_head.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(lca.id, fork.id);
    }

    #[tokio::test]
    async fn merged_from_link_is_followed() {
        let g = graph();
        let base = commit_on(&g, "main", json!({"a": 1})).await;
        g.create_branch(NewBranch::new(DOC, PROJECT, "draft", "ana", base.id.clone()))
            .await
            .unwrap();
        let draft_head = commit_on(&g, "draft", json!({"a": 1, "b": 1})).await;
        let merge = g
            .commit(
                DOC,
                PROJECT,
                doc(json!({"a": 1, "b": 1})),
                "ana",
                CreateVersionOptions::new("merge draft").with_merged_from(draft_head.id.clone()),
            )
            .await
            .unwrap();

        assert!(g.is_ancestor(&draft_head.id, &merge.id).await.unwrap());
        let lca = g
            .common_ancestor(&merge.id, &draft_head.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(lca.id, draft_head.id);
    }

    #[tokio::test]
    async fn unrelated_versions_have_no_common_ancestor() {
        let g = graph();
        let a = commit_on(&g, "main", json!({"a": 1})).await;
        let other = g
            .commit(
                "doc-2",
                PROJECT,
                doc(json!({"a": 1})),
                "ana",
                CreateVersionOptions::new("init"),
            )
            .await
            .unwrap();
        assert!(g.common_ancestor(&a.id, &other.id).await.unwrap().is_none());
    }
}
