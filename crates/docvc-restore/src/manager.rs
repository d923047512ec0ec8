use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::info;

use docvc_graph::{CreateVersionOptions, VersionError, VersionGraph, VersionResult, WriteOrigin};
use docvc_types::{DocumentVersion, RestorePoint, RestorePointId, Value, VersionId};

/// Tag carried by every rollback version.
pub const ROLLBACK_TAG: &str = "rollback";

/// Arguments for a user-created restore point.
#[derive(Clone, Debug)]
pub struct NewRestorePoint {
    pub document_id: String,
    pub version_id: VersionId,
    pub name: String,
    pub description: String,
    pub created_by: String,
    pub metadata: BTreeMap<String, Value>,
}

impl NewRestorePoint {
    pub fn new(
        document_id: impl Into<String>,
        version_id: VersionId,
        name: impl Into<String>,
        created_by: impl Into<String>,
    ) -> Self {
        Self {
            document_id: document_id.into(),
            version_id,
            name: name.into(),
            description: String::new(),
            created_by: created_by.into(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Creates and lists restore points, and rolls documents back.
#[derive(Clone)]
pub struct RestorePointManager {
    graph: Arc<VersionGraph>,
}

impl RestorePointManager {
    pub fn new(graph: Arc<VersionGraph>) -> Self {
        Self { graph }
    }

    /// Bookmark a version of the document.
    pub async fn create_restore_point(&self, request: NewRestorePoint) -> VersionResult<RestorePoint> {
        let version = self
            .version_of(&request.document_id, &request.version_id)
            .await?;
        let point = RestorePoint {
            id: RestorePointId::new(),
            name: request.name,
            description: request.description,
            document_id: request.document_id,
            version_id: version.id,
            created_by: request.created_by,
            created_at: self.graph.now(),
            is_automatic: false,
            metadata: request.metadata,
        };
        self.graph.store().insert_restore_point(point.clone()).await?;
        info!(
            document = %point.document_id,
            version = %point.version_id,
            name = %point.name,
            "restore point created"
        );
        Ok(point)
    }

    /// Every restore point of the document, newest first.
    pub async fn get_restore_points(&self, document_id: &str) -> VersionResult<Vec<RestorePoint>> {
        let mut points = self.graph.store().list_restore_points(document_id).await?;
        points.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(points)
    }

    /// Write a new version on the target's branch whose content equals the
    /// target's. Existing versions are left untouched.
    ///
    /// The head the rollback replaced is bookmarked with an automatic
    /// restore point so the rollback itself can be undone.
    pub async fn rollback_to_version(
        &self,
        document_id: &str,
        version_id: &VersionId,
        author: &str,
        commit_message: Option<&str>,
    ) -> VersionResult<VersionId> {
        let target = self.version_of(document_id, version_id).await?;

        let message = commit_message
            .map(str::to_string)
            .unwrap_or_else(|| format!("Rollback to version {}", target.version_number));
        let options = CreateVersionOptions::new(message)
            .with_branch(target.branch_name.clone())
            .with_tag(ROLLBACK_TAG)
            .with_origin(WriteOrigin::Rollback);
        let version = self
            .graph
            .commit(document_id, &target.project_id, target.content.clone(), author, options)
            .await?;

        if let Some(replaced) = &version.parent_version_id {
            self.checkpoint(&target, &version, replaced).await?;
        }

        info!(
            document = document_id,
            branch = %version.branch_name,
            target = %target.id,
            version = %version.id,
            number = %version.version_number,
            "rolled back"
        );
        Ok(version.id)
    }

    async fn checkpoint(
        &self,
        target: &DocumentVersion,
        rollback: &DocumentVersion,
        replaced: &VersionId,
    ) -> VersionResult<()> {
        let mut metadata = BTreeMap::new();
        metadata.insert("rollbackTarget".to_string(), Value::from(target.id.to_string()));
        metadata.insert("rollbackVersion".to_string(), Value::from(rollback.id.to_string()));
        let point = RestorePoint {
            id: RestorePointId::new(),
            name: format!("Before rollback to v{}", target.version_number),
            description: format!("Head of {} before rolling back", rollback.branch_name),
            document_id: rollback.document_id.clone(),
            version_id: replaced.clone(),
            created_by: rollback.author.clone(),
            created_at: self.graph.now(),
            is_automatic: true,
            metadata,
        };
        self.graph.store().insert_restore_point(point).await?;
        Ok(())
    }

    async fn version_of(&self, document_id: &str, id: &VersionId) -> VersionResult<DocumentVersion> {
        let version = self.graph.get_version(id).await?;
        if version.document_id != document_id {
            return Err(VersionError::VersionNotFound(id.to_string()));
        }
        Ok(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docvc_graph::{GraphConfig, NewBranch};
    use docvc_store::InMemoryVersionStore;
    use docvc_types::{BranchProtection, BranchStatus, ManualClock};
    use serde_json::json;

    const DOC: &str = "doc-1";

    fn manager() -> (Arc<VersionGraph>, RestorePointManager) {
        let graph = Arc::new(VersionGraph::new(
            Arc::new(InMemoryVersionStore::new()),
            Arc::new(ManualClock::new(1_000)),
            GraphConfig::default(),
        ));
        let manager = RestorePointManager::new(Arc::clone(&graph));
        (graph, manager)
    }

    async fn commit(graph: &VersionGraph, branch: &str, content: serde_json::Value) -> DocumentVersion {
        graph
            .commit(
                DOC,
                "proj-1",
                Value::from(content),
                "ana",
                CreateVersionOptions::new("edit").with_branch(branch),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn rollback_appends_a_version_with_target_content() {
        let (graph, manager) = manager();
        let v1 = commit(&graph, "main", json!({"total": 100})).await;
        commit(&graph, "main", json!({"total": 120})).await;
        let v3 = commit(&graph, "main", json!({"total": 150})).await;
        let before = graph.get_version_history(DOC, Some("main"), None).await.unwrap();

        let id = manager
            .rollback_to_version(DOC, &v1.id, "ana", None)
            .await
            .unwrap();

        let after = graph.get_version_history(DOC, Some("main"), None).await.unwrap();
        assert_eq!(after.len(), before.len() + 1);
        assert!(before.iter().all(|v| after.contains(v)));

        let rollback = graph.get_version(&id).await.unwrap();
        assert_eq!(rollback.content, v1.content);
        assert_eq!(rollback.content_hash, v1.content_hash);
        assert_eq!(rollback.parent_version_id, Some(v3.id));
        assert_eq!(rollback.version_number.to_string(), "1.3");
        assert!(rollback.has_tag(ROLLBACK_TAG));
        assert_eq!(rollback.metadata.trigger_event.as_deref(), Some("rollback"));
        assert_eq!(rollback.commit_message, "Rollback to version 1.0");
    }

    #[tokio::test]
    async fn rollback_checkpoints_the_previous_head() {
        let (graph, manager) = manager();
        let v1 = commit(&graph, "main", json!({"total": 100})).await;
        let v2 = commit(&graph, "main", json!({"total": 120})).await;

        manager
            .rollback_to_version(DOC, &v1.id, "ana", Some("undo"))
            .await
            .unwrap();

        let points = manager.get_restore_points(DOC).await.unwrap();
        assert_eq!(points.len(), 1);
        assert!(points[0].is_automatic);
        assert_eq!(points[0].version_id, v2.id);
    }

    #[tokio::test]
    async fn rollback_stays_on_the_target_branch() {
        let (graph, manager) = manager();
        let base = commit(&graph, "main", json!({"a": 1})).await;
        graph
            .create_branch(NewBranch::new(DOC, "proj-1", "draft", "ana", base.id.clone()))
            .await
            .unwrap();
        let d1 = commit(&graph, "draft", json!({"a": 2})).await;
        commit(&graph, "draft", json!({"a": 3})).await;
        let main_head = graph.get_branch(DOC, "main").await.unwrap().head_version_id;

        let id = manager.rollback_to_version(DOC, &d1.id, "ana", None).await.unwrap();
        let rollback = graph.get_version(&id).await.unwrap();
        assert_eq!(rollback.branch_name, "draft");
        assert_eq!(graph.get_branch(DOC, "main").await.unwrap().head_version_id, main_head);
    }

    #[tokio::test]
    async fn rollback_is_allowed_on_protected_branches() {
        let (graph, manager) = manager();
        let v1 = commit(&graph, "main", json!({"a": 1})).await;
        commit(&graph, "main", json!({"a": 2})).await;
        graph
            .set_branch_protection(
                DOC,
                "main",
                BranchProtection {
                    prevent_direct_push: true,
                    ..BranchProtection::default()
                },
            )
            .await
            .unwrap();

        assert!(manager.rollback_to_version(DOC, &v1.id, "ana", None).await.is_ok());
    }

    #[tokio::test]
    async fn rollback_on_archived_branch_is_rejected() {
        let (graph, manager) = manager();
        let v1 = commit(&graph, "main", json!({"a": 1})).await;
        graph.set_branch_status(DOC, "main", BranchStatus::Archived).await.unwrap();

        let err = manager
            .rollback_to_version(DOC, &v1.id, "ana", None)
            .await
            .unwrap_err();
        assert!(matches!(err, VersionError::BranchLocked { .. }));
    }

    #[tokio::test]
    async fn rollback_to_unknown_version_fails() {
        let (_graph, manager) = manager();
        let err = manager
            .rollback_to_version(DOC, &VersionId::new(), "ana", None)
            .await
            .unwrap_err();
        assert!(matches!(err, VersionError::VersionNotFound(_)));
    }

    #[tokio::test]
    async fn restore_points_list_newest_first() {
        let (graph, manager) = manager();
        let v1 = commit(&graph, "main", json!({"a": 1})).await;
        let v2 = commit(&graph, "main", json!({"a": 2})).await;

        manager
            .create_restore_point(NewRestorePoint::new(DOC, v1.id.clone(), "draft sent", "ana"))
            .await
            .unwrap();
        let second = manager
            .create_restore_point(
                NewRestorePoint::new(DOC, v2.id.clone(), "board review", "ana")
                    .with_description("before board meeting")
                    .with_metadata("meeting", "2026-10-01"),
            )
            .await
            .unwrap();

        let points = manager.get_restore_points(DOC).await.unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0], second);
        assert!(!points[0].is_automatic);
        assert_eq!(points[1].version_id, v1.id);
    }

    #[tokio::test]
    async fn restore_point_for_another_document_is_rejected() {
        let (graph, manager) = manager();
        let v1 = commit(&graph, "main", json!({"a": 1})).await;
        let err = manager
            .create_restore_point(NewRestorePoint::new("doc-2", v1.id, "x", "ana"))
            .await
            .unwrap_err();
        assert!(matches!(err, VersionError::VersionNotFound(_)));
    }
}
