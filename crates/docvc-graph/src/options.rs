//! Arguments for version and branch creation.

use std::collections::BTreeSet;

use docvc_types::VersionId;

/// Which operation a write comes from. Protected branches accept only
/// merge and rollback writes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WriteOrigin {
    #[default]
    Direct,
    Merge,
    Rollback,
}

impl WriteOrigin {
    /// The trigger event recorded when the caller supplies none.
    pub fn default_trigger(&self) -> Option<&'static str> {
        match self {
            WriteOrigin::Direct => None,
            WriteOrigin::Merge => Some("merge"),
            WriteOrigin::Rollback => Some("rollback"),
        }
    }
}

/// Options for [`VersionGraph::create_version`](crate::VersionGraph::create_version).
#[derive(Clone, Debug, Default)]
pub struct CreateVersionOptions {
    pub commit_message: String,
    /// Defaults to the configured default branch.
    pub branch_name: Option<String>,
    /// Expected parent. When set and the branch head differs, the write
    /// fails with `HeadConflict` instead of retrying.
    pub parent_version_id: Option<VersionId>,
    pub tags: BTreeSet<String>,
    pub is_snapshot: bool,
    pub trigger_event: Option<String>,
    pub merged_from: Option<VersionId>,
    pub origin: WriteOrigin,
}

impl CreateVersionOptions {
    pub fn new(commit_message: impl Into<String>) -> Self {
        Self {
            commit_message: commit_message.into(),
            ..Self::default()
        }
    }

    pub fn with_branch(mut self, name: impl Into<String>) -> Self {
        self.branch_name = Some(name.into());
        self
    }

    pub fn with_parent(mut self, parent: VersionId) -> Self {
        self.parent_version_id = Some(parent);
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn as_snapshot(mut self) -> Self {
        self.is_snapshot = true;
        self
    }

    pub fn with_trigger(mut self, event: impl Into<String>) -> Self {
        self.trigger_event = Some(event.into());
        self
    }

    pub fn with_merged_from(mut self, source_head: VersionId) -> Self {
        self.merged_from = Some(source_head);
        self
    }

    pub fn with_origin(mut self, origin: WriteOrigin) -> Self {
        self.origin = origin;
        self
    }

    pub(crate) fn effective_trigger(&self) -> Option<String> {
        self.trigger_event
            .clone()
            .or_else(|| self.origin.default_trigger().map(str::to_string))
    }
}

/// Arguments for [`VersionGraph::create_branch`](crate::VersionGraph::create_branch).
#[derive(Clone, Debug)]
pub struct NewBranch {
    pub document_id: String,
    pub project_id: String,
    pub name: String,
    /// Defaults to `name`.
    pub display_name: Option<String>,
    pub author: String,
    pub base_version_id: VersionId,
    pub description: Option<String>,
}

impl NewBranch {
    pub fn new(
        document_id: impl Into<String>,
        project_id: impl Into<String>,
        name: impl Into<String>,
        author: impl Into<String>,
        base_version_id: VersionId,
    ) -> Self {
        Self {
            document_id: document_id.into(),
            project_id: project_id.into(),
            name: name.into(),
            display_name: None,
            author: author.into(),
            base_version_id,
            description: None,
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}
