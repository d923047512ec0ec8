//! Equality-filter queries over stored versions.

use docvc_types::DocumentVersion;

/// Timestamp order of query results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum QueryOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

/// Versions of one document, optionally restricted to a branch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VersionQuery {
    pub document_id: String,
    pub branch_name: Option<String>,
    pub order: QueryOrder,
    pub limit: Option<usize>,
}

impl VersionQuery {
    /// All versions of `document_id`, newest first.
    pub fn document(document_id: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            branch_name: None,
            order: QueryOrder::NewestFirst,
            limit: None,
        }
    }

    pub fn branch(mut self, name: impl Into<String>) -> Self {
        self.branch_name = Some(name.into());
        self
    }

    pub fn order(mut self, order: QueryOrder) -> Self {
        self.order = order;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Returns `true` if `version` passes the equality filters.
    pub fn matches(&self, version: &DocumentVersion) -> bool {
        version.document_id == self.document_id
            && self
                .branch_name
                .as_ref()
                .map_or(true, |name| &version.branch_name == name)
    }

    /// Sort and truncate already-filtered results.
    pub fn finish(&self, mut versions: Vec<DocumentVersion>) -> Vec<DocumentVersion> {
        match self.order {
            QueryOrder::NewestFirst => versions.sort_by(|a, b| b.timestamp.cmp(&a.timestamp)),
            QueryOrder::OldestFirst => versions.sort_by(|a, b| a.timestamp.cmp(&b.timestamp)),
        }
        if let Some(limit) = self.limit {
            versions.truncate(limit);
        }
        versions
    }
}
