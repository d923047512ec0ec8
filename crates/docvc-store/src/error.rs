use docvc_types::VersionId;

/// Errors from version store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A version with this id is already stored.
    #[error("version already stored: {0}")]
    DuplicateVersion(VersionId),

    /// A branch with this name already exists for the document.
    #[error("branch already exists: {document_id}/{name}")]
    DuplicateBranch { document_id: String, name: String },

    /// The branch addressed by an update does not exist.
    #[error("branch not found: {document_id}/{name}")]
    BranchNotFound { document_id: String, name: String },

    /// A lock guarding store state was poisoned by a panicking writer.
    #[error("store lock poisoned")]
    LockPoisoned,

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
