use docvc_diff::DiffError;
use docvc_store::StoreError;

/// Errors from version graph operations.
#[derive(Debug, thiserror::Error)]
pub enum VersionError {
    #[error("branch not found: {0}")]
    BranchNotFound(String),

    #[error("version not found: {0}")]
    VersionNotFound(String),

    #[error("branch already exists: {0}")]
    BranchAlreadyExists(String),

    /// The branch head moved while a write was in flight. Re-read the head
    /// and retry.
    #[error("head of branch {branch} moved away from {expected}")]
    HeadConflict { branch: String, expected: String },

    #[error("invalid branch name {name:?}: {reason}")]
    InvalidBranchName { name: String, reason: String },

    /// The branch refuses this write (archived, protected, or restricted).
    #[error("branch {branch} rejects the write: {reason}")]
    BranchLocked { branch: String, reason: String },

    #[error("invalid version number: {0}")]
    InvalidVersionNumber(String),

    /// A stored version's hash or change set does not reconcile with its
    /// content.
    #[error("integrity check failed for version {version}: {reason}")]
    IntegrityMismatch { version: String, reason: String },

    #[error("diff error: {0}")]
    Diff(#[from] DiffError),

    #[error("storage failure: {0}")]
    Storage(#[from] StoreError),
}

/// Convenience alias for version graph results.
pub type VersionResult<T> = Result<T, VersionError>;
