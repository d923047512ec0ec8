//! Error types for the diff crate.

use docvc_types::{ChangeKind, TypeError, ValuePath};

/// Errors that can occur while replaying a change set.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// A change addressed a path the value does not have.
    #[error("cannot apply {kind} at {path}: {source}")]
    Apply {
        kind: ChangeKind,
        path: ValuePath,
        #[source]
        source: TypeError,
    },

    /// A create, update, move, or rename carried no new value.
    #[error("{kind} at {path} has no new value")]
    MissingValue { kind: ChangeKind, path: ValuePath },

    /// A move or rename carried no source path.
    #[error("{kind} at {path} has no source path")]
    MissingSource { kind: ChangeKind, path: ValuePath },
}

/// Convenience alias for diff results.
pub type DiffResult<T> = Result<T, DiffError>;
