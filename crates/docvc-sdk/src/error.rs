use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error(transparent)]
    Version(#[from] docvc_graph::VersionError),

    #[error("store error: {0}")]
    Store(#[from] docvc_store::StoreError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SdkError {
    /// The version-graph error behind this one, if any.
    pub fn as_version_error(&self) -> Option<&docvc_graph::VersionError> {
        match self {
            SdkError::Version(e) => Some(e),
            _ => None,
        }
    }
}

pub type SdkResult<T> = Result<T, SdkError>;
