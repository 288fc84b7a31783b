use thiserror::Error;

/// Result type for snapshot storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Snapshot storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("snapshot not found: {0}")]
    NotFound(String),

    #[error("digest mismatch for {key}: stored {stored}, computed {computed}")]
    DigestMismatch {
        key: String,
        stored: String,
        computed: String,
    },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}
