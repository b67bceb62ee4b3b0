use thiserror::Error;

/// Storage-specific error types for the Doorman node.
///
/// These errors represent failures of the key-value backends and of the
/// fixed-size record codec.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database connection or query execution failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration execution failed
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Stored bytes do not decode to a valid record
    #[error("Corrupt record {key}: {reason}")]
    CorruptRecord { key: String, reason: String },

    /// Namespace counter reached its ceiling
    #[error("Namespace {namespace} is full ({capacity} records)")]
    Full {
        namespace: &'static str,
        capacity: usize,
    },

    /// Failure injected by the in-memory store
    #[error("Injected failure: {0}")]
    Injected(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl StorageError {
    pub(crate) fn corrupt(key: &str, reason: impl Into<String>) -> Self {
        Self::CorruptRecord {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<StorageError> for doorman_core::Error {
    fn from(error: StorageError) -> Self {
        doorman_core::Error::StorageIo(error.to_string())
    }
}

/// Specialized result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
