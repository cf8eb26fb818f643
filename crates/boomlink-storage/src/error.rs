use thiserror::Error;

/// Storage-specific error types for the datastore gateway.
///
/// Every variant is recoverable from the caller's point of view: triggers
/// log the error and take the fail-closed branch.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database connection or query execution failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The connection descriptor cannot be turned into a connection URL
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Opening the connection or running a statement took longer than its bound
    #[error("Timed out after {0}ms")]
    Timeout(u64),
}

/// Specialized result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
