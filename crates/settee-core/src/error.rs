use crate::document::Revision;

/// Low-level document store errors (RocksDB, serialization, missing databases).
/// This is the error type for the `DocumentStore` trait. Store operations only
/// fail with infrastructure errors; queue semantics live in `QueueError`.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("rocksdb error: {0}")]
    RocksDb(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("database not found: {0}")]
    DatabaseNotFound(String),

    #[error("database already exists: {0}")]
    DatabaseExists(String),

    #[error("view not found: {0}")]
    ViewNotFound(String),

    #[error("view has no reducer: {0}")]
    NotReducible(String),

    #[error("document not found: {0}")]
    DocumentNotFound(String),

    #[error("revision conflict on {id}: expected {expected}, found {actual}")]
    Conflict {
        id: String,
        expected: Revision,
        actual: Revision,
    },

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("store task failed: {0}")]
    Task(String),

    #[error("store write lock poisoned")]
    LockPoisoned,
}

impl From<rocksdb::Error> for StoreError {
    fn from(err: rocksdb::Error) -> Self {
        StoreError::RocksDb(err.into_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

impl From<tokio::task::JoinError> for StoreError {
    fn from(err: tokio::task::JoinError) -> Self {
        StoreError::Task(err.to_string())
    }
}

/// Errors surfaced by work queue operations.
///
/// `EmptyQueue` and `ItemNotFound` are recoverable by the caller. `Store`
/// carries the underlying adapter failure unmodified; the queue never retries.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("no items queued in {0}")]
    EmptyQueue(String),

    #[error("item not found: {0}")]
    ItemNotFound(String),

    #[error("item {0} was modified concurrently")]
    Conflict(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl QueueError {
    /// True for failures the caller may retry later without changing anything.
    pub fn is_retryable(&self) -> bool {
        matches!(self, QueueError::EmptyQueue(_) | QueueError::Conflict(_))
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
pub type Result<T> = std::result::Result<T, QueueError>;
