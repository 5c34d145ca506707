//! Storage trait definitions

use crate::record::AnnotationRecord;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Log file error: {0}")]
    Log(#[from] crate::export::ExportError),

    #[error("Store lock poisoned")]
    LockPoisoned,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Repository for the persisted record set
///
/// The set is always read and written as a whole; there are no per-record
/// operations. Implementations must be thread-safe (Send + Sync).
pub trait RecordStore: Send + Sync {
    /// Read every stored record, in stored order
    fn load(&self) -> StorageResult<Vec<AnnotationRecord>>;

    /// Replace the stored set with `records`
    fn save_all(&self, records: &[AnnotationRecord]) -> StorageResult<()>;

    /// Remove every stored record
    fn clear(&self) -> StorageResult<()>;
}

/// Extension trait for opening stores from paths
pub trait OpenStore: RecordStore + Sized {
    /// Open or create a store at the given path
    fn open(path: impl AsRef<Path>) -> StorageResult<Self>;

    /// Create an in-memory store (useful for testing)
    fn open_in_memory() -> StorageResult<Self>;
}
