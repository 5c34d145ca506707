//! Storage backends for annotation records
//!
//! Every backend implements [`RecordStore`]: load the whole set, replace the
//! whole set, or clear it. `SqliteStore` is the persistent default,
//! `JsonFileStore` keeps a single exportable log document and `MemoryStore`
//! backs tests and throwaway sessions.

mod json;
mod memory;
mod sqlite;
mod traits;

pub use json::JsonFileStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{OpenStore, RecordStore, StorageError, StorageResult};
