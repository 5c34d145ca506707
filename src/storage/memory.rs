//! In-memory record store

use super::traits::{RecordStore, StorageError, StorageResult};
use crate::record::AnnotationRecord;
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Vec<AnnotationRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-filled with `records`, as if saved earlier.
    pub fn with_records(records: Vec<AnnotationRecord>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }
}

impl RecordStore for MemoryStore {
    fn load(&self) -> StorageResult<Vec<AnnotationRecord>> {
        let records = self.records.lock().map_err(|_| StorageError::LockPoisoned)?;
        Ok(records.clone())
    }

    fn save_all(&self, records: &[AnnotationRecord]) -> StorageResult<()> {
        let mut stored = self.records.lock().map_err(|_| StorageError::LockPoisoned)?;
        *stored = records.to_vec();
        Ok(())
    }

    fn clear(&self) -> StorageResult<()> {
        self.records.lock().map_err(|_| StorageError::LockPoisoned)?.clear();
        Ok(())
    }
}
