//! Single-file JSON record store

use super::traits::{RecordStore, StorageError, StorageResult};
use crate::export::LexicalLog;
use crate::record::AnnotationRecord;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// Keeps the record set as one [`LexicalLog`] document.
///
/// Loading normalizes every stored item, so files written by older versions
/// read back in canonical shape. Saving replaces the file in one rename.
pub struct JsonFileStore {
    path: PathBuf,
    log_title: String,
    source_id: String,
    // Serializes writers within the process
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            path,
            log_title: stem.clone(),
            source_id: stem,
            write_lock: Mutex::new(()),
        }
    }

    pub fn with_title(mut self, log_title: impl Into<String>, source_id: impl Into<String>) -> Self {
        self.log_title = log_title.into();
        self.source_id = source_id.into();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordStore for JsonFileStore {
    fn load(&self) -> StorageResult<Vec<AnnotationRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let log = LexicalLog::read(&self.path, 0)?;
        debug!(path = %self.path.display(), count = log.lexical_items.len(), "loaded records");
        Ok(log.lexical_items)
    }

    fn save_all(&self, records: &[AnnotationRecord]) -> StorageResult<()> {
        let _guard = self.write_lock.lock().map_err(|_| StorageError::LockPoisoned)?;
        LexicalLog::new(self.log_title.clone(), self.source_id.clone(), records.to_vec()).write(&self.path)?;
        Ok(())
    }

    fn clear(&self) -> StorageResult<()> {
        self.save_all(&[])
    }
}
