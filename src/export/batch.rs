//! Batched export
//!
//! Splits a record set into fixed-size [`LexicalLog`] files named
//! `<stem>_batch_<n>.json` (numbered from 1), plus an optional
//! `<stem>_master.json` holding every record.

use super::{ExportError, ExportResult, LexicalLog};
use crate::record::AnnotationRecord;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub stem: String,
    pub log_title: String,
    pub source_id: String,
    pub batch_size: usize,
    pub include_master: bool,
}

impl BatchOptions {
    pub fn new(stem: impl Into<String>) -> Self {
        let stem = stem.into();
        Self {
            log_title: stem.clone(),
            source_id: stem.clone(),
            stem,
            batch_size: 25,
            include_master: true,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_master(mut self, include_master: bool) -> Self {
        self.include_master = include_master;
        self
    }
}

pub fn batch_file_name(stem: &str, number: usize) -> String {
    format!("{stem}_batch_{number}.json")
}

pub fn master_file_name(stem: &str) -> String {
    format!("{stem}_master.json")
}

/// Write the batch files (and master) into `dir`, returning the paths written.
pub fn write_batches(dir: &Path, records: &[AnnotationRecord], options: &BatchOptions) -> ExportResult<Vec<PathBuf>> {
    if options.batch_size == 0 {
        return Err(ExportError::InvalidBatchSize);
    }

    let batch_count = records.len().div_ceil(options.batch_size);
    let mut written = Vec::with_capacity(batch_count + 1);

    for (i, chunk) in records.chunks(options.batch_size).enumerate() {
        let number = i + 1;
        let log = LexicalLog::new(
            format!("{} (batch {number} of {batch_count})", options.log_title),
            options.source_id.clone(),
            chunk.to_vec(),
        );
        let path = dir.join(batch_file_name(&options.stem, number));
        log.write(&path)?;
        written.push(path);
    }

    if options.include_master {
        let log = LexicalLog::new(options.log_title.clone(), options.source_id.clone(), records.to_vec());
        let path = dir.join(master_file_name(&options.stem));
        log.write(&path)?;
        written.push(path);
    }

    info!(
        batches = batch_count,
        records = records.len(),
        dir = %dir.display(),
        "wrote batched export"
    );
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{ComponentRange, RecordId};

    fn records(n: usize) -> Vec<AnnotationRecord> {
        (0..n)
            .map(|i| {
                AnnotationRecord::new(
                    RecordId::from_string(format!("r{i}")),
                    format!("word{i}"),
                    ComponentRange {
                        start: i * 10,
                        end: i * 10 + 5,
                        text: format!("word{i}"),
                    },
                )
            })
            .collect()
    }

    #[test]
    fn splits_into_batches_plus_master() {
        let dir = tempfile::tempdir().unwrap();
        let options = BatchOptions::new("vocab").with_batch_size(25);
        let written = write_batches(dir.path(), &records(60), &options).unwrap();

        let names: Vec<_> = written
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec!["vocab_batch_1.json", "vocab_batch_2.json", "vocab_batch_3.json", "vocab_master.json"]
        );

        let last = LexicalLog::read(&written[2], 0).unwrap();
        assert_eq!(last.total_items, 10);
        let master = LexicalLog::read(&written[3], 0).unwrap();
        assert_eq!(master.total_items, 60);
    }

    #[test]
    fn master_is_optional() {
        let dir = tempfile::tempdir().unwrap();
        let options = BatchOptions::new("v").with_batch_size(2).with_master(false);
        let written = write_batches(dir.path(), &records(2), &options).unwrap();
        assert_eq!(written.len(), 1);
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let options = BatchOptions::new("v").with_batch_size(0);
        assert!(matches!(
            write_batches(dir.path(), &records(1), &options),
            Err(ExportError::InvalidBatchSize)
        ));
    }
}
