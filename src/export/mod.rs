//! Record export: the persisted log document, flat formats and batched files

mod batch;
mod format;
mod log;

pub use batch::{batch_file_name, master_file_name, write_batches, BatchOptions};
pub use format::{export_csv, export_json, export_text, render, ExportFormat};
pub use log::{write_replacing, LexicalLog, MigrationInfo, MigrationType, LOG_FORMAT_VERSION};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Batch size must be at least 1")]
    InvalidBatchSize,
}

pub type ExportResult<T> = Result<T, ExportError>;
