//! Directory-tree migration of stored lexical logs
//!
//! Every `.json` file under the root that holds a `lexicalItems` array is
//! rewritten in canonical shape with a `migrationInfo` block, after a `.bak`
//! copy of the original is made. Files that fail are reported and skipped;
//! only a missing root stops the run.

use crate::export::{ExportError, LexicalLog, MigrationInfo, MigrationType, LOG_FORMAT_VERSION};
use crate::record::is_legacy_record;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

pub const BACKUP_EXTENSION: &str = "bak";

/// Fatal migration errors
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Migration root does not exist: {0}")]
    RootMissing(PathBuf),
}

pub type MigrationResult<T> = Result<T, MigrationError>;

/// Per-file failures, collected into the report
#[derive(Debug, Error)]
pub enum FileError {
    #[error("cannot read: {0}")]
    Read(#[from] std::io::Error),

    #[error("invalid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("cannot write backup {path}: {source}")]
    Backup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write: {0}")]
    Write(#[from] ExportError),

    #[error("cannot walk: {0}")]
    Walk(#[from] walkdir::Error),
}

#[derive(Debug, Clone)]
pub struct MigrationOptions {
    /// Report what would change without touching any file
    pub dry_run: bool,
    pub now: DateTime<Utc>,
}

impl MigrationOptions {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { dry_run: false, now }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub migration_type: MigrationType,
    pub original_count: usize,
    pub migrated_count: usize,
    /// `None` on dry runs
    pub backup: Option<PathBuf>,
}

#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: FileError,
}

#[derive(Debug, Default)]
pub struct MigrationReport {
    pub dry_run: bool,
    pub files_scanned: usize,
    /// JSON files that were not log documents
    pub files_skipped: usize,
    pub migrated: Vec<FileOutcome>,
    pub failures: Vec<FileFailure>,
}

impl MigrationReport {
    pub fn records_before(&self) -> usize {
        self.migrated.iter().map(|o| o.original_count).sum()
    }

    pub fn records_after(&self) -> usize {
        self.migrated.iter().map(|o| o.migrated_count).sum()
    }

    pub fn summary(&self) -> String {
        format!(
            "{}{} files scanned, {} migrated, {} skipped, {} failed; {} records in, {} records out",
            if self.dry_run { "[dry run] " } else { "" },
            self.files_scanned,
            self.migrated.len(),
            self.files_skipped,
            self.failures.len(),
            self.records_before(),
            self.records_after(),
        )
    }
}

/// Migrate every log document under `root`.
pub fn migrate_directory(root: &Path, options: &MigrationOptions) -> MigrationResult<MigrationReport> {
    if !root.is_dir() {
        return Err(MigrationError::RootMissing(root.to_path_buf()));
    }
    info!(root = %root.display(), dry_run = options.dry_run, "starting migration");

    let mut report = MigrationReport {
        dry_run: options.dry_run,
        ..Default::default()
    };

    let mut file_index = 0;
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                let path = err.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
                warn!(path = %path.display(), "skipping unreadable entry: {}", err);
                report.failures.push(FileFailure { path, error: err.into() });
                continue;
            }
        };
        let path = entry.path();
        if !entry.file_type().is_file() || !is_candidate(path) {
            continue;
        }

        report.files_scanned += 1;
        match migrate_file(path, file_index, options) {
            Ok(Some(outcome)) => {
                debug!(
                    path = %path.display(),
                    kind = ?outcome.migration_type,
                    before = outcome.original_count,
                    after = outcome.migrated_count,
                    "migrated file"
                );
                report.migrated.push(outcome);
            }
            Ok(None) => report.files_skipped += 1,
            Err(error) => {
                warn!(path = %path.display(), "migration failed: {}", error);
                report.failures.push(FileFailure {
                    path: path.to_path_buf(),
                    error,
                });
            }
        }
        file_index += 1;
    }

    info!("{}", report.summary());
    Ok(report)
}

/// Migrate one file. `Ok(None)` means the file is not a log document.
pub fn migrate_file(path: &Path, file_index: usize, options: &MigrationOptions) -> Result<Option<FileOutcome>, FileError> {
    let contents = fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&contents)?;
    if !LexicalLog::is_log_document(&value) {
        return Ok(None);
    }

    let items = value
        .get("lexicalItems")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    let migration_type = if items.iter().any(is_legacy_record) {
        MigrationType::LegacyToCanonical
    } else {
        MigrationType::Renormalize
    };

    let log = LexicalLog::from_value(&value, file_index);
    let info = MigrationInfo {
        migrated_at: options.now,
        version: LOG_FORMAT_VERSION.to_string(),
        original_count: items.len(),
        migrated_count: log.lexical_items.len(),
        migration_type,
    };
    let log = log.with_migration_info(info);

    let backup = if options.dry_run {
        None
    } else {
        let backup = backup_path(path);
        fs::write(&backup, &contents).map_err(|source| FileError::Backup {
            path: backup.clone(),
            source,
        })?;
        log.write(path)?;
        Some(backup)
    };

    Ok(Some(FileOutcome {
        path: path.to_path_buf(),
        migration_type,
        original_count: items.len(),
        migrated_count: log.lexical_items.len(),
        backup,
    }))
}

/// `<file>.json` becomes `<file>.json.bak`.
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".");
    name.push(BACKUP_EXTENSION);
    path.with_file_name(name)
}

fn is_candidate(path: &Path) -> bool {
    let hidden = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'));
    !hidden && path.extension().is_some_and(|ext| ext == "json")
}
