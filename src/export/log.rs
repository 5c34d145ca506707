//! The persisted lexical-log document

use super::{ExportError, ExportResult};
use crate::record::{normalize_records, AnnotationRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Format version written into `migrationInfo`.
pub const LOG_FORMAT_VERSION: &str = "2.0";

/// Which transform a migration applied to a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MigrationType {
    /// Items had numeric ids and were rebuilt from the oldest shape
    LegacyToCanonical,
    /// Items were already keyed by string ids and only re-normalized
    Renormalize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationInfo {
    pub migrated_at: DateTime<Utc>,
    pub version: String,
    pub original_count: usize,
    pub migrated_count: usize,
    pub migration_type: MigrationType,
}

/// `{logTitle, sourceId, totalItems, lexicalItems, migrationInfo?}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LexicalLog {
    #[serde(default)]
    pub log_title: String,
    #[serde(default)]
    pub source_id: String,
    #[serde(default)]
    pub total_items: usize,
    #[serde(default)]
    pub lexical_items: Vec<AnnotationRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub migration_info: Option<MigrationInfo>,
}

impl LexicalLog {
    pub fn new(log_title: impl Into<String>, source_id: impl Into<String>, records: Vec<AnnotationRecord>) -> Self {
        Self {
            log_title: log_title.into(),
            source_id: source_id.into(),
            total_items: records.len(),
            lexical_items: records,
            migration_info: None,
        }
    }

    pub fn with_migration_info(mut self, info: MigrationInfo) -> Self {
        self.migration_info = Some(info);
        self
    }

    /// True if `value` looks like a log document: an object with an
    /// array under `lexicalItems`.
    pub fn is_log_document(value: &Value) -> bool {
        matches!(value.get("lexicalItems"), Some(Value::Array(_)))
    }

    /// Build a log from a parsed document, normalizing every item whatever
    /// its stored shape. `totalItems` is recomputed.
    pub fn from_value(value: &Value, batch_index: usize) -> Self {
        let text = |key: &str| match value.get(key) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        };
        let items = match value.get("lexicalItems") {
            Some(Value::Array(items)) => normalize_records(items, batch_index),
            _ => Vec::new(),
        };
        let migration_info = value
            .get("migrationInfo")
            .and_then(|info| serde_json::from_value(info.clone()).ok());

        Self {
            migration_info,
            ..Self::new(text("logTitle"), text("sourceId"), items)
        }
    }

    /// Read and normalize a log file.
    pub fn read(path: &Path, batch_index: usize) -> ExportResult<Self> {
        let contents = fs::read_to_string(path).map_err(|source| ExportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let value: Value = serde_json::from_str(&contents)?;
        Ok(Self::from_value(&value, batch_index))
    }

    /// Write the log as pretty JSON, replacing the file in one rename.
    pub fn write(&self, path: &Path) -> ExportResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        write_replacing(path, json.as_bytes())
    }
}

/// Write `contents` to a sibling temp file, then rename it over `path`.
pub fn write_replacing(path: &Path, contents: &[u8]) -> ExportResult<()> {
    let io_err = |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("log.json");
    let tmp = path.with_file_name(format!(".{file_name}.tmp"));

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    fs::write(&tmp, contents).map_err(io_err)?;
    fs::rename(&tmp, path).map_err(io_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp_millis(1_700_000_000_000).unwrap()
    }

    #[test]
    fn reads_mixed_item_shapes() {
        let doc = json!({
            "logTitle": "Reading log",
            "sourceId": "book-1",
            "totalItems": 99,
            "lexicalItems": [
                {"id": 1, "text": "come across", "context": "I came across it."},
                {"id": "rec-2", "targetLexeme": "put off",
                 "componentRanges": [{"start": 0, "end": 7, "text": "put off"}]},
                "garbage"
            ]
        });
        let log = LexicalLog::from_value(&doc, 0);
        assert_eq!(log.log_title, "Reading log");
        assert_eq!(log.total_items, 2);
        assert_eq!(log.lexical_items[1].id.as_str(), "rec-2");
        assert!(log.migration_info.is_none());
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let log = LexicalLog::new("t", "s", Vec::new()).with_migration_info(MigrationInfo {
            migrated_at: now(),
            version: LOG_FORMAT_VERSION.into(),
            original_count: 3,
            migrated_count: 2,
            migration_type: MigrationType::LegacyToCanonical,
        });
        let value = serde_json::to_value(&log).unwrap();
        assert_eq!(value["totalItems"], 0);
        assert_eq!(value["migrationInfo"]["migrationType"], "legacy-to-canonical");
        assert_eq!(value["migrationInfo"]["originalCount"], 3);
    }

    #[test]
    fn write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("log.json");
        let log = LexicalLog::new("t", "s", Vec::new());
        log.write(&path).unwrap();
        assert!(!dir.path().join("out").join(".log.json.tmp").exists());

        let back = LexicalLog::read(&path, 0).unwrap();
        assert_eq!(back, log);
    }

    #[test]
    fn numeric_source_id_survives_reading() {
        let doc = json!({"logTitle": "Week 3", "sourceId": 42, "lexicalItems": []});
        let log = LexicalLog::from_value(&doc, 0);
        assert_eq!(log.source_id, "42");
        assert_eq!(log.log_title, "Week 3");
    }

    #[test]
    fn detects_log_documents() {
        assert!(LexicalLog::is_log_document(&json!({"lexicalItems": []})));
        assert!(!LexicalLog::is_log_document(&json!({"items": []})));
        assert!(!LexicalLog::is_log_document(&json!([1, 2])));
    }
}
