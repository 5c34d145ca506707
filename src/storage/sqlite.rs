//! SQLite storage backend for annotation records

use super::traits::{OpenStore, RecordStore, StorageError, StorageResult};
use crate::record::AnnotationRecord;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// SQLite-backed record store
///
/// One `records` table keyed by record id holds each record as JSON, with a
/// `position` column preserving collection order. Thread-safe via internal
/// mutex on the connection.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    fn init_schema(conn: &Connection) -> StorageResult<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS records (
                id TEXT PRIMARY KEY,
                position INTEGER NOT NULL,
                target_lexeme TEXT NOT NULL,
                created_at TEXT,
                record_json TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_records_position
                ON records(position);

            PRAGMA journal_mode = WAL;
            "#,
        )?;
        Ok(())
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }

    fn record_to_row(record: &AnnotationRecord) -> StorageResult<(String, String, Option<String>, String)> {
        Ok((
            record.id.to_string(),
            record.target_lexeme.clone(),
            record.created_at.map(|t| t.to_rfc3339()),
            serde_json::to_string(record)?,
        ))
    }
}

impl OpenStore for SqliteStore {
    fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;

        Ok(Self { conn: Mutex::new(conn) })
    }

    fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;

        Ok(Self { conn: Mutex::new(conn) })
    }
}

impl RecordStore for SqliteStore {
    fn load(&self) -> StorageResult<Vec<AnnotationRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT record_json FROM records ORDER BY position")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut records = Vec::new();
        for json in rows {
            records.push(serde_json::from_str(&json?)?);
        }
        Ok(records)
    }

    fn save_all(&self, records: &[AnnotationRecord]) -> StorageResult<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM records", [])?;
        {
            let mut insert = tx.prepare(
                r#"
                INSERT INTO records (id, position, target_lexeme, created_at, record_json)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )?;
            for (position, record) in records.iter().enumerate() {
                let (id, target, created_at, json) = Self::record_to_row(record)?;
                insert.execute(params![id, position as i64, target, created_at, json])?;
            }
        }
        tx.commit()?;
        debug!(count = records.len(), "saved records to sqlite");
        Ok(())
    }

    fn clear(&self) -> StorageResult<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM records", [])?;
        Ok(())
    }
}
