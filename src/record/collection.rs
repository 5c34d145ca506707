//! In-process record collection
//!
//! Mutations never edit the current vector in place: each one builds the
//! next vector and swaps it in, so a [`RecordCollection::snapshot`] taken
//! before a mutation keeps seeing a complete, consistent set.

use super::id::RecordId;
use super::types::{AnnotationRecord, RecordError};
use crate::span::TextRange;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default)]
pub struct RecordCollection {
    records: Arc<Vec<AnnotationRecord>>,
}

impl RecordCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap records read from storage.
    ///
    /// Stored records are kept even when they break a schema invariant; the
    /// violation is logged.
    pub fn from_records(records: Vec<AnnotationRecord>) -> Self {
        for record in &records {
            if let Err(err) = record.validate() {
                warn!(id = %record.id, "loaded record is invalid: {}", err);
            }
        }
        Self {
            records: Arc::new(records),
        }
    }

    /// Wrap records read from storage, dropping those past `retention`.
    pub fn load(records: Vec<AnnotationRecord>, retention: Option<Duration>, now: DateTime<Utc>) -> Self {
        Self::from_records(evict_expired(records, retention, now))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AnnotationRecord> {
        self.records.iter()
    }

    pub fn get(&self, id: &RecordId) -> Option<&AnnotationRecord> {
        self.records.iter().find(|r| &r.id == id)
    }

    /// The current set; unaffected by later mutations.
    pub fn snapshot(&self) -> Arc<Vec<AnnotationRecord>> {
        Arc::clone(&self.records)
    }

    pub fn to_vec(&self) -> Vec<AnnotationRecord> {
        self.records.as_ref().clone()
    }

    /// First record with a run intersecting `range`.
    pub fn find_overlapping(&self, range: &TextRange) -> Option<&AnnotationRecord> {
        self.records.iter().find(|r| r.overlaps(range))
    }

    /// Append a record after checking its invariants and id uniqueness.
    pub fn add(&mut self, record: AnnotationRecord) -> Result<(), RecordError> {
        record.validate()?;
        if self.get(&record.id).is_some() {
            return Err(RecordError::DuplicateId(record.id));
        }
        let mut next = Vec::with_capacity(self.records.len() + 1);
        next.extend(self.records.iter().cloned());
        next.push(record);
        self.swap(next);
        Ok(())
    }

    /// Remove by id, returning the removed record.
    pub fn remove(&mut self, id: &RecordId) -> Option<AnnotationRecord> {
        let removed = self.get(id).cloned()?;
        let next = self.records.iter().filter(|r| &r.id != id).cloned().collect();
        self.swap(next);
        Some(removed)
    }

    pub fn clear(&mut self) {
        self.swap(Vec::new());
    }

    /// Replace the whole set, as a bulk rewrite does.
    pub fn replace_all(&mut self, records: Vec<AnnotationRecord>) {
        self.swap(records);
    }

    fn swap(&mut self, next: Vec<AnnotationRecord>) {
        debug!(from = self.records.len(), to = next.len(), "record collection replaced");
        self.records = Arc::new(next);
    }
}

/// Drop records whose `createdAt` is older than `retention`.
///
/// `None` disables eviction. Records without a timestamp are kept.
pub fn evict_expired(
    records: Vec<AnnotationRecord>,
    retention: Option<Duration>,
    now: DateTime<Utc>,
) -> Vec<AnnotationRecord> {
    let Some(retention) = retention else {
        return records;
    };
    let before = records.len();
    let kept: Vec<_> = records
        .into_iter()
        .filter(|r| match r.created_at {
            Some(created) => now.signed_duration_since(created) <= retention,
            None => true,
        })
        .collect();
    if kept.len() < before {
        debug!(evicted = before - kept.len(), "evicted expired records");
    }
    kept
}
