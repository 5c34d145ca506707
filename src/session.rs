//! Annotation session
//!
//! An [`AnnotationSession`] joins one flattened document with the selection
//! tracker, the automatic matcher and the record collection, and writes the
//! collection through to an optional [`RecordStore`] after every change.
//! Time is passed in by the caller so that the dedup window and retention are
//! deterministic under test.

use crate::config::EngineConfig;
use crate::record::{AnnotationRecord, ComponentRange, RecordCollection, RecordError, RecordId};
use crate::selection::{extract_context, FlatDocument, SelectionTracker, TrackerState, WordClick};
use crate::span::{AutoAnnotator, LexicalPattern, MatchSpan, Segment, TextRange};
use crate::storage::{RecordStore, StorageError};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Record error: {0}")]
    Record(#[from] RecordError),
}

pub type SessionResult<T> = Result<T, SessionError>;

/// What became of a manual selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionOutcome {
    Created(RecordId),
    /// Nothing locatable was selected, or the same text was just accepted
    Suppressed,
    /// The selection intersects this existing record
    Overlapping(RecordId),
}

impl SelectionOutcome {
    pub fn created(&self) -> Option<&RecordId> {
        match self {
            SelectionOutcome::Created(id) => Some(id),
            _ => None,
        }
    }
}

pub struct AnnotationSession {
    config: EngineConfig,
    document: FlatDocument,
    tracker: SelectionTracker,
    annotator: AutoAnnotator,
    records: RecordCollection,
    store: Option<Arc<dyn RecordStore>>,
    batch_index: usize,
    next_item: usize,
}

impl AnnotationSession {
    /// A session with no backing store and no patterns.
    pub fn new(document: FlatDocument, config: EngineConfig) -> Self {
        Self {
            tracker: SelectionTracker::new(&config),
            config,
            document,
            annotator: AutoAnnotator::new(&[]),
            records: RecordCollection::new(),
            store: None,
            batch_index: 0,
            next_item: 0,
        }
    }

    /// A session backed by `store`, starting from its records minus those
    /// past the retention window.
    pub fn open(
        document: FlatDocument,
        config: EngineConfig,
        store: Arc<dyn RecordStore>,
        now: DateTime<Utc>,
    ) -> SessionResult<Self> {
        let stored = store.load()?;
        let records = RecordCollection::load(stored, config.retention(), now);
        info!(records = records.len(), "opened annotation session");

        let mut session = Self::new(document, config);
        session.next_item = records.len();
        session.records = records;
        session.store = Some(store);
        Ok(session)
    }

    pub fn with_patterns(mut self, patterns: &[LexicalPattern]) -> Self {
        self.set_patterns(patterns);
        self
    }

    /// Distinguishes ids generated by concurrent sessions over the same store.
    pub fn with_batch_index(mut self, batch_index: usize) -> Self {
        self.batch_index = batch_index;
        self
    }

    pub fn set_patterns(&mut self, patterns: &[LexicalPattern]) {
        self.annotator = AutoAnnotator::new(patterns);
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn document(&self) -> &FlatDocument {
        &self.document
    }

    pub fn records(&self) -> &RecordCollection {
        &self.records
    }

    pub fn tracker(&self) -> &SelectionTracker {
        &self.tracker
    }

    pub fn state(&self) -> TrackerState {
        self.tracker.state()
    }

    // === Manual selection ===

    pub fn click(&mut self, event: WordClick) -> TrackerState {
        self.tracker.click(event, &self.document)
    }

    pub fn cancel(&mut self) {
        self.tracker.cancel();
    }

    /// Turn the pending picks into one record.
    ///
    /// Only a selection that is stored opens the duplicate window; one
    /// rejected as overlapping does not.
    pub fn finalize(&mut self, now: DateTime<Utc>) -> SessionResult<SelectionOutcome> {
        let Some(selection) = self.tracker.finalize(&self.document, now) else {
            return Ok(SelectionOutcome::Suppressed);
        };
        let Some(extent) = selection.extent() else {
            return Ok(SelectionOutcome::Suppressed);
        };
        if let Some(existing) = self.overlapping(&selection.runs.iter().map(|r| r.range).collect::<Vec<_>>()) {
            return Ok(SelectionOutcome::Overlapping(existing));
        }
        self.tracker.accept(&selection.text, now);

        let context = self.context_for(extent);
        let id = self.next_id(&selection.text, &context, now);
        let record = AnnotationRecord::from_selection(id.clone(), &selection, context, now);
        self.insert(record)?;
        Ok(SelectionOutcome::Created(id))
    }

    /// Record a dragged text selection.
    ///
    /// `range` is the resolved selection in document coordinates; when the
    /// anchor was lost it is `None` and the text is searched for instead,
    /// starting in `paragraph_hint`.
    pub fn select_text(
        &mut self,
        text: &str,
        range: Option<TextRange>,
        paragraph_hint: Option<usize>,
        now: DateTime<Utc>,
    ) -> SessionResult<SelectionOutcome> {
        self.tracker.cancel();

        let text = text.trim();
        let range = range
            .filter(|r| !r.is_empty() && self.document.slice(*r).is_some())
            .or_else(|| self.document.find_word(text, paragraph_hint));
        let Some(range) = range else {
            warn!(text, "dragged selection could not be located");
            return Ok(SelectionOutcome::Suppressed);
        };

        if self.tracker.is_recent_duplicate(text, now) {
            debug!(text, "suppressing repeated drag selection");
            return Ok(SelectionOutcome::Suppressed);
        }
        if let Some(existing) = self.overlapping(&[range]) {
            return Ok(SelectionOutcome::Overlapping(existing));
        }
        self.tracker.accept(text, now);

        let target = self.document.slice(range).unwrap_or(text).to_string();
        let context = self.context_for(range);
        let id = self.next_id(&target, &context, now);
        let mut record = AnnotationRecord::new(
            id.clone(),
            target.clone(),
            ComponentRange {
                start: range.start,
                end: range.end,
                text: target,
            },
        );
        record.source_context = context;
        record.created_at = Some(now);
        self.insert(record)?;
        Ok(SelectionOutcome::Created(id))
    }

    // === Automatic annotation ===

    /// Segments for one paragraph, offsets relative to the paragraph.
    pub fn annotate_paragraph(&self, index: usize) -> Vec<Segment> {
        match self.document.paragraph(index) {
            Some(paragraph) => self.annotator.annotate(paragraph),
            None => Vec::new(),
        }
    }

    /// Resolved matches over the whole document, in document coordinates.
    pub fn document_matches(&self) -> Vec<MatchSpan> {
        (0..self.document.paragraph_count())
            .filter_map(|index| {
                let base = self.document.paragraph_base(index)?;
                let paragraph = self.document.paragraph(index)?;
                Some(
                    self.annotator
                        .resolve(paragraph)
                        .spans
                        .into_iter()
                        .map(move |span| span.offset(base)),
                )
            })
            .flatten()
            .collect()
    }

    /// Store a record for every resolved match not already covered by one.
    pub fn auto_annotate(&mut self, now: DateTime<Utc>) -> SessionResult<Vec<RecordId>> {
        let mut next = self.records.to_vec();
        let mut created = Vec::new();

        for span in self.document_matches() {
            if next.iter().any(|r| r.overlaps(&span.range)) {
                debug!(range = %span.range, "match already annotated");
                continue;
            }
            let context = self.context_for(span.range);
            let id = self.next_id(&span.text, &context, now);
            let record = AnnotationRecord::from_match(id.clone(), &span, &self.document, context, now);
            record.validate()?;
            next.push(record);
            created.push(id);
        }

        if !created.is_empty() {
            self.records.replace_all(next);
            self.persist()?;
        }
        info!(created = created.len(), "auto-annotated document");
        Ok(created)
    }

    // === Collection ===

    pub fn remove(&mut self, id: &RecordId) -> SessionResult<Option<AnnotationRecord>> {
        let removed = self.records.remove(id);
        if removed.is_some() {
            self.persist()?;
        }
        Ok(removed)
    }

    pub fn clear(&mut self) -> SessionResult<()> {
        self.records.clear();
        if let Some(store) = &self.store {
            store.clear()?;
        }
        Ok(())
    }

    fn insert(&mut self, record: AnnotationRecord) -> SessionResult<()> {
        debug!(id = %record.id, target = %record.target_lexeme, "adding record");
        self.records.add(record)?;
        self.persist()
    }

    fn persist(&self) -> SessionResult<()> {
        if let Some(store) = &self.store {
            store.save_all(&self.records.snapshot())?;
        }
        Ok(())
    }

    fn overlapping(&self, ranges: &[TextRange]) -> Option<RecordId> {
        ranges
            .iter()
            .find_map(|range| self.records.find_overlapping(range))
            .map(|r| r.id.clone())
    }

    fn next_id(&mut self, target: &str, context: &str, now: DateTime<Utc>) -> RecordId {
        let id = RecordId::generate(target, context, self.batch_index, self.next_item, now);
        self.next_item += 1;
        id
    }

    /// Sentence context, looked up within the paragraph holding `range`.
    fn context_for(&self, range: TextRange) -> String {
        let max_words = self.config.context_max_words;
        let located = self.document.paragraph_of(range.start).and_then(|index| {
            let base = self.document.paragraph_base(index)?;
            let paragraph = self.document.paragraph(index)?;
            let end = range.end.min(base + paragraph.len());
            Some(extract_context(paragraph, TextRange::new(range.start - base, end - base), max_words))
        });
        located.unwrap_or_else(|| extract_context(self.document.text(), range, max_words))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use chrono::Duration;

    fn at(millis: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp_millis(1_700_000_000_000 + millis).unwrap()
    }

    fn document() -> FlatDocument {
        FlatDocument::new(["The plan fell through at the last minute.", "We had to call it off entirely."])
    }

    #[test]
    fn click_and_finalize_creates_one_record() {
        let mut session = AnnotationSession::new(document(), EngineConfig::default());
        session.click(WordClick::new("fell", 0, 2));
        session.click(WordClick::new("through", 0, 3).with_modifier());
        assert_eq!(session.state(), TrackerState::Picking);

        let outcome = session.finalize(at(0)).unwrap();
        let id = outcome.created().unwrap().clone();
        assert_eq!(session.state(), TrackerState::Idle);

        let record = session.records().get(&id).unwrap();
        assert_eq!(record.target_lexeme, "fell through");
        assert!(!record.is_non_contiguous);
        assert_eq!(record.source_context, "The plan fell through at the last minute.");
    }

    #[test]
    fn repeated_finalize_within_window_is_suppressed() {
        let mut session = AnnotationSession::new(document(), EngineConfig::default());
        session.click(WordClick::new("plan", 0, 1));
        assert!(session.finalize(at(0)).unwrap().created().is_some());

        session.click(WordClick::new("plan", 0, 1));
        assert_eq!(session.finalize(at(300)).unwrap(), SelectionOutcome::Suppressed);
        assert_eq!(session.records().len(), 1);
    }

    #[test]
    fn overlapping_click_selection_does_not_suppress_the_next_pick() {
        let mut session = AnnotationSession::new(
            FlatDocument::new(["the cat and the dog"]),
            EngineConfig::default(),
        );
        session.click(WordClick::new("the", 0, 0));
        assert!(session.finalize(at(0)).unwrap().created().is_some());

        session.click(WordClick::new("the", 0, 0));
        assert!(matches!(session.finalize(at(2_000)).unwrap(), SelectionOutcome::Overlapping(_)));

        session.click(WordClick::new("the", 0, 3));
        let outcome = session.finalize(at(2_300)).unwrap();
        let record = session.records().get(outcome.created().unwrap()).unwrap();
        assert_eq!(record.component_ranges[0].start, 12);
        assert_eq!(session.records().len(), 2);
    }

    #[test]
    fn drag_rejects_overlap() {
        let mut session = AnnotationSession::new(document(), EngineConfig::default());
        let first = session.select_text("last minute", None, Some(0), at(0)).unwrap();
        assert!(first.created().is_some());

        let base = 29;
        let overlapping = session
            .select_text("the last", Some(TextRange::new(base - 4, base + 4)), None, at(5_000))
            .unwrap();
        assert!(matches!(overlapping, SelectionOutcome::Overlapping(_)));
        assert_eq!(session.records().len(), 1);
    }

    #[test]
    fn drag_in_second_paragraph_uses_document_offsets() {
        let mut session = AnnotationSession::new(document(), EngineConfig::default());
        let outcome = session.select_text("call it off", None, Some(1), at(0)).unwrap();
        let record = session.records().get(outcome.created().unwrap()).unwrap();
        let base = "The plan fell through at the last minute.".len();
        assert_eq!(record.component_ranges[0].start, base + "We had to ".len());
        assert_eq!(record.source_context, "We had to call it off entirely.");
    }

    #[test]
    fn auto_annotate_skips_covered_spans() {
        let patterns = vec![LexicalPattern::new("p1", "call sth off"), LexicalPattern::new("p2", "last minute")];
        let mut session = AnnotationSession::new(document(), EngineConfig::default()).with_patterns(&patterns);
        session.select_text("last minute", None, Some(0), at(0)).unwrap();

        let created = session.auto_annotate(at(10)).unwrap();
        assert_eq!(created.len(), 1);
        let record = session.records().get(&created[0]).unwrap();
        assert_eq!(record.target_lexeme, "call it off");
        assert_eq!(record.lexical_item_id.as_deref(), Some("p1"));

        assert!(session.auto_annotate(at(20)).unwrap().is_empty());
    }

    #[test]
    fn open_loads_and_evicts_expired() {
        let store = Arc::new(MemoryStore::new());
        {
            let mut session =
                AnnotationSession::open(document(), EngineConfig::default(), store.clone(), at(0)).unwrap();
            session.select_text("plan", None, None, at(0)).unwrap();
        }
        assert_eq!(store.load().unwrap().len(), 1);

        let later = at(0) + Duration::days(8);
        let reopened = AnnotationSession::open(document(), EngineConfig::default(), store.clone(), later).unwrap();
        assert!(reopened.records().is_empty());
        // Eviction filters the view; the store is untouched until the next write
        assert_eq!(store.load().unwrap().len(), 1);
    }

    #[test]
    fn remove_and_clear_write_through() {
        let store = Arc::new(MemoryStore::new());
        let mut session = AnnotationSession::open(document(), EngineConfig::default(), store.clone(), at(0)).unwrap();
        let id = session.select_text("plan", None, None, at(0)).unwrap().created().unwrap().clone();
        session.select_text("entirely", None, None, at(2_000)).unwrap();

        assert!(session.remove(&id).unwrap().is_some());
        assert_eq!(store.load().unwrap().len(), 1);
        session.clear().unwrap();
        assert!(store.load().unwrap().is_empty());
    }
}
