//! Canonical annotation record schema

use super::id::RecordId;
use crate::selection::{FinalizedSelection, FlatDocument};
use crate::span::{MatchSpan, TextRange};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when a record breaks a schema invariant
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("record {0} has no component ranges")]
    EmptyRanges(RecordId),

    #[error("record {0} has overlapping component ranges")]
    OverlappingRanges(RecordId),

    #[error("record id already present: {0}")]
    DuplicateId(RecordId),
}

/// One contiguous run of a record, in document coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentRange {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

impl ComponentRange {
    pub fn range(&self) -> TextRange {
        TextRange::new(self.start, self.end.max(self.start))
    }
}

/// The original pick a record was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordPosition {
    pub position: usize,
    pub paragraph_index: usize,
}

/// How the record came to exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Auto,
    #[default]
    Manual,
}

/// Inference hint (`phase1`): a clue for guessing the meaning from context.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceHint {
    pub clue: String,
    pub guess: String,
}

/// Production example (`phase3`): a prompt and a model sentence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductionExample {
    pub prompt: String,
    pub example: String,
}

/// A collocate entry (also used for contrasting collocates).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collocate {
    pub collocate: String,
    #[serde(default)]
    pub example: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageNote {
    pub note: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connotation {
    pub tone: String,
    #[serde(default)]
    pub note: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordForm {
    pub form: String,
    #[serde(default)]
    pub meaning: String,
}

/// Related word forms in four fixed categories.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WordForms {
    pub noun: Vec<WordForm>,
    pub verb: Vec<WordForm>,
    pub adjective: Vec<WordForm>,
    pub adverb: Vec<WordForm>,
}

impl WordForms {
    pub fn is_empty(&self) -> bool {
        self.noun.is_empty() && self.verb.is_empty() && self.adjective.is_empty() && self.adverb.is_empty()
    }
}

/// Linguistic annotation bundle (`phase2`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LinguisticBundle {
    pub definition: String,
    pub collocations: Vec<Collocate>,
    pub contrasting_collocations: Vec<Collocate>,
    pub usage_notes: Vec<UsageNote>,
    pub connotation: Option<Connotation>,
    pub word_forms: WordForms,
}

/// The canonical persisted annotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationRecord {
    pub id: RecordId,
    pub target_lexeme: String,
    #[serde(default)]
    pub source_context: String,
    #[serde(default)]
    pub is_non_contiguous: bool,
    #[serde(default)]
    pub component_ranges: Vec<ComponentRange>,
    #[serde(default)]
    pub selected_word_positions: Vec<WordPosition>,
    #[serde(default)]
    pub origin: Origin,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lexical_item_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "phase1", default)]
    pub inference_hint: Option<InferenceHint>,
    #[serde(rename = "phase2", default)]
    pub annotation: LinguisticBundle,
    #[serde(rename = "phase3", default)]
    pub production: Option<ProductionExample>,
}

impl AnnotationRecord {
    /// A bare record with one range and an empty payload.
    pub fn new(id: RecordId, target_lexeme: impl Into<String>, range: ComponentRange) -> Self {
        Self {
            id,
            target_lexeme: target_lexeme.into(),
            source_context: String::new(),
            is_non_contiguous: false,
            component_ranges: vec![range],
            selected_word_positions: Vec::new(),
            origin: Origin::Manual,
            lexical_item_id: None,
            created_at: None,
            inference_hint: None,
            annotation: LinguisticBundle::default(),
            production: None,
        }
    }

    /// Build a manual record from a finalized word selection.
    pub fn from_selection(
        id: RecordId,
        selection: &FinalizedSelection,
        source_context: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        let component_ranges = selection
            .runs
            .iter()
            .map(|run| ComponentRange {
                start: run.range.start,
                end: run.range.end,
                text: run.display(),
            })
            .collect();
        let selected_word_positions = selection
            .picks
            .iter()
            .map(|pick| WordPosition {
                position: pick.position,
                paragraph_index: pick.paragraph_index,
            })
            .collect();

        Self {
            id,
            target_lexeme: selection.text.clone(),
            source_context: source_context.into(),
            is_non_contiguous: selection.is_non_contiguous(),
            component_ranges,
            selected_word_positions,
            origin: Origin::Manual,
            lexical_item_id: None,
            created_at: Some(created_at),
            inference_hint: None,
            annotation: LinguisticBundle::default(),
            production: None,
        }
    }

    /// Build an automatic record from a matched span in document coordinates.
    pub fn from_match(
        id: RecordId,
        span: &MatchSpan,
        doc: &FlatDocument,
        source_context: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        let text = doc.slice(span.range).unwrap_or(&span.text).to_string();
        let mut record = Self::new(
            id,
            text.clone(),
            ComponentRange {
                start: span.start(),
                end: span.end(),
                text,
            },
        );
        record.source_context = source_context.into();
        record.origin = Origin::Auto;
        record.lexical_item_id = Some(span.pattern_id.clone());
        record.created_at = Some(created_at);
        record
    }

    pub fn with_annotation(mut self, annotation: LinguisticBundle) -> Self {
        self.annotation = annotation;
        self
    }

    /// Ranges of all runs.
    pub fn ranges(&self) -> impl Iterator<Item = TextRange> + '_ {
        self.component_ranges.iter().map(ComponentRange::range)
    }

    /// True if any run of this record intersects `range`.
    pub fn overlaps(&self, range: &TextRange) -> bool {
        self.ranges().any(|r| r.overlaps(range))
    }

    /// Check the per-record invariants: at least one range, none overlapping.
    pub fn validate(&self) -> Result<(), RecordError> {
        if self.component_ranges.is_empty() {
            return Err(RecordError::EmptyRanges(self.id.clone()));
        }
        let mut ranges: Vec<TextRange> = self.ranges().collect();
        ranges.sort();
        if ranges.windows(2).any(|pair| pair[0].overlaps(&pair[1])) {
            return Err(RecordError::OverlappingRanges(self.id.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> AnnotationRecord {
        AnnotationRecord::new(
            RecordId::from_string("rec-1"),
            "break down",
            ComponentRange {
                start: 4,
                end: 14,
                text: "break down".into(),
            },
        )
    }

    #[test]
    fn serializes_with_camel_case_and_phase_keys() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(value["id"], "rec-1");
        assert_eq!(value["targetLexeme"], "break down");
        assert_eq!(value["isNonContiguous"], false);
        assert_eq!(value["componentRanges"][0]["start"], 4);
        assert!(value.get("phase2").is_some());
        assert_eq!(value["phase2"]["usageNotes"], json!([]));
        assert_eq!(value["origin"], "manual");
        assert!(value.get("createdAt").is_none());
    }

    #[test]
    fn deserializes_minimal_record() {
        let value = json!({
            "id": "rec-2",
            "targetLexeme": "look up",
            "componentRanges": [{"start": 0, "end": 7, "text": "look up"}]
        });
        let record: AnnotationRecord = serde_json::from_value(value).unwrap();
        assert_eq!(record.annotation, LinguisticBundle::default());
        assert!(record.validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_ranges() {
        let mut record = sample();
        record.component_ranges.clear();
        assert_eq!(record.validate(), Err(RecordError::EmptyRanges(record.id.clone())));
    }

    #[test]
    fn validate_rejects_overlapping_ranges() {
        let mut record = sample();
        record.component_ranges.push(ComponentRange {
            start: 10,
            end: 20,
            text: "x".into(),
        });
        assert!(matches!(record.validate(), Err(RecordError::OverlappingRanges(_))));
    }

    #[test]
    fn overlap_query() {
        let record = sample();
        assert!(record.overlaps(&TextRange::new(0, 5)));
        assert!(record.overlaps(&TextRange::new(13, 30)));
        assert!(!record.overlaps(&TextRange::new(14, 30)));
    }
}
