//! Canonicalization of stored annotation records
//!
//! Every function here is total: whatever shape comes in, a canonical value
//! comes out, and feeding that value back in returns it unchanged. Shapes that
//! cannot be interpreted become the field's empty value and are logged.

use super::id::RecordId;
use super::shape::FieldShape;
use super::types::{
    AnnotationRecord, Collocate, ComponentRange, Connotation, InferenceHint, LinguisticBundle, Origin,
    ProductionExample, UsageNote, WordForm, WordForms, WordPosition,
};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, warn};

const TARGET_KEYS: &[&str] = &["targetLexeme", "text", "phrase", "lexeme", "word"];
const CONTEXT_KEYS: &[&str] = &["sourceContext", "context", "sentence"];
const COLLOCATE_KEYS: &[&str] = &["collocations", "collocates"];
const CONTRASTING_KEYS: &[&str] = &["contrastingCollocations", "contrastingCollocates", "antiCollocations"];
const USAGE_NOTE_KEYS: &[&str] = &["usageNotes", "usageNote"];
const WORD_FORM_KEYS: &[&str] = &["wordForms", "forms"];
const RANGE_KEY_PAIRS: &[(&str, &str)] = &[("startOffset", "endOffset"), ("startIndex", "endIndex"), ("start", "end")];

/// A canonical entry of a multi-valued field.
trait CanonicalEntry: DeserializeOwned {
    /// Key probed on the first element to recognise the canonical shape
    const KEY: &'static str;

    fn from_text(text: &str) -> Self;
}

impl CanonicalEntry for Collocate {
    const KEY: &'static str = "collocate";

    fn from_text(text: &str) -> Self {
        Self {
            collocate: text.to_string(),
            example: String::new(),
        }
    }
}

impl CanonicalEntry for UsageNote {
    const KEY: &'static str = "note";

    fn from_text(text: &str) -> Self {
        Self { note: text.to_string() }
    }
}

impl CanonicalEntry for Connotation {
    const KEY: &'static str = "tone";

    fn from_text(text: &str) -> Self {
        Self {
            tone: text.to_string(),
            note: String::new(),
        }
    }
}

impl CanonicalEntry for WordForm {
    const KEY: &'static str = "form";

    fn from_text(text: &str) -> Self {
        Self {
            form: text.to_string(),
            meaning: String::new(),
        }
    }
}

/// Where a record being imported sits, for id generation.
#[derive(Debug, Clone, Copy)]
pub struct ImportContext {
    pub batch_index: usize,
    pub item_index: usize,
}

/// Collocate list. A scalar containing commas is split into several entries.
pub fn normalize_collocates(value: Option<&Value>) -> Vec<Collocate> {
    normalize_entries("collocations", value, true)
}

/// Contrasting-collocate list, same rules as [`normalize_collocates`].
pub fn normalize_contrasting(value: Option<&Value>) -> Vec<Collocate> {
    normalize_entries("contrastingCollocations", value, true)
}

/// Usage notes. A scalar becomes exactly one note.
pub fn normalize_usage_notes(value: Option<&Value>) -> Vec<UsageNote> {
    normalize_entries("usageNotes", value, false)
}

/// Connotation: absent stays `None`; a list of strings is joined into one tone.
pub fn normalize_connotation(value: Option<&Value>) -> Option<Connotation> {
    match FieldShape::probe(value, Connotation::KEY) {
        FieldShape::StringList(items) => {
            let tone = items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(", ");
            (!tone.is_empty()).then(|| Connotation::from_text(&tone))
        }
        shape => entries_from_shape::<Connotation>("connotation", shape, false)
            .into_iter()
            .next(),
    }
}

/// Word-form table in the four fixed categories.
pub fn normalize_word_forms(value: Option<&Value>) -> WordForms {
    match value {
        None | Some(Value::Null) => WordForms::default(),
        Some(Value::Object(map)) => WordForms {
            noun: word_form_category(map, &["noun", "nouns"]),
            verb: word_form_category(map, &["verb", "verbs"]),
            adjective: word_form_category(map, &["adjective", "adjectives"]),
            adverb: word_form_category(map, &["adverb", "adverbs"]),
        },
        Some(other) => {
            warn!(field = "wordForms", value = %other, "unrecognized word-form table; using empty table");
            WordForms::default()
        }
    }
}

fn word_form_category(map: &Map<String, Value>, keys: &[&str]) -> Vec<WordForm> {
    let value = first_present(map, keys);
    normalize_entries("wordForms", value, true)
}

/// The linguistic bundle (`phase2`). A bare string is taken as the definition.
pub fn normalize_bundle(value: Option<&Value>) -> LinguisticBundle {
    match value {
        None | Some(Value::Null) => LinguisticBundle::default(),
        Some(Value::String(definition)) => LinguisticBundle {
            definition: definition.trim().to_string(),
            ..Default::default()
        },
        Some(Value::Object(map)) => LinguisticBundle {
            definition: text_field(map, &["definition", "meaning"]),
            collocations: normalize_collocates(first_present(map, COLLOCATE_KEYS)),
            contrasting_collocations: normalize_contrasting(first_present(map, CONTRASTING_KEYS)),
            usage_notes: normalize_usage_notes(first_present(map, USAGE_NOTE_KEYS)),
            connotation: normalize_connotation(map.get("connotation")),
            word_forms: normalize_word_forms(first_present(map, WORD_FORM_KEYS)),
        },
        Some(other) => {
            warn!(field = "phase2", value = %other, "unrecognized annotation bundle; using empty bundle");
            LinguisticBundle::default()
        }
    }
}

/// Inference hint (`phase1`). A bare string becomes the clue.
pub fn normalize_hint(value: Option<&Value>) -> Option<InferenceHint> {
    match value? {
        Value::Null => None,
        Value::String(clue) => Some(InferenceHint {
            clue: clue.trim().to_string(),
            guess: String::new(),
        }),
        Value::Object(map) => Some(InferenceHint {
            clue: text_field(map, &["clue", "hint", "text"]),
            guess: text_field(map, &["guess", "answer"]),
        }),
        other => {
            warn!(field = "phase1", value = %other, "unrecognized inference hint; dropping");
            None
        }
    }
}

/// Production example (`phase3`). A bare string becomes the example.
pub fn normalize_production(value: Option<&Value>) -> Option<ProductionExample> {
    match value? {
        Value::Null => None,
        Value::String(example) => Some(ProductionExample {
            prompt: String::new(),
            example: example.trim().to_string(),
        }),
        Value::Object(map) => Some(ProductionExample {
            prompt: text_field(map, &["prompt", "task"]),
            example: text_field(map, &["example", "sentence", "text"]),
        }),
        other => {
            warn!(field = "phase3", value = %other, "unrecognized production example; dropping");
            None
        }
    }
}

/// True for the oldest stored shape, which used numeric ids.
pub fn is_legacy_record(value: &Value) -> bool {
    matches!(value.get("id"), Some(Value::Number(_)))
}

/// Canonicalize one stored record of any historical shape.
///
/// Returns `None` for values that are not objects or carry no target text.
/// Records with a string id keep it; legacy records get one generated from
/// their content, position and stored timestamp (the Unix epoch when they
/// have none), so reading the same record twice yields the same id.
pub fn normalize_record(value: &Value, ctx: &ImportContext) -> Option<AnnotationRecord> {
    let Some(map) = value.as_object() else {
        warn!(item = ctx.item_index, "skipping non-object record");
        return None;
    };

    let Some(target) = first_string(map, TARGET_KEYS).map(str::trim).filter(|t| !t.is_empty()) else {
        warn!(item = ctx.item_index, "skipping record without target text");
        return None;
    };
    let context = first_string(map, CONTEXT_KEYS).map(str::trim).unwrap_or_default();
    let legacy = is_legacy_record(value);

    let created_at = parse_timestamp(map.get("createdAt").or_else(|| map.get("timestamp")));

    let id = match map.get("id") {
        Some(Value::String(id)) if !id.trim().is_empty() => RecordId::from_string(id.as_str()),
        _ => RecordId::generate(
            target,
            context,
            ctx.batch_index,
            ctx.item_index,
            created_at.unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
        ),
    };

    let mut component_ranges = parse_ranges(map.get("componentRanges"));
    if component_ranges.is_empty() {
        match legacy_range(map, target) {
            Some(range) => component_ranges.push(range),
            None => debug!(id = %id, "record carries no locatable range"),
        }
    }
    component_ranges.sort_by_key(|r| (r.start, r.end));

    let is_non_contiguous = map
        .get("isNonContiguous")
        .and_then(Value::as_bool)
        .unwrap_or(component_ranges.len() > 1);

    let origin = map
        .get("origin")
        .and_then(|v| serde_json::from_value::<Origin>(v.clone()).ok())
        .unwrap_or_default();

    let lexical_item_id = match map.get("lexicalItemId") {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };

    // The oldest shape kept payload fields next to the target text
    let bundle_source = map.get("phase2").or(if legacy { Some(value) } else { None });

    Some(AnnotationRecord {
        id,
        target_lexeme: target.to_string(),
        source_context: context.to_string(),
        is_non_contiguous,
        component_ranges,
        selected_word_positions: parse_positions(map.get("selectedWordPositions")),
        origin,
        lexical_item_id,
        created_at,
        inference_hint: normalize_hint(map.get("phase1")),
        annotation: normalize_bundle(bundle_source),
        production: normalize_production(map.get("phase3")),
    })
}

/// Canonicalize a batch of stored records; item indices follow array order.
pub fn normalize_records(values: &[Value], batch_index: usize) -> Vec<AnnotationRecord> {
    values
        .iter()
        .enumerate()
        .filter_map(|(item_index, value)| normalize_record(value, &ImportContext { batch_index, item_index }))
        .collect()
}

/// Run an already-typed record through the normalizer again.
pub fn renormalize(record: &AnnotationRecord, ctx: &ImportContext) -> Option<AnnotationRecord> {
    let value = serde_json::to_value(record).ok()?;
    normalize_record(&value, ctx)
}

fn normalize_entries<T: CanonicalEntry>(field: &str, value: Option<&Value>, split_commas: bool) -> Vec<T> {
    entries_from_shape(field, FieldShape::probe(value, T::KEY), split_commas)
}

fn entries_from_shape<T: CanonicalEntry>(field: &str, shape: FieldShape<'_>, split_commas: bool) -> Vec<T> {
    if !matches!(shape, FieldShape::Absent | FieldShape::Canonical(_)) {
        debug!(field, shape = shape.name(), "rewriting non-canonical field");
    }
    match shape {
        FieldShape::Absent => Vec::new(),
        FieldShape::Scalar(text) => split_text(text, split_commas).map(T::from_text).collect(),
        FieldShape::Canonical(items) => {
            // Already canonical: hand it back as is
            match serde_json::from_value::<Vec<T>>(Value::Array(items.to_vec())) {
                Ok(entries) => entries,
                Err(_) => items.iter().filter_map(|item| entry_from_item(field, item)).collect(),
            }
        }
        FieldShape::StringList(items) | FieldShape::DoublyNested(items) => {
            items.iter().filter_map(|item| entry_from_item(field, item)).collect()
        }
        FieldShape::CanonicalObject(map) | FieldShape::NestedObject(map) => {
            entry_from_object(field, map).into_iter().collect()
        }
        FieldShape::Unrecognized(value) => {
            warn!(field, value = %value, "unrecognized field shape; using empty value");
            Vec::new()
        }
    }
}

fn entry_from_item<T: CanonicalEntry>(field: &str, item: &Value) -> Option<T> {
    match item {
        Value::String(text) => {
            let text = text.trim();
            (!text.is_empty()).then(|| T::from_text(text))
        }
        Value::Object(map) => entry_from_object(field, map),
        other => {
            warn!(field, value = %other, "dropping unrecognized entry");
            None
        }
    }
}

fn entry_from_object<T: CanonicalEntry>(field: &str, map: &Map<String, Value>) -> Option<T> {
    let candidate = match map.get(T::KEY) {
        // One level of accidental wrapping
        Some(Value::Object(inner)) if inner.contains_key(T::KEY) => Value::Object(inner.clone()),
        Some(Value::String(_)) => Value::Object(map.clone()),
        _ => {
            warn!(field, entry = ?map, "dropping entry without '{}'", T::KEY);
            return None;
        }
    };
    match serde_json::from_value(candidate) {
        Ok(entry) => Some(entry),
        Err(err) => {
            warn!(field, "dropping malformed entry: {}", err);
            None
        }
    }
}

fn split_text(text: &str, split_commas: bool) -> impl Iterator<Item = &str> {
    let parts: Vec<&str> = if split_commas {
        text.split(',').collect()
    } else {
        vec![text]
    };
    parts.into_iter().map(str::trim).filter(|s| !s.is_empty())
}

fn first_present<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| map.get(*k))
}

fn first_string<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|k| map.get(*k).and_then(Value::as_str))
}

fn text_field(map: &Map<String, Value>, keys: &[&str]) -> String {
    match first_present(map, keys) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("; "),
        _ => String::new(),
    }
}

fn parse_ranges(value: Option<&Value>) -> Vec<ComponentRange> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| {
            let map = item.as_object()?;
            let start = map.get("start")?.as_u64()? as usize;
            let end = map.get("end")?.as_u64()? as usize;
            if end <= start {
                warn!(start, end, "dropping empty or inverted range");
                return None;
            }
            let text = map.get("text").and_then(Value::as_str).unwrap_or_default().to_string();
            Some(ComponentRange { start, end, text })
        })
        .collect()
}

fn legacy_range(map: &Map<String, Value>, target: &str) -> Option<ComponentRange> {
    RANGE_KEY_PAIRS.iter().find_map(|(start_key, end_key)| {
        let start = map.get(*start_key)?.as_u64()? as usize;
        let end = map.get(*end_key)?.as_u64()? as usize;
        (end > start).then(|| ComponentRange {
            start,
            end,
            text: target.to_string(),
        })
    })
}

fn parse_positions(value: Option<&Value>) -> Vec<WordPosition> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| serde_json::from_value::<WordPosition>(item.clone()).ok())
        .collect()
}

fn parse_timestamp(value: Option<&Value>) -> Option<DateTime<Utc>> {
    match value? {
        Value::String(s) => DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n.as_i64().and_then(DateTime::<Utc>::from_timestamp_millis),
        _ => None,
    }
}
