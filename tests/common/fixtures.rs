//! Fixture documents and stored logs

use chrono::{DateTime, Utc};
use lexspan::{FlatDocument, LexicalPattern};
use serde_json::{json, Value};
use std::path::Path;

/// A fixed instant plus `millis`.
pub fn at(millis: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(1_700_000_000_000 + millis).unwrap()
}

pub fn sample_document() -> FlatDocument {
    FlatDocument::new([
        "The committee put the decision off until spring. Nobody could keep up with the pace of change.",
        "She would keep her fears at bay and take the plunge. It was a turning point for the whole team.",
    ])
}

pub fn sample_patterns() -> Vec<LexicalPattern> {
    vec![
        LexicalPattern::new("p-put-off", "put sth off"),
        LexicalPattern::new("p-keep-up", "keep up with"),
        LexicalPattern::new("p-bay", "keep sth at bay").with_sentiment("neutral"),
        LexicalPattern::new("p-plunge", "take the plunge").with_sentiment("positive"),
        LexicalPattern::new("p-turning", "turning point"),
        LexicalPattern::new("p-point", "point"),
    ]
}

/// A log in the oldest shape: numeric ids, payload at top level.
pub fn legacy_log() -> Value {
    json!({
        "logTitle": "Old reading log",
        "sourceId": "novel-7",
        "totalItems": 3,
        "lexicalItems": [
            {
                "id": 1,
                "text": "put off",
                "context": "The committee put off the decision.",
                "collocations": "put off a decision, put off a meeting",
                "usageNotes": "informal",
                "connotation": "neutral",
                "startOffset": 14,
                "endOffset": 21,
                "timestamp": 1_600_000_000_000i64
            },
            {
                "id": 2,
                "phrase": "take the plunge",
                "sentence": "She took the plunge.",
                "collocations": ["finally take the plunge"],
                "wordForms": {"noun": ["plunge"], "verb": "plunge"}
            },
            {"id": 3}
        ]
    })
}

/// A log already keyed by string ids but carrying doubly-nested entries.
pub fn canonical_log() -> Value {
    json!({
        "logTitle": "Current log",
        "sourceId": "essay-2",
        "totalItems": 1,
        "lexicalItems": [
            {
                "id": "rec-1",
                "targetLexeme": "turning point",
                "sourceContext": "It was a turning point for the whole team.",
                "isNonContiguous": false,
                "componentRanges": [{"start": 156, "end": 169, "text": "turning point"}],
                "phase2": {
                    "collocations": [{"collocate": {"collocate": "major turning point", "example": ""}}],
                    "usageNotes": [{"note": {"note": "often with 'a'"}}]
                }
            }
        ]
    })
}

pub fn write_json(path: &Path, value: &Value) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, serde_json::to_string_pretty(value).unwrap()).unwrap();
}
