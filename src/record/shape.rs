//! Structural probing of stored field values
//!
//! Multi-valued annotation fields have been stored in several shapes over
//! time. Rather than guessing per call site, a value is classified once into
//! a [`FieldShape`] by looking at what it is and, for arrays, at element 0.

use serde_json::{Map, Value};

/// The historical shapes a multi-valued field can take.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldShape<'a> {
    /// Missing, `null` or an empty array
    Absent,
    /// A bare string
    Scalar(&'a str),
    /// An array whose first element is a string
    StringList(&'a [Value]),
    /// An array whose first element is an object holding the canonical key
    /// with a plain value
    Canonical(&'a [Value]),
    /// An array whose first element wraps a canonical object under the
    /// canonical key (left behind by an earlier faulty migration)
    DoublyNested(&'a [Value]),
    /// A single canonical object, not wrapped in an array
    CanonicalObject(&'a Map<String, Value>),
    /// A single object wrapping a canonical object under the canonical key
    NestedObject(&'a Map<String, Value>),
    /// Anything else
    Unrecognized(&'a Value),
}

impl<'a> FieldShape<'a> {
    /// Classify `value` for a field whose canonical entries carry `key`.
    pub fn probe(value: Option<&'a Value>, key: &str) -> Self {
        let Some(value) = value else {
            return FieldShape::Absent;
        };

        match value {
            Value::Null => FieldShape::Absent,
            Value::String(s) => FieldShape::Scalar(s),
            Value::Array(items) => match items.first() {
                None => FieldShape::Absent,
                Some(Value::String(_)) => FieldShape::StringList(items),
                Some(Value::Object(first)) => match object_kind(first, key) {
                    ObjectKind::Canonical => FieldShape::Canonical(items),
                    ObjectKind::Nested => FieldShape::DoublyNested(items),
                    ObjectKind::Other => FieldShape::Unrecognized(value),
                },
                Some(_) => FieldShape::Unrecognized(value),
            },
            Value::Object(map) => match object_kind(map, key) {
                ObjectKind::Canonical => FieldShape::CanonicalObject(map),
                ObjectKind::Nested => FieldShape::NestedObject(map),
                ObjectKind::Other => FieldShape::Unrecognized(value),
            },
            _ => FieldShape::Unrecognized(value),
        }
    }

    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            FieldShape::Absent => "absent",
            FieldShape::Scalar(_) => "scalar",
            FieldShape::StringList(_) => "string-list",
            FieldShape::Canonical(_) => "canonical",
            FieldShape::DoublyNested(_) => "doubly-nested",
            FieldShape::CanonicalObject(_) => "canonical-object",
            FieldShape::NestedObject(_) => "nested-object",
            FieldShape::Unrecognized(_) => "unrecognized",
        }
    }
}

enum ObjectKind {
    Canonical,
    Nested,
    Other,
}

fn object_kind(map: &Map<String, Value>, key: &str) -> ObjectKind {
    match map.get(key) {
        Some(Value::Object(inner)) if inner.contains_key(key) => ObjectKind::Nested,
        Some(Value::String(_)) => ObjectKind::Canonical,
        _ => ObjectKind::Other,
    }
}
