//! Annotation records: schema, identifiers, normalization and the in-process collection

mod collection;
mod id;
mod normalize;
mod shape;
mod types;

pub use collection::{evict_expired, RecordCollection};
pub use id::RecordId;
pub use normalize::{
    is_legacy_record, normalize_bundle, normalize_collocates, normalize_connotation, normalize_contrasting,
    normalize_hint, normalize_production, normalize_record, normalize_records, normalize_usage_notes,
    normalize_word_forms, renormalize, ImportContext,
};
pub use shape::FieldShape;
pub use types::{
    AnnotationRecord, Collocate, ComponentRange, Connotation, InferenceHint, LinguisticBundle, Origin,
    ProductionExample, RecordError, UsageNote, WordForm, WordForms, WordPosition,
};
