//! Pattern-based span matching
//!
//! Leaf-first: [`TextRange`], pattern compilation, the per-pattern
//! [`SpanFinder`], the joint [`resolve_overlaps`] pass and the paragraph-level
//! [`AutoAnnotator`].

mod finder;
mod matcher;
mod pattern;
mod range;
mod resolver;

pub use finder::{MatchSpan, SpanFinder, Spans};
pub use matcher::AutoAnnotator;
pub use pattern::{filter_by_sentiment, CompiledPattern, LexicalPattern, PatternError, PatternResult};
pub use range::TextRange;
pub use resolver::{resolve_overlaps, Resolution, Segment};
