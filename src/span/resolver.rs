//! Overlap resolution: pick a consistent, non-overlapping set of spans
//!
//! Candidates come from many patterns and may overlap arbitrarily. They are
//! considered longest-first; on equal length the pattern registered first
//! wins, then the leftmost occurrence. A candidate intersecting anything
//! already accepted is dropped whole, never trimmed.

use super::finder::MatchSpan;
use super::range::TextRange;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

/// A piece of a paragraph: either untouched text or a matched span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Segment {
    Literal { text: String },
    Match { span: MatchSpan },
}

impl Segment {
    pub fn literal(text: impl Into<String>) -> Self {
        Segment::Literal { text: text.into() }
    }

    /// The text this segment covers.
    pub fn text(&self) -> &str {
        match self {
            Segment::Literal { text } => text,
            Segment::Match { span } => &span.text,
        }
    }

    pub fn as_match(&self) -> Option<&MatchSpan> {
        match self {
            Segment::Match { span } => Some(span),
            Segment::Literal { .. } => None,
        }
    }
}

/// Outcome of resolving candidates against one text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Accepted spans, sorted by start offset
    pub spans: Vec<MatchSpan>,
    /// The full text split into literal and matched segments, left to right
    pub segments: Vec<Segment>,
}

/// Resolve `candidates` (offsets relative to `text`) into a non-overlapping set.
pub fn resolve_overlaps(text: &str, candidates: Vec<MatchSpan>) -> Resolution {
    let mut ordered: Vec<MatchSpan> = candidates
        .into_iter()
        .filter(|span| !span.is_empty() && span.end() <= text.len())
        .collect();
    ordered.sort_by_key(|span| (Reverse(span.len()), span.pattern_index, span.start()));

    let mut accepted: Vec<MatchSpan> = Vec::new();
    for candidate in ordered {
        let clashes = accepted.iter().any(|span| span.range.overlaps(&candidate.range));
        if !clashes {
            accepted.push(candidate);
        }
    }
    accepted.sort_by_key(|span| span.start());

    let segments = assemble_segments(text, &accepted);
    Resolution {
        spans: accepted,
        segments,
    }
}

/// Build segments right to left: the literal tail after each span, then the
/// span itself, and finally whatever text leads the first span.
fn assemble_segments(text: &str, accepted: &[MatchSpan]) -> Vec<Segment> {
    let mut reversed = Vec::with_capacity(accepted.len() * 2 + 1);
    let mut tail = text.len();

    for span in accepted.iter().rev() {
        if span.end() < tail {
            if let Some(literal) = TextRange::new(span.end(), tail).slice(text) {
                reversed.push(Segment::literal(literal));
            }
        }
        reversed.push(Segment::Match { span: span.clone() });
        tail = span.start();
    }
    if tail > 0 {
        reversed.push(Segment::literal(&text[..tail]));
    }

    reversed.reverse();
    reversed
}
