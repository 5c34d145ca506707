//! Auto-annotation: split a paragraph into literal and matched segments

use super::finder::{MatchSpan, SpanFinder};
use super::pattern::LexicalPattern;
use super::resolver::{resolve_overlaps, Resolution, Segment};
use tracing::{debug, warn};

/// Matches a fixed, ordered list of patterns against paragraphs.
///
/// Patterns are compiled once. A pattern that fails to compile is skipped
/// (and logged); the rest keep working.
#[derive(Debug, Clone, Default)]
pub struct AutoAnnotator {
    finders: Vec<SpanFinder>,
    skipped: Vec<String>,
}

impl AutoAnnotator {
    /// Compile `patterns` in registration order.
    pub fn new(patterns: &[LexicalPattern]) -> Self {
        let mut finders = Vec::with_capacity(patterns.len());
        let mut skipped = Vec::new();

        for (index, pattern) in patterns.iter().enumerate() {
            match SpanFinder::new(pattern, index) {
                Ok(finder) => finders.push(finder),
                Err(err) => {
                    warn!(pattern = %pattern.phrase, id = %pattern.id, "skipping pattern: {}", err);
                    skipped.push(pattern.id.clone());
                }
            }
        }

        debug!(compiled = finders.len(), skipped = skipped.len(), "auto-annotator ready");
        Self { finders, skipped }
    }

    /// Number of usable patterns.
    pub fn pattern_count(&self) -> usize {
        self.finders.len()
    }

    /// Ids of patterns that could not be compiled.
    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }

    /// Every raw candidate from every pattern, unresolved.
    pub fn candidates(&self, text: &str) -> Vec<MatchSpan> {
        self.finders.iter().flat_map(|finder| finder.spans(text)).collect()
    }

    /// Resolve candidates from all patterns jointly.
    pub fn resolve(&self, text: &str) -> Resolution {
        resolve_overlaps(text, self.candidates(text))
    }

    /// Split `paragraph` into segments. Never returns an empty sequence:
    /// without any match the whole paragraph comes back as one literal.
    pub fn annotate(&self, paragraph: &str) -> Vec<Segment> {
        let resolution = self.resolve(paragraph);
        if resolution.spans.is_empty() {
            return vec![Segment::literal(paragraph)];
        }
        resolution.segments
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterns(phrases: &[&str]) -> Vec<LexicalPattern> {
        phrases
            .iter()
            .enumerate()
            .map(|(i, p)| LexicalPattern::new(format!("item-{i}"), *p))
            .collect()
    }

    #[test]
    fn longest_match_first_across_patterns() {
        let annotator = AutoAnnotator::new(&patterns(&["run", "running fast"]));
        let segments = annotator.annotate("he was running fast");
        let matches: Vec<_> = segments.iter().filter_map(Segment::as_match).collect();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].text, "running fast");
        assert_eq!(matches[0].pattern_id, "item-1");
    }

    #[test]
    fn shorter_pattern_still_matches_elsewhere() {
        let annotator = AutoAnnotator::new(&patterns(&["run", "running fast"]));
        let segments = annotator.annotate("running fast, they run");
        let matched: Vec<_> = segments.iter().filter_map(Segment::as_match).map(|s| s.text.as_str()).collect();
        assert_eq!(matched, vec!["running fast", "run"]);
    }

    #[test]
    fn no_match_returns_single_literal() {
        let annotator = AutoAnnotator::new(&patterns(&["zebra"]));
        assert_eq!(annotator.annotate("no animals here"), vec![Segment::literal("no animals here")]);
    }

    #[test]
    fn empty_paragraph_still_yields_a_segment() {
        let annotator = AutoAnnotator::new(&patterns(&["zebra"]));
        assert_eq!(annotator.annotate(""), vec![Segment::literal("")]);
    }

    #[test]
    fn malformed_pattern_is_skipped_not_fatal() {
        let annotator = AutoAnnotator::new(&patterns(&["(adj)", "vivid"]));
        assert_eq!(annotator.pattern_count(), 1);
        assert_eq!(annotator.skipped(), ["item-0".to_string()]);
        let segments = annotator.annotate("a vivid dream");
        assert_eq!(segments.iter().filter_map(Segment::as_match).count(), 1);
    }

    #[test]
    fn output_is_deterministic() {
        let annotator = AutoAnnotator::new(&patterns(&["take off", "off", "take"]));
        let text = "take off, take it off";
        assert_eq!(annotator.annotate(text), annotator.annotate(text));
    }

    #[test]
    fn segments_reconstruct_paragraph() {
        let annotator = AutoAnnotator::new(&patterns(&["make up", "up ... mind", "mind"]));
        let text = "Make up your mind, and never mind the rest.";
        let rebuilt: String = annotator.annotate(text).iter().map(Segment::text).collect();
        assert_eq!(rebuilt, text);
    }
}
