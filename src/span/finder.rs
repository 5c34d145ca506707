//! Span finder: raw match ranges for one pattern inside one text

use super::pattern::{CompiledPattern, LexicalPattern, PatternResult};
use super::range::TextRange;
use serde::{Deserialize, Serialize};

/// One occurrence of a pattern within a text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSpan {
    /// Byte range of the occurrence, half-open
    pub range: TextRange,
    /// The matched substring, as it appears in the text
    pub text: String,
    /// Position of the originating pattern in the registered pattern list
    pub pattern_index: usize,
    /// Identifier of the originating pattern
    pub pattern_id: String,
}

impl MatchSpan {
    pub fn start(&self) -> usize {
        self.range.start
    }

    pub fn end(&self) -> usize {
        self.range.end
    }

    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    /// Shift the span into another coordinate space (paragraph to document).
    pub fn offset(mut self, base: usize) -> Self {
        self.range = self.range.offset(base);
        self
    }
}

/// A compiled pattern ready to scan texts.
///
/// Compiling once and calling [`SpanFinder::spans`] per text gives a fresh,
/// restartable scan every time.
#[derive(Debug, Clone)]
pub struct SpanFinder {
    pattern_index: usize,
    pattern_id: String,
    compiled: CompiledPattern,
}

impl SpanFinder {
    /// Compile `pattern`, registered at position `pattern_index`.
    pub fn new(pattern: &LexicalPattern, pattern_index: usize) -> PatternResult<Self> {
        Ok(Self {
            pattern_index,
            pattern_id: pattern.id.clone(),
            compiled: pattern.compile()?,
        })
    }

    pub fn pattern_index(&self) -> usize {
        self.pattern_index
    }

    pub fn pattern_id(&self) -> &str {
        &self.pattern_id
    }

    /// The reduced search key (annotations stripped).
    pub fn key(&self) -> &str {
        &self.compiled.key
    }

    pub fn is_discontiguous(&self) -> bool {
        self.compiled.discontiguous
    }

    /// Lazily scan `text` for occurrences, left to right.
    pub fn spans<'a>(&'a self, text: &'a str) -> Spans<'a> {
        Spans {
            finder: self,
            text,
            cursor: 0,
        }
    }
}

/// Iterator over the raw spans of one pattern in one text.
#[derive(Debug)]
pub struct Spans<'a> {
    finder: &'a SpanFinder,
    text: &'a str,
    cursor: usize,
}

impl Iterator for Spans<'_> {
    type Item = MatchSpan;

    fn next(&mut self) -> Option<Self::Item> {
        while self.cursor <= self.text.len() {
            let found = self.finder.compiled.regex.find_at(self.text, self.cursor)?;

            if found.end() > found.start() {
                self.cursor = found.end();
                return Some(MatchSpan {
                    range: TextRange::new(found.start(), found.end()),
                    text: found.as_str().to_string(),
                    pattern_index: self.finder.pattern_index,
                    pattern_id: self.finder.pattern_id.clone(),
                });
            }

            // Zero-width match: step past one character so the scan progresses
            self.cursor = next_char_boundary(self.text, found.end());
        }
        None
    }
}

fn next_char_boundary(text: &str, at: usize) -> usize {
    match text[at..].chars().next() {
        Some(c) => at + c.len_utf8(),
        None => text.len() + 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finder(phrase: &str) -> SpanFinder {
        SpanFinder::new(&LexicalPattern::new("p", phrase), 0).unwrap()
    }

    #[test]
    fn finds_all_occurrences_in_order() {
        let f = finder("fast");
        let spans: Vec<_> = f.spans("Fast cars go fast.").collect();
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].range, TextRange::new(0, 4));
        assert_eq!(spans[0].text, "Fast");
        assert_eq!(spans[1].range, TextRange::new(13, 17));
    }

    #[test]
    fn scan_is_restartable() {
        let f = finder("go");
        let text = "go and go";
        let first: Vec<_> = f.spans(text).collect();
        let second: Vec<_> = f.spans(text).collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn discontiguous_span_covers_head_to_tail() {
        let f = finder("not only ... but also");
        let text = "It is not only cheap but also fast.";
        let spans: Vec<_> = f.spans(text).collect();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "not only cheap but also");
        assert!(f.is_discontiguous());
    }

    #[test]
    fn discontiguous_gap_is_non_greedy() {
        let f = finder("as ... as");
        let spans: Vec<_> = f.spans("as tall as a tree, as wide as a house").collect();
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].text, "as tall as");
        assert_eq!(spans[1].text, "as wide as");
    }

    #[test]
    fn zero_width_matches_do_not_loop() {
        // A wildcard-free pattern never matches empty, so build one directly
        let pattern = LexicalPattern::new("z", "x");
        let mut f = SpanFinder::new(&pattern, 0).unwrap();
        f.compiled.regex = regex::Regex::new(r"\b").unwrap();
        let spans: Vec<_> = f.spans("ab cd").collect();
        assert!(spans.is_empty());
    }

    #[test]
    fn handles_multibyte_text() {
        let f = finder("café");
        let spans: Vec<_> = f.spans("Un CAFÉ, un café.").collect();
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[1].text, "café");
    }

    #[test]
    fn carries_pattern_identity() {
        let pattern = LexicalPattern::new("item-9", "brisk");
        let f = SpanFinder::new(&pattern, 4).unwrap();
        let span = f.spans("a brisk walk").next().unwrap();
        assert_eq!(span.pattern_index, 4);
        assert_eq!(span.pattern_id, "item-9");
    }
}
