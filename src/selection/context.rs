//! Sentence context extraction
//!
//! The sentence around a span is bounded by the nearest `". "`, `"! "` or
//! `"? "` before the span and the nearest one after it (the punctuation is
//! kept, the space is not). Without a delimiter the document edge is used.

use crate::span::TextRange;

const DELIMITERS: [&str; 3] = [". ", "! ", "? "];

/// Marker appended to truncated context
pub const TRUNCATION_MARKER: &str = "...";

/// Byte range of the sentence containing `span`.
pub fn sentence_bounds(text: &str, span: TextRange) -> TextRange {
    let start = span.start.min(text.len());
    let end = span.end.clamp(start, text.len());

    let sentence_start = text
        .get(..start)
        .and_then(|before| {
            DELIMITERS
                .iter()
                .filter_map(|d| before.rfind(d).map(|pos| pos + d.len()))
                .max()
        })
        .unwrap_or(0);

    let sentence_end = text
        .get(end..)
        .and_then(|after| {
            DELIMITERS
                .iter()
                .filter_map(|d| after.find(d).map(|pos| end + pos + 1))
                .min()
        })
        .unwrap_or(text.len());

    TextRange::new(sentence_start, sentence_end)
}

/// The sentence containing `span`, truncated to `max_words` words.
pub fn extract_context(text: &str, span: TextRange, max_words: usize) -> String {
    let bounds = sentence_bounds(text, span);
    let sentence = bounds.slice(text).unwrap_or_default().trim();
    truncate_words(sentence, max_words)
}

/// Keep at most `max_words` words. When words are dropped, trailing
/// punctuation is stripped from the last kept word and `...` appended.
pub fn truncate_words(sentence: &str, max_words: usize) -> String {
    let words: Vec<&str> = sentence.split_whitespace().collect();
    if words.len() <= max_words {
        return words.join(" ");
    }

    let mut kept: Vec<&str> = words[..max_words].to_vec();
    if let Some(last) = kept.last_mut() {
        let stripped = last.trim_end_matches(|c: char| c.is_ascii_punctuation());
        // A word made only of punctuation stays as is
        if !stripped.is_empty() {
            *last = stripped;
        }
    }
    format!("{}{}", kept.join(" "), TRUNCATION_MARKER)
}
