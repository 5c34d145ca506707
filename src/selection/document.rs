//! Flattened document: paragraphs concatenated into one offset space
//!
//! Paragraph `p` starts at the summed byte length of paragraphs `0..p`; no
//! separator is inserted. Both the auto-annotation path and manual selections
//! express positions in this space.

use crate::span::TextRange;
use regex::RegexBuilder;
use tracing::debug;

/// Paragraphs joined into a single addressable text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatDocument {
    text: String,
    paragraphs: Vec<TextRange>,
}

impl FlatDocument {
    pub fn new<I, S>(paragraphs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut text = String::new();
        let mut ranges = Vec::new();
        for paragraph in paragraphs {
            let start = text.len();
            text.push_str(paragraph.as_ref());
            ranges.push(TextRange::new(start, text.len()));
        }
        Self {
            text,
            paragraphs: ranges,
        }
    }

    /// Split plain text into paragraphs on blank lines.
    pub fn from_plain_text(raw: &str) -> Self {
        let paragraphs = raw
            .split("\n\n")
            .map(|p| p.trim())
            .filter(|p| !p.is_empty());
        Self::new(paragraphs)
    }

    /// The concatenated text.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn paragraph_count(&self) -> usize {
        self.paragraphs.len()
    }

    pub fn paragraphs(&self) -> impl Iterator<Item = &str> {
        self.paragraphs.iter().map(|r| &self.text[r.start..r.end])
    }

    pub fn paragraph(&self, index: usize) -> Option<&str> {
        self.paragraphs.get(index).map(|r| &self.text[r.start..r.end])
    }

    /// Offset at which paragraph `index` begins.
    pub fn paragraph_base(&self, index: usize) -> Option<usize> {
        self.paragraphs.get(index).map(|r| r.start)
    }

    /// Paragraph containing `offset`. An offset at a boundary belongs to the
    /// paragraph that starts there.
    pub fn paragraph_of(&self, offset: usize) -> Option<usize> {
        self.paragraphs
            .iter()
            .position(|r| r.start <= offset && offset < r.end)
            .or_else(|| {
                // The very end of the text belongs to the last paragraph
                (offset == self.text.len() && !self.paragraphs.is_empty()).then(|| self.paragraphs.len() - 1)
            })
    }

    pub fn slice(&self, range: TextRange) -> Option<&str> {
        range.slice(&self.text)
    }

    /// Words of one paragraph with paragraph-local ranges.
    ///
    /// A word is a whitespace-delimited token with leading and trailing
    /// punctuation trimmed; a token made only of punctuation keeps its full
    /// extent.
    pub fn words(&self, paragraph_index: usize) -> Vec<(TextRange, &str)> {
        let Some(paragraph) = self.paragraph(paragraph_index) else {
            return Vec::new();
        };

        let mut words = Vec::new();
        let mut token_start: Option<usize> = None;
        for (i, c) in paragraph.char_indices() {
            match (c.is_whitespace(), token_start) {
                (true, Some(start)) => {
                    words.push(word_core(paragraph, start, i));
                    token_start = None;
                }
                (false, None) => token_start = Some(i),
                _ => {}
            }
        }
        if let Some(start) = token_start {
            words.push(word_core(paragraph, start, paragraph.len()));
        }
        words
    }

    /// Absolute range of the `position`-th word (0-based) of a paragraph.
    pub fn word_range(&self, paragraph_index: usize, position: usize) -> Option<TextRange> {
        let base = self.paragraph_base(paragraph_index)?;
        self.words(paragraph_index)
            .get(position)
            .map(|(range, _)| range.offset(base))
    }

    /// Locate `word` by text search, preferring the hinted paragraph.
    ///
    /// Used when a pick could not be resolved from its position.
    pub fn find_word(&self, word: &str, hint_paragraph: Option<usize>) -> Option<TextRange> {
        let needle = word.trim();
        if needle.is_empty() {
            return None;
        }
        let escaped = regex::escape(needle);
        let lead = if needle.starts_with(char::is_alphanumeric) { r"\b" } else { "" };
        let trail = if needle.ends_with(char::is_alphanumeric) { r"\b" } else { "" };
        let regex = RegexBuilder::new(&format!("{lead}{escaped}{trail}"))
            .case_insensitive(true)
            .build()
            .ok()?;

        if let Some(index) = hint_paragraph {
            if let (Some(paragraph), Some(base)) = (self.paragraph(index), self.paragraph_base(index)) {
                if let Some(found) = regex.find(paragraph) {
                    return Some(TextRange::new(found.start() + base, found.end() + base));
                }
            }
        }

        let found = regex.find(&self.text).map(|m| TextRange::new(m.start(), m.end()));
        if found.is_none() {
            debug!(word = needle, "word not found in document");
        }
        found
    }
}

fn word_core(paragraph: &str, start: usize, end: usize) -> (TextRange, &str) {
    let token = &paragraph[start..end];
    let trimmed_front = token.trim_start_matches(|c: char| !c.is_alphanumeric());
    let core = trimmed_front.trim_end_matches(|c: char| !c.is_alphanumeric());
    if core.is_empty() {
        return (TextRange::new(start, end), token);
    }
    let core_start = start + (token.len() - trimmed_front.len());
    (TextRange::new(core_start, core_start + core.len()), core)
}
