//! Selection tracker: word picks to finalized selections
//!
//! ```text
//!   Idle --click--> Picking --finalize/cancel--> Idle
//!                   Picking --modifier click (toggle)--> Picking | Idle
//! ```
//!
//! The tracker also owns the short suppression window for repeated
//! selections: the last accepted display text and when it was accepted.

use super::document::FlatDocument;
use super::grouping::{display_text, group_runs, ResolvedPick, Run};
use crate::config::EngineConfig;
use crate::span::TextRange;
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

/// Tracker state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerState {
    Idle,
    Picking,
}

/// Whether the UI element behind a click was still live when the click was
/// handled. The element itself never reaches the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnchorState {
    #[default]
    Attached,
    Detached,
}

/// A word-click event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordClick {
    pub word: String,
    /// Ordinal word position within the paragraph (0-based)
    pub position: usize,
    pub paragraph_index: usize,
    /// Modifier key held: toggle instead of replace
    pub modifier: bool,
    pub anchor: AnchorState,
}

impl WordClick {
    pub fn new(word: impl Into<String>, paragraph_index: usize, position: usize) -> Self {
        Self {
            word: word.into(),
            position,
            paragraph_index,
            modifier: false,
            anchor: AnchorState::Attached,
        }
    }

    pub fn with_modifier(mut self) -> Self {
        self.modifier = true;
        self
    }

    pub fn detached(mut self) -> Self {
        self.anchor = AnchorState::Detached;
        self
    }
}

/// A single pending word pick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedToken {
    pub word: String,
    pub position: usize,
    pub paragraph_index: usize,
    /// Document range, `None` while unresolved
    pub range: Option<TextRange>,
}

impl SelectedToken {
    fn key(&self) -> (usize, usize) {
        (self.paragraph_index, self.position)
    }
}

/// The result of finalizing a pending selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizedSelection {
    /// Resolved picks, in document order
    pub picks: Vec<ResolvedPick>,
    pub runs: Vec<Run>,
    /// Display text (runs joined with `" ... "`)
    pub text: String,
}

impl FinalizedSelection {
    pub fn is_non_contiguous(&self) -> bool {
        self.runs.len() > 1
    }

    /// Range from the first run's start to the last run's end.
    pub fn extent(&self) -> Option<TextRange> {
        let first = self.runs.first()?;
        let last = self.runs.last()?;
        Some(TextRange::new(first.range.start, last.range.end))
    }
}

/// Tracks pending word picks for one document.
#[derive(Debug, Clone)]
pub struct SelectionTracker {
    pending: Vec<SelectedToken>,
    last_accepted: Option<(String, DateTime<Utc>)>,
    adjacency_gap: usize,
    dedup_window: Duration,
}

impl Default for SelectionTracker {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl SelectionTracker {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            pending: Vec::new(),
            last_accepted: None,
            adjacency_gap: config.adjacency_gap,
            dedup_window: config.dedup_window(),
        }
    }

    pub fn state(&self) -> TrackerState {
        if self.pending.is_empty() {
            TrackerState::Idle
        } else {
            TrackerState::Picking
        }
    }

    /// Pending picks, sorted by `(paragraph_index, position)`.
    pub fn pending(&self) -> &[SelectedToken] {
        &self.pending
    }

    /// Handle a word click.
    pub fn click(&mut self, event: WordClick, doc: &FlatDocument) -> TrackerState {
        let range = match event.anchor {
            AnchorState::Attached => doc.word_range(event.paragraph_index, event.position),
            AnchorState::Detached => None,
        };
        if range.is_none() {
            debug!(
                word = %event.word,
                paragraph = event.paragraph_index,
                position = event.position,
                "click left unresolved"
            );
        }

        let token = SelectedToken {
            word: event.word,
            position: event.position,
            paragraph_index: event.paragraph_index,
            range,
        };

        if !event.modifier {
            self.pending = vec![token];
            return self.state();
        }

        let mut next = self.pending.clone();
        match next.iter().position(|t| t.key() == token.key()) {
            Some(index) => {
                next.remove(index);
            }
            None => next.push(token),
        }
        next.sort_by_key(SelectedToken::key);
        self.pending = next;
        self.state()
    }

    /// Drop the pending selection without creating anything.
    pub fn cancel(&mut self) {
        self.pending.clear();
    }

    /// Consume the pending selection.
    ///
    /// Unresolved picks fall back to a text search for their word; picks
    /// that still cannot be located are dropped. Returns `None` when nothing
    /// is left, or when the same text was accepted within the window. The
    /// result is not recorded as accepted; call [`accept`](Self::accept) once
    /// it has actually been stored.
    pub fn finalize(&mut self, doc: &FlatDocument, now: DateTime<Utc>) -> Option<FinalizedSelection> {
        let pending = std::mem::take(&mut self.pending);
        if pending.is_empty() {
            return None;
        }

        let picks: Vec<ResolvedPick> = pending
            .into_iter()
            .filter_map(|token| {
                let range = token
                    .range
                    .or_else(|| doc.find_word(&token.word, Some(token.paragraph_index)));
                match range {
                    Some(range) => Some(ResolvedPick {
                        paragraph_index: doc.paragraph_of(range.start).unwrap_or(token.paragraph_index),
                        range,
                        position: token.position,
                    }),
                    None => {
                        warn!(word = %token.word, "dropping pick that could not be located");
                        None
                    }
                }
            })
            .collect();

        if picks.is_empty() {
            return None;
        }

        let runs = group_runs(&picks, doc, self.adjacency_gap);
        let text = display_text(&runs);
        if text.is_empty() {
            return None;
        }
        if self.is_recent_duplicate(&text, now) {
            debug!(text, "suppressing repeated selection");
            return None;
        }

        let mut picks = picks;
        picks.sort_by_key(|p| (p.range.start, p.range.end));
        Some(FinalizedSelection { picks, runs, text })
    }

    /// Record `text` as accepted at `now` unless an equal or similar text was
    /// accepted within the suppression window. Returns whether it was accepted.
    pub fn accept(&mut self, text: &str, now: DateTime<Utc>) -> bool {
        if self.is_recent_duplicate(text, now) {
            debug!(text, "suppressing repeated selection");
            return false;
        }
        self.last_accepted = Some((text.to_string(), now));
        true
    }

    /// True if an equal or similar text was accepted less than the window ago.
    pub fn is_recent_duplicate(&self, text: &str, now: DateTime<Utc>) -> bool {
        match &self.last_accepted {
            Some((previous, at)) => now - *at < self.dedup_window && similar_text(previous, text),
            None => false,
        }
    }
}

/// Case- and punctuation-insensitive comparison at word level: equal, or
/// one text's word sequence appearing whole inside the other's.
pub fn similar_text(a: &str, b: &str) -> bool {
    let a = comparable_words(a);
    let b = comparable_words(b);
    if a.is_empty() || b.is_empty() {
        return false;
    }
    contains_words(&a, &b) || contains_words(&b, &a)
}

fn comparable_words(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|w| w.trim_matches(|c: char| c.is_ascii_punctuation()))
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

// `needle` must be non-empty
fn contains_words(haystack: &[String], needle: &[String]) -> bool {
    needle.len() <= haystack.len() && haystack.windows(needle.len()).any(|w| w == needle)
}
