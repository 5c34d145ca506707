//! Lexical patterns and their compiled search expressions
//!
//! A pattern is a vocabulary phrase as authored: it may carry parenthesized
//! grammatical annotations (`"run (v)"`), wildcard placeholders
//! (`"take sth for granted"`, `"* of the month"`) or a gap marker
//! (`"not only ... but also"`). Compilation reduces it to a search key and a
//! case-insensitive regular expression.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use thiserror::Error;

/// Errors raised while compiling a pattern
#[derive(Debug, Error)]
pub enum PatternError {
    #[error("pattern '{0}' is empty after stripping annotations")]
    EmptyKey(String),

    #[error("pattern '{pattern}' produced an invalid expression: {source}")]
    InvalidExpression {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Result type for pattern compilation
pub type PatternResult<T> = Result<T, PatternError>;

/// A target phrase to search for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LexicalPattern {
    /// Identifier of the lexical item this pattern belongs to
    #[serde(default)]
    pub id: String,
    /// The phrase as authored, annotations and markers included
    #[serde(alias = "text", alias = "targetLexeme")]
    pub phrase: String,
    /// Display-filter attribute ("positive", "negative", "neutral", ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<String>,
}

impl LexicalPattern {
    pub fn new(id: impl Into<String>, phrase: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            phrase: phrase.into(),
            sentiment: None,
        }
    }

    pub fn with_sentiment(mut self, sentiment: impl Into<String>) -> Self {
        self.sentiment = Some(sentiment.into());
        self
    }

    /// The phrase with annotations, parentheses and extra whitespace removed.
    pub fn search_key(&self) -> String {
        strip_annotations(&self.phrase)
    }

    /// True when the phrase uses a gap marker ("A ... B").
    pub fn is_discontiguous(&self) -> bool {
        split_gaps(&self.search_key()).len() > 1
    }

    /// Compile this pattern into a case-insensitive expression.
    pub fn compile(&self) -> PatternResult<CompiledPattern> {
        let key = self.search_key();
        let parts = split_gaps(&key);
        if parts.is_empty() {
            return Err(PatternError::EmptyKey(self.phrase.clone()));
        }

        let expression = parts
            .iter()
            .map(|part| fragment_expression(part))
            .collect::<Vec<_>>()
            .join(".*?");

        let regex = RegexBuilder::new(&expression)
            .case_insensitive(true)
            .build()
            .map_err(|source| PatternError::InvalidExpression {
                pattern: self.phrase.clone(),
                source,
            })?;

        Ok(CompiledPattern {
            key,
            discontiguous: parts.len() > 1,
            regex,
        })
    }
}

/// A pattern reduced to its search key and expression.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pub key: String,
    pub discontiguous: bool,
    pub regex: Regex,
}

/// Keep only patterns whose sentiment matches the active filter.
///
/// `None` disables filtering. Patterns without a sentiment never pass an
/// active filter.
pub fn filter_by_sentiment(patterns: &[LexicalPattern], sentiment: Option<&str>) -> Vec<LexicalPattern> {
    match sentiment {
        None => patterns.to_vec(),
        Some(wanted) => patterns
            .iter()
            .filter(|p| {
                p.sentiment
                    .as_deref()
                    .is_some_and(|s| s.eq_ignore_ascii_case(wanted))
            })
            .cloned()
            .collect(),
    }
}

/// Placeholder words that stand for "some word or short phrase".
const PHRASE_WILDCARDS: &[&str] = &["sb", "sth", "someone", "something", "somebody", "*"];

/// Placeholder words that stand for a single possessive determiner.
const POSSESSIVE_WILDCARDS: &[&str] = &["one's", "sb's", "someone's", "somebody's"];

const PHRASE_WILDCARD_EXPR: &str = r"[\w'’-]+(?:\s+[\w'’-]+){0,2}?";
const POSSESSIVE_WILDCARD_EXPR: &str = r"(?:my|your|his|her|its|our|their|[\w’-]+'s|[\w-]+’s)";

/// Parenthesized grammatical annotations such as `(v)` or `(phr. v.)`.
fn annotation_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\([^()]*\)").expect("static annotation pattern is valid"))
}

fn strip_annotations(phrase: &str) -> String {
    let without_tags = annotation_regex().replace_all(phrase, " ");
    without_tags
        .replace(['(', ')'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split a search key on gap markers (`...` or `…`), dropping empty parts.
fn split_gaps(key: &str) -> Vec<String> {
    key.replace('…', "...")
        .split("...")
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

fn fragment_expression(fragment: &str) -> String {
    let words: Vec<String> = fragment
        .split_whitespace()
        .map(|word| {
            let lower = word.to_lowercase();
            if PHRASE_WILDCARDS.contains(&lower.as_str()) {
                PHRASE_WILDCARD_EXPR.to_string()
            } else if POSSESSIVE_WILDCARDS.contains(&lower.as_str()) {
                POSSESSIVE_WILDCARD_EXPR.to_string()
            } else {
                regex::escape(word)
            }
        })
        .collect();

    let body = words.join(r"\s+");
    let lead = if starts_with_word_char(fragment) { r"\b" } else { "" };
    let trail = if ends_with_word_char(fragment) { r"\b" } else { "" };
    format!("{lead}{body}{trail}")
}

fn starts_with_word_char(s: &str) -> bool {
    s.chars().next().is_some_and(is_word_char)
}

fn ends_with_word_char(s: &str) -> bool {
    s.chars().next_back().is_some_and(is_word_char)
}

fn is_word_char(c: char) -> bool {
    // `*` expands to a word expression, so it sits on a word boundary too
    c.is_alphanumeric() || c == '_' || c == '*'
}
