//! Seeded random text for property checks

use lexspan::LexicalPattern;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

const VOCABULARY: &[&str] = &[
    "run", "running", "fast", "out", "of", "time", "the", "break", "down", "look", "up", "into", "it", "give",
    "in", "café", "naïve", "over", "and", "keep",
];

const PUNCTUATION: &[&str] = &[" ", " ", " ", ", ", ". ", "! ", "  ", " - "];

pub fn seeded(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Words from a small vocabulary joined by assorted separators, so that
/// patterns built from the same vocabulary overlap often.
pub fn random_paragraph(rng: &mut StdRng, words: usize) -> String {
    let mut text = String::new();
    for i in 0..words {
        if i > 0 {
            text.push_str(PUNCTUATION.choose(rng).unwrap());
        }
        let word = VOCABULARY.choose(rng).unwrap();
        if rng.gen_bool(0.1) {
            text.push_str(&word.to_uppercase());
        } else {
            text.push_str(word);
        }
    }
    text
}

/// One- to three-word phrases, some with wildcards or a gap marker.
pub fn random_patterns(rng: &mut StdRng, count: usize) -> Vec<LexicalPattern> {
    (0..count)
        .map(|i| {
            let len = rng.gen_range(1..=3);
            let mut words: Vec<String> = (0..len).map(|_| VOCABULARY.choose(rng).unwrap().to_string()).collect();
            match rng.gen_range(0..6) {
                0 if len > 1 => words[1] = "sth".to_string(),
                1 if len > 1 => words.insert(1, "...".to_string()),
                _ => {}
            }
            LexicalPattern::new(format!("r{i}"), words.join(" "))
        })
        .collect()
}
