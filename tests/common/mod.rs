//! Common test utilities for lexspan integration tests
//!
//! Shared fixtures (documents, pattern lists, stored log documents in each
//! historical shape) and seeded random text generation.

#![allow(dead_code)]

pub mod fixtures;
pub mod random;

pub use fixtures::{at, canonical_log, legacy_log, sample_document, sample_patterns, write_json};
pub use random::{random_paragraph, random_patterns, seeded};
