//! Lexspan: Lexical Span Annotation Engine
//!
//! Finds vocabulary items in text and keeps a log of annotated occurrences.
//!
//! # Core Concepts
//!
//! - **Patterns**: vocabulary phrases, possibly wildcarded (`sb`, `sth`,
//!   `one's`) or discontiguous (`keep ... at bay`), compiled to
//!   case-insensitive searches
//! - **Spans**: resolved, pairwise non-overlapping matches; longest wins
//! - **Selections**: word picks turned into contiguous runs within a
//!   flattened document
//! - **Records**: the canonical persisted annotation, normalized from every
//!   historical stored shape
//!
//! # Example
//!
//! ```
//! use lexspan::{AutoAnnotator, LexicalPattern};
//!
//! let annotator = AutoAnnotator::new(&[LexicalPattern::new("p1", "running fast")]);
//! let segments = annotator.annotate("he was running fast");
//! assert_eq!(segments.len(), 2);
//! ```

pub mod config;
pub mod export;
pub mod migrate;
pub mod record;
pub mod selection;
pub mod session;
pub mod span;
pub mod storage;

pub use config::{default_config_path, ConfigError, ConfigResult, EngineConfig};
pub use record::{AnnotationRecord, RecordCollection, RecordError, RecordId};
pub use selection::{FlatDocument, SelectionTracker, TrackerState, WordClick};
pub use session::{AnnotationSession, SelectionOutcome, SessionError, SessionResult};
pub use span::{AutoAnnotator, LexicalPattern, MatchSpan, PatternError, PatternResult, Segment, TextRange};
pub use storage::{JsonFileStore, MemoryStore, OpenStore, RecordStore, SqliteStore, StorageError, StorageResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
