//! Manual selections: document positions, word picks, runs and context

mod context;
mod document;
mod grouping;
mod tracker;

pub use context::{extract_context, sentence_bounds, truncate_words, TRUNCATION_MARKER};
pub use document::FlatDocument;
pub use grouping::{display_text, group_runs, ResolvedPick, Run, GAP_MARKER};
pub use tracker::{
    similar_text, AnchorState, FinalizedSelection, SelectedToken, SelectionTracker, TrackerState, WordClick,
};
