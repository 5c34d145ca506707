//! Contiguity grouping of picked words into runs

use super::document::FlatDocument;
use crate::span::TextRange;

/// Joiner between the runs of a non-contiguous selection
pub const GAP_MARKER: &str = " ... ";

/// A picked word with a resolved document range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPick {
    pub range: TextRange,
    pub paragraph_index: usize,
    pub position: usize,
}

/// A maximal group of adjacent picks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub range: TextRange,
    pub paragraph_index: usize,
    pub words: Vec<String>,
}

impl Run {
    fn start(pick: &ResolvedPick, doc: &FlatDocument) -> Self {
        Self {
            range: pick.range,
            paragraph_index: pick.paragraph_index,
            words: doc.slice(pick.range).map(|w| vec![w.to_string()]).unwrap_or_default(),
        }
    }

    fn extend(&mut self, pick: &ResolvedPick, doc: &FlatDocument) {
        if pick.range.end <= self.range.end {
            // Already covered (duplicate or nested pick)
            return;
        }
        let added = TextRange::new(pick.range.start.max(self.range.end), pick.range.end);
        if pick.range.start >= self.range.end {
            if let Some(word) = doc.slice(pick.range) {
                self.words.push(word.to_string());
            }
        } else if let (Some(last), Some(tail)) = (self.words.last_mut(), doc.slice(added)) {
            last.push_str(tail);
        }
        self.range.end = pick.range.end;
    }

    /// The run's words joined by single spaces.
    pub fn display(&self) -> String {
        self.words
            .iter()
            .map(|w| w.trim())
            .filter(|w| !is_gap_marker(w) && !w.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Group picks into runs.
///
/// Picks are ordered by document offset. A pick joins the current run when it
/// sits in the same paragraph and the text between them is at most `max_gap`
/// bytes of whitespace or punctuation; otherwise it starts a new run.
pub fn group_runs(picks: &[ResolvedPick], doc: &FlatDocument, max_gap: usize) -> Vec<Run> {
    let mut sorted: Vec<&ResolvedPick> = picks.iter().collect();
    sorted.sort_by_key(|p| (p.range.start, p.range.end));

    let mut runs: Vec<Run> = Vec::new();
    for pick in sorted {
        match runs.last_mut() {
            Some(run) if is_adjacent(run, pick, doc, max_gap) => run.extend(pick, doc),
            _ => runs.push(Run::start(pick, doc)),
        }
    }
    runs
}

fn is_adjacent(run: &Run, pick: &ResolvedPick, doc: &FlatDocument, max_gap: usize) -> bool {
    if run.paragraph_index != pick.paragraph_index {
        return false;
    }
    if pick.range.start <= run.range.end {
        return true;
    }
    let gap = TextRange::new(run.range.end, pick.range.start);
    gap.len() <= max_gap
        && doc
            .slice(gap)
            .is_some_and(|between| between.chars().all(|c| c.is_whitespace() || c.is_ascii_punctuation()))
}

/// Display text for a set of runs: words joined by spaces inside a run,
/// runs joined by `" ... "`. Empty runs are skipped so markers never repeat.
pub fn display_text(runs: &[Run]) -> String {
    runs.iter()
        .map(Run::display)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(GAP_MARKER)
}

fn is_gap_marker(word: &str) -> bool {
    word == "..." || word == "…"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn picks(doc: &FlatDocument, paragraph: usize, positions: &[usize]) -> Vec<ResolvedPick> {
        positions
            .iter()
            .map(|&position| ResolvedPick {
                range: doc.word_range(paragraph, position).unwrap(),
                paragraph_index: paragraph,
                position,
            })
            .collect()
    }

    #[test]
    fn splits_into_two_runs() {
        let doc = FlatDocument::new(["w0 w1 w2 w3 w4 w5 w6 w7 w8 w9 w10"]);
        let runs = group_runs(&picks(&doc, 0, &[2, 3, 4, 9]), &doc, 5);
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].words, vec!["w2", "w3", "w4"]);
        assert_eq!(runs[1].words, vec!["w9"]);
        assert_eq!(display_text(&runs), "w2 w3 w4 ... w9");
    }

    #[test]
    fn order_of_picks_does_not_matter() {
        let doc = FlatDocument::new(["alpha beta gamma delta"]);
        let runs = group_runs(&picks(&doc, 0, &[3, 0, 1]), &doc, 5);
        assert_eq!(display_text(&runs), "alpha beta ... delta");
    }

    #[test]
    fn punctuation_gap_keeps_run_together() {
        let doc = FlatDocument::new(["well, then"]);
        let runs = group_runs(&picks(&doc, 0, &[0, 1]), &doc, 5);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].range, TextRange::new(0, 10));
    }

    #[test]
    fn gap_wider_than_threshold_splits() {
        let doc = FlatDocument::new(["left  --  ,  right"]);
        let runs = group_runs(&picks(&doc, 0, &[0, 3]), &doc, 5);
        assert_eq!(runs.len(), 2);
        let wide = group_runs(&picks(&doc, 0, &[0, 3]), &doc, 20);
        assert_eq!(wide.len(), 1);
    }

    #[test]
    fn paragraph_boundary_always_splits() {
        let doc = FlatDocument::new(["end", "start"]);
        let mut all = picks(&doc, 0, &[0]);
        all.extend(picks(&doc, 1, &[0]));
        let runs = group_runs(&all, &doc, 5);
        assert_eq!(runs.len(), 2);
        assert_eq!(display_text(&runs), "end ... start");
    }

    #[test]
    fn duplicate_picks_collapse() {
        let doc = FlatDocument::new(["same word"]);
        let runs = group_runs(&picks(&doc, 0, &[1, 1]), &doc, 5);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].words, vec!["word"]);
    }

    #[test]
    fn display_never_doubles_markers() {
        let runs = vec![
            Run { range: TextRange::new(0, 1), paragraph_index: 0, words: vec!["a".into()] },
            Run { range: TextRange::new(5, 8), paragraph_index: 0, words: vec!["...".into()] },
            Run { range: TextRange::new(9, 10), paragraph_index: 0, words: vec!["b".into()] },
        ];
        assert_eq!(display_text(&runs), "a ... b");
    }

    #[test]
    fn single_word_has_no_marker() {
        let doc = FlatDocument::new(["lonely"]);
        let runs = group_runs(&picks(&doc, 0, &[0]), &doc, 5);
        assert_eq!(display_text(&runs), "lonely");
    }
}
