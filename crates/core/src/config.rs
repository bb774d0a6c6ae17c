//! Configuration for a compare run

use serde::{Deserialize, Serialize};

/// Identifies one of the two compared documents.
///
/// `Main` is the left-hand pane of the host; alignment output is always
/// reported with `main` bound to this view, whatever internal swaps the
/// engine performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViewId {
    Main,
    Sub,
}

impl ViewId {
    /// Index usable for per-view arrays (`Main` = 0, `Sub` = 1).
    pub fn index(self) -> usize {
        match self {
            ViewId::Main => 0,
            ViewId::Sub => 1,
        }
    }

    pub fn other(self) -> ViewId {
        match self {
            ViewId::Main => ViewId::Sub,
            ViewId::Sub => ViewId::Main,
        }
    }
}

/// Inclusive line range of a selection within one view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRange {
    pub first: usize,
    pub last: usize,
}

impl LineRange {
    pub fn new(first: usize, last: usize) -> Self {
        Self { first, last }
    }

    /// Number of lines covered (inclusive bounds).
    pub fn len(&self) -> usize {
        self.last.saturating_sub(self.first) + 1
    }

    pub fn is_empty(&self) -> bool {
        self.last < self.first
    }
}

/// Options recognized by the compare engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompareOptions {
    /// Fold ASCII `A`-`Z` to lowercase while hashing and tokenizing.
    pub ignore_case: bool,

    /// Space and tab bytes contribute neither to hashes nor to word/char
    /// sequences.
    pub ignore_spaces: bool,

    /// Drop lines whose normalized content is empty.
    pub ignore_empty_lines: bool,

    /// Detect blocks of lines moved between the two documents.
    pub detect_moves: bool,

    /// Refine mismatched words down to character-level change ranges.
    pub char_precision: bool,

    /// Minimum percentage (0-100) of matching content for two lines to be
    /// paired as a changed pair rather than a remove/add.
    pub match_percent_threshold: usize,

    /// Compare only the selected line ranges instead of whole documents.
    pub selection_compare: bool,

    /// Selections per view, indexed by [`ViewId::index`]. Only consulted
    /// when `selection_compare` is set.
    pub selections: [LineRange; 2],

    /// Run the find-unique short-circuit mode instead of the full pipeline.
    pub find_unique_mode: bool,

    /// Which view holds the older file; that side colors as REMOVED, the
    /// other as ADDED.
    pub old_file_view: ViewId,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            ignore_case: false,
            ignore_spaces: false,
            ignore_empty_lines: false,
            detect_moves: true,
            char_precision: true,
            match_percent_threshold: 50,
            selection_compare: false,
            selections: [LineRange::default(); 2],
            find_unique_mode: false,
            old_file_view: ViewId::Main,
        }
    }
}

impl CompareOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ignore_case(mut self, ignore: bool) -> Self {
        self.ignore_case = ignore;
        self
    }

    pub fn with_ignore_spaces(mut self, ignore: bool) -> Self {
        self.ignore_spaces = ignore;
        self
    }

    pub fn with_ignore_empty_lines(mut self, ignore: bool) -> Self {
        self.ignore_empty_lines = ignore;
        self
    }

    pub fn with_detect_moves(mut self, detect: bool) -> Self {
        self.detect_moves = detect;
        self
    }

    pub fn with_char_precision(mut self, precise: bool) -> Self {
        self.char_precision = precise;
        self
    }

    pub fn with_match_percent_threshold(mut self, percent: usize) -> Self {
        self.match_percent_threshold = percent.min(100);
        self
    }

    /// Restrict the compare to one selection per view.
    pub fn with_selections(mut self, main: LineRange, sub: LineRange) -> Self {
        self.selection_compare = true;
        self.selections = [main, sub];
        self
    }

    pub fn with_find_unique_mode(mut self, unique: bool) -> Self {
        self.find_unique_mode = unique;
        self
    }

    pub fn with_old_file_view(mut self, view: ViewId) -> Self {
        self.old_file_view = view;
        self
    }

    pub(crate) fn selection(&self, view: ViewId) -> LineRange {
        self.selections[view.index()]
    }
}
