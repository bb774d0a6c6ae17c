//! Compare orchestration
//!
//! Wires the pipeline together: extraction, line-level LCS, uniqueness
//! index, move detection, block re-alignment, emission. One engine instance
//! holds the options; each `compare` call builds and discards its own
//! working state.

use tracing::debug;

use crate::algorithm::{self, SegmentKind};
use crate::config::{CompareOptions, ViewId};
use crate::diff::{BlockDiff, CompareInfo, Section};
use crate::emit::{mark_all_diffs, AlignmentPair};
use crate::error::{CompareStatus, EngineError};
use crate::extract::{get_lines, DocCmpInfo};
use crate::host::{markers, MarkerSink, Progress, TextProvider};
use crate::moves::find_moves;
use crate::realign::compare_blocks;
use crate::unique::{find_unique_lines, run_find_unique};

/// Result of one compare run: the status plus the alignment map (empty on
/// `Match` and `Cancelled`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompareReport {
    pub status: CompareStatus,
    pub alignment: Vec<AlignmentPair>,
}

impl CompareReport {
    pub(crate) fn matched() -> Self {
        Self {
            status: CompareStatus::Match,
            alignment: Vec::new(),
        }
    }

    pub(crate) fn cancelled() -> Self {
        Self {
            status: CompareStatus::Cancelled,
            alignment: Vec::new(),
        }
    }

    /// Mismatch with a single alignment pair anchoring the two section
    /// starts (the find-unique mode's output shape).
    pub(crate) fn mismatch_at(main_line: usize, sub_line: usize) -> Self {
        let mut pair = AlignmentPair::default();
        pair.main.line = main_line;
        pair.sub.line = sub_line;

        Self {
            status: CompareStatus::Mismatch,
            alignment: vec![pair],
        }
    }

    pub fn is_match(&self) -> bool {
        self.status == CompareStatus::Match
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == CompareStatus::Cancelled
    }
}

/// The compare engine. Construct with [`CompareOptions`], then run
/// [`compare`](CompareEngine::compare) against a host.
pub struct CompareEngine {
    options: CompareOptions,
}

impl CompareEngine {
    pub fn new(options: CompareOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CompareOptions {
        &self.options
    }

    /// Run the configured compare mode. Markers and change highlights are
    /// deposited into `sink`; the returned report carries the status and
    /// the alignment map.
    pub fn compare(
        &self,
        provider: &dyn TextProvider,
        sink: &mut dyn MarkerSink,
        progress: &mut dyn Progress,
    ) -> Result<CompareReport, EngineError> {
        if self.options.find_unique_mode {
            run_find_unique(provider, sink, progress, &self.options)
        } else {
            run_compare(provider, sink, progress, &self.options)
        }
    }
}

impl Default for CompareEngine {
    fn default() -> Self {
        Self::new(CompareOptions::default())
    }
}

/// Build the two per-document states with their sections and masks.
pub(crate) fn setup_docs(options: &CompareOptions) -> (DocCmpInfo, DocCmpInfo) {
    let mut doc1 = DocCmpInfo::new(ViewId::Main);
    let mut doc2 = DocCmpInfo::new(ViewId::Sub);

    if options.selection_compare {
        let sel1 = options.selection(ViewId::Main);
        doc1.section = Section::new(sel1.first, sel1.len());

        let sel2 = options.selection(ViewId::Sub);
        doc2.section = Section::new(sel2.first, sel2.len());
    }

    if options.old_file_view == ViewId::Main {
        doc1.block_diff_mask = markers::REMOVED;
        doc2.block_diff_mask = markers::ADDED;
    } else {
        doc1.block_diff_mask = markers::ADDED;
        doc2.block_diff_mask = markers::REMOVED;
    }

    (doc1, doc2)
}

/// The full compare pipeline.
pub(crate) fn run_compare(
    provider: &dyn TextProvider,
    sink: &mut dyn MarkerSink,
    progress: &mut dyn Progress,
    options: &CompareOptions,
) -> Result<CompareReport, EngineError> {
    let (mut doc1, mut doc2) = setup_docs(options);

    if !get_lines(provider, progress, &mut doc1, options)? {
        return Ok(CompareReport::cancelled());
    }
    if !progress.next_phase() {
        return Ok(CompareReport::cancelled());
    }

    if !get_lines(provider, progress, &mut doc2, options)? {
        return Ok(CompareReport::cancelled());
    }
    if !progress.next_phase() {
        return Ok(CompareReport::cancelled());
    }

    let (segments, swapped) = algorithm::diff_sequences(&doc1.lines, &doc2.lines);

    if swapped {
        std::mem::swap(&mut doc1, &mut doc2);
    }

    debug!(blocks = segments.len(), swapped, "line-level diff done");

    let mut cmp = CompareInfo {
        doc1,
        doc2,
        block_diffs: BlockDiff::from_segments(&segments),
    };

    if cmp.block_diffs.is_empty()
        || (cmp.block_diffs.len() == 1 && cmp.block_diffs[0].kind == SegmentKind::Match)
    {
        return Ok(CompareReport::matched());
    }

    find_unique_lines(&mut cmp);

    if options.detect_moves {
        find_moves(&mut cmp);
    }

    if !progress.next_phase() {
        return Ok(CompareReport::cancelled());
    }

    progress.set_max_count(cmp.block_diffs.len() - 1);

    {
        let CompareInfo {
            doc1,
            doc2,
            block_diffs,
        } = &mut cmp;

        for i in 1..block_diffs.len() {
            // Adjacent removed/added blocks form a replacement: link them
            // and try to pair their lines.
            if block_diffs[i].kind == SegmentKind::In2
                && block_diffs[i - 1].kind == SegmentKind::In1
            {
                block_diffs[i - 1].info.match_block = Some(i);
                block_diffs[i].info.match_block = Some(i - 1);

                let (head, tail) = block_diffs.split_at_mut(i);
                compare_blocks(provider, doc1, doc2, &mut head[i - 1], &mut tail[0], options)?;
            }

            if !progress.advance() {
                return Ok(CompareReport::cancelled());
            }
        }
    }

    if !progress.next_phase() {
        return Ok(CompareReport::cancelled());
    }

    match mark_all_diffs(provider, sink, progress, &cmp, options)? {
        Some(alignment) => Ok(CompareReport {
            status: CompareStatus::Mismatch,
            alignment,
        }),
        None => Ok(CompareReport::cancelled()),
    }
}
