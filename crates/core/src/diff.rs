//! Block-diff data model
//!
//! The line-level LCS partitions both documents into blocks. Later pipeline
//! stages (move detection, block re-alignment) mutate the attached
//! [`BlockInfo`] in place; the marker/alignment emitter is the sole reader
//! of the final state. Blocks live in a stable `Vec` and reference each
//! other by index, never by pointer.

use crate::algorithm::{Segment, SegmentKind};
use crate::extract::DocCmpInfo;

/// Half-open `[off, off + len)` range, measured in the domain of its
/// container: line indices for a document block, byte offsets for a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Section {
    pub off: usize,
    pub len: usize,
}

impl Section {
    pub fn new(off: usize, len: usize) -> Self {
        Self { off, len }
    }

    pub fn end(&self) -> usize {
        self.off + self.len
    }

    pub fn contains(&self, pos: usize) -> bool {
        pos >= self.off && pos < self.end()
    }
}

/// One line of a block that was paired with a line in the opposite block,
/// with its intra-line change ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedLine {
    /// Line index relative to the owning block.
    pub line: usize,
    /// Changed byte ranges, relative to the line start.
    pub changes: Vec<Section>,
}

impl ChangedLine {
    pub fn new(line: usize) -> Self {
        Self {
            line,
            changes: Vec::new(),
        }
    }
}

/// Mutable companion state of a [`BlockDiff`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockInfo {
    /// Index of the paired opposite-type block once the re-aligner linked
    /// them. Symmetric: if block A points at B, B points back at A.
    pub match_block: Option<usize>,

    /// Paired lines with intra-line changes, in-block indices strictly
    /// increasing.
    pub changed_lines: Vec<ChangedLine>,

    /// Spans of lines promoted to MOVED, over block-relative indices.
    /// Disjoint; every covered index is consumed for later passes.
    pub moves: Vec<Section>,
}

impl BlockInfo {
    /// Length of the move span covering `line`, or 0 when unmoved.
    pub fn moved_section(&self, line: usize) -> usize {
        for mv in &self.moves {
            if mv.contains(line) {
                return mv.len;
            }
        }

        0
    }

    /// When `line` sits inside a move span, the first index past that span.
    pub fn next_unmoved(&self, line: usize) -> Option<usize> {
        for mv in &self.moves {
            if mv.contains(line) {
                return Some(mv.end());
            }
        }

        None
    }

    /// Record a new move span, keeping the list sorted by offset. Spans are
    /// disjoint by construction: a covered index is never matched again.
    pub fn add_move(&mut self, span: Section) {
        let pos = self.moves.partition_point(|mv| mv.off < span.off);
        self.moves.insert(pos, span);
    }
}

/// A maximal contiguous run classified by the line-level LCS.
///
/// `off1`/`off2` index the normalized-line arrays of the two sides; a
/// `Match` block is positioned on both, an `In1`/`In2` block only on its
/// own side (the opposite offset records the insertion point).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockDiff {
    pub kind: SegmentKind,
    pub off1: usize,
    pub off2: usize,
    pub len: usize,
    pub info: BlockInfo,
}

impl BlockDiff {
    /// Offset into the block's own side (`off1` for `Match`/`In1`, `off2`
    /// for `In2`).
    pub fn own_off(&self) -> usize {
        match self.kind {
            SegmentKind::Match | SegmentKind::In1 => self.off1,
            SegmentKind::In2 => self.off2,
        }
    }

    /// Lift the LCS segments into blocks with empty companion state.
    pub fn from_segments(segments: &[Segment]) -> Vec<BlockDiff> {
        segments
            .iter()
            .map(|seg| BlockDiff {
                kind: seg.kind,
                off1: seg.off1,
                off2: seg.off2,
                len: seg.len,
                info: BlockInfo::default(),
            })
            .collect()
    }
}

/// Everything one compare run operates on. Built once per run, mutated by
/// the pipeline stages, discarded at the end.
#[derive(Debug, Clone, Default)]
pub struct CompareInfo {
    pub doc1: DocCmpInfo,
    pub doc2: DocCmpInfo,
    pub block_diffs: Vec<BlockDiff>,
}
