//! Moved-block detection
//!
//! Promotes lines inside removed/added blocks to MOVED when a span in some
//! opposite-type block is mutually the best match of each other. Runs a
//! fixed point: every committed pair shrinks the set of unmoved lines and
//! commits are never undone, so the loop terminates.

use tracing::debug;

use crate::algorithm::SegmentKind;
use crate::diff::{CompareInfo, Section};

/// Best candidate found for one lookup position.
#[derive(Debug, Clone, Copy, Default)]
struct MatchInfo {
    /// Start of the matched run on the lookup side, block-relative.
    lookup_off: usize,
    /// Arena index of the block holding the run; `None` when no candidate
    /// survived (including ambiguous equal-length ties).
    match_diff: Option<usize>,
    /// Start of the run inside the match block.
    match_off: usize,
    /// Run length; kept even when ties null `match_diff` so longer
    /// candidates must still strictly beat it.
    match_len: usize,
}

/// Scan every opposite-type block for the longest run of matching lines
/// around `lookup_off`. Two equally long candidates cancel each other.
fn find_best_match(cmp: &CompareInfo, lookup_idx: usize, lookup_off: usize) -> MatchInfo {
    let lookup = &cmp.block_diffs[lookup_idx];

    let (lookup_lines, match_lines, match_kind) = if lookup.kind == SegmentKind::In1 {
        (&cmp.doc1.lines, &cmp.doc2.lines, SegmentKind::In2)
    } else {
        (&cmp.doc2.lines, &cmp.doc1.lines, SegmentKind::In1)
    };

    let lookup_base = lookup.own_off();
    let lookup_key = lookup_lines[lookup_base + lookup_off];

    let mut best = MatchInfo::default();
    let mut min_match_len = 1;

    for (idx, match_diff) in cmp.block_diffs.iter().enumerate() {
        if match_diff.kind != match_kind || match_diff.len < min_match_len {
            continue;
        }

        let match_base = match_diff.own_off();
        let mut match_last_unmoved = 0;

        let mut match_off = 0;
        while match_off < match_diff.len {
            if match_lines[match_base + match_off] != lookup_key {
                match_off += 1;
                continue;
            }

            if let Some(next) = match_diff.info.next_unmoved(match_off) {
                match_last_unmoved = next;
                match_off = next;
                continue;
            }

            // Extend the run left as far as both sides keep matching and
            // stay unmoved; the match side is also fenced by the last
            // skipped moved span.
            let mut lookup_start = lookup_off;
            let mut match_start = match_off;

            while lookup_start > 0
                && match_start > match_last_unmoved
                && lookup_lines[lookup_base + lookup_start - 1]
                    == match_lines[match_base + match_start - 1]
                && lookup.info.moved_section(lookup_start - 1) == 0
            {
                lookup_start -= 1;
                match_start -= 1;
            }

            // And right.
            let mut lookup_end = lookup_off + 1;
            let mut match_end = match_off + 1;

            while lookup_end < lookup.len
                && match_end < match_diff.len
                && lookup_lines[lookup_base + lookup_end] == match_lines[match_base + match_end]
                && lookup.info.moved_section(lookup_end) == 0
                && match_diff.info.moved_section(match_end) == 0
            {
                lookup_end += 1;
                match_end += 1;
            }

            let match_len = lookup_end - lookup_start;

            if best.match_len < match_len {
                best = MatchInfo {
                    lookup_off: lookup_start,
                    match_diff: Some(idx),
                    match_off: match_start,
                    match_len,
                };
                min_match_len = match_len;
            } else if best.match_len == match_len {
                // Ambiguous: reject rather than guess.
                best.match_diff = None;
            }

            match_off += 1;
        }
    }

    best
}

/// Commit the pair when the match is reciprocal. When the reverse lookup
/// prefers a third block, chase it from there instead; the original
/// candidate is dropped by zeroing its length so the caller re-examines
/// the same position.
fn resolve_match(
    cmp: &mut CompareInfo,
    lookup_idx: usize,
    lookup_off: usize,
    mi: &mut MatchInfo,
) -> bool {
    let Some(match_idx) = mi.match_diff else {
        return false;
    };

    let match_side_off = mi.match_off + (lookup_off - mi.lookup_off);
    let mut reverse = find_best_match(cmp, match_idx, match_side_off);

    if reverse.match_diff == Some(lookup_idx) {
        let span = Section::new(mi.lookup_off, mi.match_len);
        cmp.block_diffs[lookup_idx].info.add_move(span);

        let span = Section::new(mi.match_off, mi.match_len);
        cmp.block_diffs[match_idx].info.add_move(span);

        true
    } else if reverse.match_diff.is_some() {
        let resolved = resolve_match(cmp, match_idx, match_side_off, &mut reverse);
        mi.match_len = 0;
        resolved
    } else {
        false
    }
}

/// Detect moved line spans across all In1/In2 blocks.
pub fn find_moves(cmp: &mut CompareInfo) {
    debug!("detecting moved blocks");

    let mut repeat = true;

    while repeat {
        repeat = false;

        for lookup_idx in 0..cmp.block_diffs.len() {
            if cmp.block_diffs[lookup_idx].kind != SegmentKind::In1 {
                continue;
            }

            let mut lookup_off = 0;
            while lookup_off < cmp.block_diffs[lookup_idx].len {
                // Skip spans already promoted to MOVED.
                if let Some(next) = cmp.block_diffs[lookup_idx].info.next_unmoved(lookup_off) {
                    lookup_off = next;
                    continue;
                }

                let mut mi = find_best_match(cmp, lookup_idx, lookup_off);

                if resolve_match(cmp, lookup_idx, lookup_off, &mut mi) {
                    repeat = true;

                    if mi.match_len > 0 {
                        lookup_off = mi.lookup_off + mi.match_len;
                    }
                    // A zeroed length means a third-party chain was
                    // resolved; re-examine the same position.
                } else {
                    lookup_off += 1;
                }
            }
        }
    }
}
