//! Block re-alignment
//!
//! For every adjacent removed/added block pair, pair up individual lines by
//! character convergence and refine each kept pair down to word- and
//! char-level change ranges. This is what turns a remove+add into a
//! "changed" line with intra-line highlights.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use tracing::trace;

use crate::algorithm::{self, SegmentKind};
use crate::config::CompareOptions;
use crate::diff::{BlockDiff, ChangedLine, Section};
use crate::error::HostError;
use crate::extract::DocCmpInfo;
use crate::host::TextProvider;
use crate::tokens;

/// Candidate line pair, ordered by descending convergence, ties broken by
/// the smaller line indices.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ConvKey {
    convergence: f32,
    line1: usize,
    line2: usize,
}

impl Eq for ConvKey {}

impl Ord for ConvKey {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .convergence
            .total_cmp(&self.convergence)
            .then(self.line1.cmp(&other.line1))
            .then(self.line2.cmp(&other.line2))
    }
}

impl PartialOrd for ConvKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Pair lines of an adjacent (In1, In2) block pair and emit intra-line
/// change ranges into both blocks' `changed_lines`.
///
/// The assignment search restarts the greedy matching at every element of
/// the convergence-ordered candidate set, so its cost is quadratic in the
/// set size; the candidate set itself is bounded by the product of the two
/// block lengths.
pub fn compare_blocks(
    provider: &dyn TextProvider,
    doc1: &DocCmpInfo,
    doc2: &DocCmpInfo,
    block1: &mut BlockDiff,
    block2: &mut BlockDiff,
    options: &CompareOptions,
) -> Result<(), HostError> {
    let chunk1 = tokens::block_chars(provider, doc1, block1.off1, block1.len, options)?;
    let chunk2 = tokens::block_chars(provider, doc2, block2.off2, block2.len, options)?;

    let count1 = chunk1.len();
    let count2 = chunk2.len();

    let mut ordered: BTreeSet<ConvKey> = BTreeSet::new();

    let mut line1 = 0;
    while line1 < count1 {
        if chunk1[line1].is_empty() {
            line1 += 1;
            continue;
        }

        if let Some(next) = block1.info.next_unmoved(line1) {
            line1 = next;
            continue;
        }

        let mut line2 = 0;
        while line2 < count2 {
            if chunk2[line2].is_empty() {
                line2 += 1;
                continue;
            }

            if let Some(next) = block2.info.next_unmoved(line2) {
                line2 = next;
                continue;
            }

            let size1 = chunk1[line1].len();
            let size2 = chunk2[line2].len();
            let max_size = size1.max(size2);

            // Cheap size prefilter before running the char LCS.
            if size1.min(size2) * 100 / max_size >= options.match_percent_threshold {
                let (segments, _) = algorithm::diff_sequences(&chunk1[line1], &chunk2[line2]);

                let match_total: usize = segments
                    .iter()
                    .filter(|s| s.kind == SegmentKind::Match)
                    .map(|s| s.len)
                    .sum();

                let convergence = match_total as f32 * 100.0 / max_size as f32;

                if convergence >= options.match_percent_threshold as f32 {
                    ordered.insert(ConvKey {
                        convergence,
                        line1,
                        line2,
                    });
                }
            }

            line2 += 1;
        }

        line1 += 1;
    }

    // Greedy assignment, restarted at every candidate: the top-convergence
    // pair may lock out a cluster of slightly-lower pairs that collectively
    // score higher.
    let keys: Vec<ConvKey> = ordered.iter().copied().collect();

    let mut best_mappings: BTreeMap<usize, (f32, usize)> = BTreeMap::new();
    let mut best_convergence = 0f32;

    for start in 0..keys.len() {
        let mut mappings: BTreeMap<usize, (f32, usize)> = BTreeMap::new();
        let mut mapped1 = vec![false; count1];
        let mut mapped2 = vec![false; count2];
        let mut mapped_count1 = 0;
        let mut mapped_count2 = 0;

        for key in &keys[start..] {
            if !mapped1[key.line1] && !mapped2[key.line2] {
                mappings.insert(key.line1, (key.convergence, key.line2));

                mapped_count1 += 1;
                if mapped_count1 == count1 {
                    break;
                }

                mapped_count2 += 1;
                if mapped_count2 == count2 {
                    break;
                }

                mapped1[key.line1] = true;
                mapped2[key.line2] = true;
            }
        }

        // Only pairs forming an ascending line2 subsequence can be kept;
        // score the assignment by their summed convergence.
        let mut current = 0f32;
        let mut last_line2: Option<usize> = None;

        for (&_line1, &(convergence, line2)) in &mappings {
            if last_line2.map_or(true, |last| line2 > last) {
                current += convergence;
                last_line2 = Some(line2);
            }
        }

        if best_convergence < current {
            best_convergence = current;
            best_mappings = mappings;
        }
    }

    if !best_mappings.is_empty() {
        compare_lines(provider, doc1, doc2, block1, block2, &best_mappings, options)?;
    }

    Ok(())
}

/// Word- then char-level refinement of the kept line pairs.
fn compare_lines(
    provider: &dyn TextProvider,
    doc1: &DocCmpInfo,
    doc2: &DocCmpInfo,
    block1: &mut BlockDiff,
    block2: &mut BlockDiff,
    mappings: &BTreeMap<usize, (f32, usize)>,
    options: &CompareOptions,
) -> Result<(), HostError> {
    let mut last_line2: Option<usize> = None;

    for (&map_line1, &(_, map_line2)) in mappings {
        // line1 keys ascend; keep only pairs whose line2 ascends too.
        if last_line2.is_some_and(|last| map_line2 <= last) {
            continue;
        }

        last_line2 = Some(map_line2);

        trace!(
            line1 = doc1.lines[block1.off1 + map_line1].line,
            line2 = doc2.lines[block2.off2 + map_line2].line,
            "comparing paired lines"
        );

        let words1 = tokens::line_words(
            provider,
            doc1.view,
            doc1.lines[block1.off1 + map_line1].line,
            options,
        )?;
        let words2 = tokens::line_words(
            provider,
            doc2.view,
            doc2.lines[block2.off2 + map_line2].line,
            options,
        )?;

        let (word_segs, swapped) = algorithm::diff_sequences(&words1, &words2);

        // From here on, "side 1" is the LCS engine's side 1.
        let (p_words1, p_words2) = if swapped {
            (&words2, &words1)
        } else {
            (&words1, &words2)
        };
        let (p_doc1, p_doc2) = if swapped { (doc2, doc1) } else { (doc1, doc2) };
        let (p_block1, p_block2) = if swapped {
            (&mut *block2, &mut *block1)
        } else {
            (&mut *block1, &mut *block2)
        };
        let (line1, line2) = if swapped {
            (map_line2, map_line1)
        } else {
            (map_line1, map_line2)
        };

        p_block1.info.changed_lines.push(ChangedLine::new(line1));
        p_block2.info.changed_lines.push(ChangedLine::new(line2));

        let line_off1 = provider.line_start(
            p_doc1.view,
            p_doc1.lines[line1 + p_block1.own_off()].line,
        )?;
        let line_off2 = provider.line_start(
            p_doc2.view,
            p_doc2.lines[line2 + p_block2.own_off()].line,
        )?;

        let line_len1: usize = p_words1.iter().map(|w| w.len).sum();
        let line_len2: usize = p_words2.iter().map(|w| w.len).sum();

        let mut total_match_len = 0;

        let mut i = 0;
        while i < word_segs.len() {
            let ld = &word_segs[i];

            match ld.kind {
                SegmentKind::Match => {
                    for j in 0..ld.len {
                        total_match_len += p_words1[ld.off1 + j].len;
                    }
                }
                SegmentKind::In2 => {
                    let first = p_words2[ld.off2];
                    let last = p_words2[ld.off2 + ld.len - 1];

                    let change = Section::new(first.pos, last.pos + last.len - first.pos);
                    push_change(p_block2, change);
                }
                SegmentKind::In1 => {
                    // A word substitution: drill into char level to find
                    // sub-word similarities.
                    if options.char_precision
                        && i + 1 < word_segs.len()
                        && word_segs[i + 1].kind == SegmentKind::In2
                    {
                        let ld2 = &word_segs[i + 1];

                        let first1 = p_words1[ld.off1];
                        let last1 = p_words1[ld.off1 + ld.len - 1];
                        let word_off1 = first1.pos;
                        let word_end1 = last1.pos + last1.len;

                        let first2 = p_words2[ld2.off2];
                        let last2 = p_words2[ld2.off2 + ld2.len - 1];
                        let word_off2 = first2.pos;
                        let word_end2 = last2.pos + last2.len;

                        let sec1 = tokens::section_chars(
                            provider,
                            p_doc1.view,
                            line_off1 + word_off1,
                            line_off1 + word_end1,
                            options,
                        )?;
                        let sec2 = tokens::section_chars(
                            provider,
                            p_doc2.view,
                            line_off2 + word_off2,
                            line_off2 + word_end2,
                            options,
                        )?;

                        let (sec_segs, sec_swapped) = algorithm::diff_sequences(&sec1, &sec2);

                        let (p_sec1, p_sec2) = if sec_swapped {
                            (&sec2, &sec1)
                        } else {
                            (&sec1, &sec2)
                        };
                        let (pb1, pb2) = if sec_swapped {
                            (&mut *p_block2, &mut *p_block1)
                        } else {
                            (&mut *p_block1, &mut *p_block2)
                        };
                        let (sec_off1, sec_end1, sec_off2, sec_end2) = if sec_swapped {
                            (word_off2, word_end2, word_off1, word_end1)
                        } else {
                            (word_off1, word_end1, word_off2, word_end2)
                        };

                        let mut match_len = 0;
                        let mut match_sections = 0;

                        for sd in &sec_segs {
                            if sd.kind == SegmentKind::Match {
                                match_len += sd.len;
                                match_sections += 1;
                            }
                        }

                        if match_sections > 0 {
                            trace!(match_sections, match_len, "char sections matched");

                            // Are the similarities a considerable portion of
                            // the replaced text?
                            if match_len * 100 / p_sec1.len() >= options.match_percent_threshold {
                                for sd in &sec_segs {
                                    if sd.kind == SegmentKind::In1 {
                                        let off = p_sec1[sd.off1].pos + sec_off1;
                                        let end = p_sec1[sd.off1 + sd.len - 1].pos + sec_off1 + 1;
                                        push_change(pb1, Section::new(off, end - off));
                                    } else if sd.kind == SegmentKind::In2 {
                                        let off = p_sec2[sd.off2].pos + sec_off2;
                                        let end = p_sec2[sd.off2 + sd.len - 1].pos + sec_off2 + 1;
                                        push_change(pb2, Section::new(off, end - off));
                                    }
                                }

                                total_match_len += match_len;

                                i += 2;
                                continue;
                            }

                            // Too little in common for full residuals: keep
                            // only the common head and tail out of the
                            // change ranges.
                            let min_len = p_sec1.len().min(p_sec2.len());

                            let mut start_match = 0;
                            while start_match < min_len && p_sec1[start_match] == p_sec2[start_match]
                            {
                                start_match += 1;
                            }

                            let mut end_match = 0;
                            while p_sec2.len() > start_match + end_match + 1
                                && end_match < p_sec1.len()
                                && p_sec1[p_sec1.len() - end_match - 1]
                                    == p_sec2[p_sec2.len() - end_match - 1]
                            {
                                end_match += 1;
                            }

                            if start_match > 0 || end_match > 0 {
                                // end_match < sec len on both sides: a run
                                // covering all of sec1 would be a full match
                                // and the threshold branch above takes it.
                                let mut off = sec_off1;
                                if start_match > 0 {
                                    off += p_sec1[start_match - 1].pos + 1;
                                }
                                let end = if end_match > 0 {
                                    p_sec1[p_sec1.len() - end_match - 1].pos + 1 + sec_off1
                                } else {
                                    sec_end1
                                };
                                if end > off {
                                    push_change(pb1, Section::new(off, end - off));
                                }

                                let mut off = sec_off2;
                                if start_match > 0 {
                                    off += p_sec2[start_match - 1].pos + 1;
                                }
                                let end = if end_match > 0 {
                                    p_sec2[p_sec2.len() - end_match - 1].pos + 1 + sec_off2
                                } else {
                                    sec_end2
                                };
                                if end > off {
                                    push_change(pb2, Section::new(off, end - off));
                                }

                                total_match_len += start_match + end_match;

                                i += 2;
                                continue;
                            }
                        }

                        // Nothing alike inside the substitution; when it was
                        // the whole line, give up on this pair.
                        if word_segs.len() == 2 {
                            break;
                        }
                    }

                    let first = p_words1[ld.off1];
                    let last = p_words1[ld.off1 + ld.len - 1];

                    let change = Section::new(first.pos, last.pos + last.len - first.pos);
                    push_change(p_block1, change);
                }
            }

            i += 1;
        }

        // Not enough of the lines matches after all: drop the pairing.
        if total_match_len * 100 / line_len1.max(line_len2) < options.match_percent_threshold {
            p_block1.info.changed_lines.pop();
            p_block2.info.changed_lines.pop();
        }
    }

    Ok(())
}

fn push_change(block: &mut BlockDiff, change: Section) {
    if let Some(changed) = block.info.changed_lines.last_mut() {
        changed.changes.push(change);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ViewId;
    use crate::diff::BlockInfo;
    use crate::memory::MemoryDocs;
    use crate::tokens::LineKey;
    use crate::hash::hash_bytes;

    fn doc_for(view: ViewId, lines: &[&str], off: usize) -> DocCmpInfo {
        let mut doc = DocCmpInfo::new(view);
        doc.lines = lines
            .iter()
            .enumerate()
            .map(|(i, text)| LineKey {
                line: off + i,
                hash: hash_bytes(text.as_bytes()),
            })
            .collect();
        doc
    }

    /// Wire an (In1, In2) pair covering whole single-block documents.
    fn realign(
        main: &[&str],
        sub: &[&str],
        options: &CompareOptions,
    ) -> (BlockDiff, BlockDiff) {
        let docs = MemoryDocs::from_lines(main, sub);
        let doc1 = doc_for(ViewId::Main, main, 0);
        let doc2 = doc_for(ViewId::Sub, sub, 0);

        let mut block1 = BlockDiff {
            kind: SegmentKind::In1,
            off1: 0,
            off2: 0,
            len: main.len(),
            info: BlockInfo::default(),
        };
        let mut block2 = BlockDiff {
            kind: SegmentKind::In2,
            off1: 0,
            off2: 0,
            len: sub.len(),
            info: BlockInfo::default(),
        };

        compare_blocks(&docs, &doc1, &doc2, &mut block1, &mut block2, options).unwrap();
        (block1, block2)
    }

    fn changes(block: &BlockDiff) -> Vec<(usize, Vec<(usize, usize)>)> {
        block
            .info
            .changed_lines
            .iter()
            .map(|cl| {
                (
                    cl.line,
                    cl.changes.iter().map(|s| (s.off, s.len)).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn word_insertion_marks_only_side_two() {
        let options = CompareOptions::default();
        let (block1, block2) = realign(&["hello world"], &["hello brave world"], &options);

        // Side 1 pairs the line but has no change interval.
        assert_eq!(changes(&block1), vec![(0, vec![])]);
        // "brave " inserted at byte 6.
        assert_eq!(changes(&block2), vec![(0, vec![(6, 6)])]);
    }

    #[test]
    fn substitution_with_common_affixes_marks_the_middle() {
        let options = CompareOptions::default();
        let (block1, block2) =
            realign(&["prefix_OLD_suffix"], &["prefix_NEW_suffix"], &options);

        assert_eq!(changes(&block1), vec![(0, vec![(7, 3)])]);
        assert_eq!(changes(&block2), vec![(0, vec![(7, 3)])]);
    }

    #[test]
    fn unrelated_lines_are_not_paired() {
        let options = CompareOptions::default();
        let (block1, block2) = realign(&["alpha beta gamma"], &["zzzzz qqqqq wwwww"], &options);

        assert!(block1.info.changed_lines.is_empty());
        assert!(block2.info.changed_lines.is_empty());
    }

    #[test]
    fn pairs_follow_convergence_not_position() {
        let options = CompareOptions::default();
        // Line 0 of side 1 matches line 1 of side 2 almost exactly.
        let (block1, block2) = realign(
            &["let counter = counter + 1;", "unrelated text here"],
            &["something else entirely!!", "let counter = counter + 2;"],
            &options,
        );

        assert_eq!(block1.info.changed_lines.len(), 1);
        assert_eq!(block1.info.changed_lines[0].line, 0);
        assert_eq!(block2.info.changed_lines.len(), 1);
        assert_eq!(block2.info.changed_lines[0].line, 1);
    }

    #[test]
    fn changed_line_lists_stay_paired() {
        let options = CompareOptions::default();
        let (block1, block2) = realign(
            &["fn alpha(a: u32) {", "fn beta(b: u32) {"],
            &["fn alpha(a: u64) {", "fn beta(b: u64) {"],
            &options,
        );

        assert_eq!(block1.info.changed_lines.len(), 2);
        assert_eq!(
            block1.info.changed_lines.len(),
            block2.info.changed_lines.len()
        );

        // In-block indices strictly increase.
        assert!(block1.info.changed_lines[0].line < block1.info.changed_lines[1].line);
        assert!(block2.info.changed_lines[0].line < block2.info.changed_lines[1].line);
    }

    #[test]
    fn moved_lines_are_not_candidates() {
        let options = CompareOptions::default();

        let main = &["moved line content", "stable line one"];
        let sub = &["stable line two", "moved line content"];

        let docs = MemoryDocs::from_lines(main, sub);
        let doc1 = doc_for(ViewId::Main, main, 0);
        let doc2 = doc_for(ViewId::Sub, sub, 0);

        let mut block1 = BlockDiff {
            kind: SegmentKind::In1,
            off1: 0,
            off2: 0,
            len: 2,
            info: BlockInfo::default(),
        };
        let mut block2 = BlockDiff {
            kind: SegmentKind::In2,
            off1: 0,
            off2: 0,
            len: 2,
            info: BlockInfo::default(),
        };

        // The identical lines were already promoted to MOVED.
        block1.info.add_move(Section::new(0, 1));
        block2.info.add_move(Section::new(1, 1));

        compare_blocks(&docs, &doc1, &doc2, &mut block1, &mut block2, &options).unwrap();

        // Only the "stable line ..." pair remains; the moved span stays out.
        assert_eq!(block1.info.changed_lines.len(), 1);
        assert_eq!(block1.info.changed_lines[0].line, 1);
        assert_eq!(block2.info.changed_lines[0].line, 0);
    }
}
