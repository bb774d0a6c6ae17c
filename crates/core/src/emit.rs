//! Marker and alignment emission
//!
//! Walks the final block list, paints per-line markers on the host and
//! builds the alignment map that lets the two panes scroll side by side.
//! Emissions happen in ascending original-line order on each side.

use serde::{Deserialize, Serialize};

use crate::algorithm::SegmentKind;
use crate::config::{CompareOptions, ViewId};
use crate::diff::{BlockDiff, CompareInfo};
use crate::error::HostError;
use crate::extract::DocCmpInfo;
use crate::host::{markers, MarkerSink, Progress, TextProvider};

/// One side of an alignment entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignmentSide {
    /// Original line index the entry anchors to.
    pub line: usize,
    /// Block mask of the region starting here; 0 for matched regions.
    pub diff_mask: u32,
}

/// A cross-document line correspondence. `main` always refers to the
/// [`ViewId::Main`] document, whatever swaps the engine performed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignmentPair {
    pub main: AlignmentSide,
    pub sub: AlignmentSide,
}

/// Original line a block-list position counter corresponds to. A counter
/// past the normalized array anchors just after the last line; an empty
/// array anchors at the compared section start.
fn to_alignment_line(doc: &DocCmpInfo, bd_line: usize) -> usize {
    match doc.lines.last() {
        None => doc.section.off,
        Some(last) if bd_line >= doc.lines.len() => last.line + 1,
        _ => doc.lines[bd_line].line,
    }
}

/// Paint markers for the sub-section `[sub_off, sub_off + sub_len)` of a
/// block, block-relative. Unmoved runs get the side's add/remove mask
/// (dimmed to `_LOCAL` for non-unique lines); moved spans get the
/// MOVED_LINE or MOVED_BEGIN/MID/END shapes.
///
/// Markers cover *original* lines: source lines dropped by normalization
/// that sit inside a painted range are painted with it.
fn mark_section(
    sink: &mut dyn MarkerSink,
    doc: &DocCmpInfo,
    bd: &BlockDiff,
    sub_off: usize,
    sub_len: usize,
) -> Result<(), HostError> {
    let base = bd.own_off();
    let end_off = sub_off + sub_len;

    let mut i = sub_off;
    while i < end_off {
        let doc_line = doc.lines[base + i].line;
        let mut moved_len = bd.info.moved_section(i);

        if moved_len > sub_len {
            moved_len = sub_len;
        }

        if moved_len == 0 {
            let mut j = i + 1;
            while j < end_off && bd.info.moved_section(j) == 0 {
                j += 1;
            }

            let end_doc_line = doc.lines[base + j - 1].line + 1;

            for line in doc_line..end_doc_line {
                let mark = if !doc.non_unique_lines.contains(&line) {
                    doc.block_diff_mask
                } else if doc.block_diff_mask == markers::ADDED {
                    markers::ADDED_LOCAL
                } else {
                    markers::REMOVED_LOCAL
                };

                sink.add_line_marker(doc.view, line, mark)?;
            }

            i = j;
        } else if moved_len == 1 {
            sink.add_line_marker(doc.view, doc_line, markers::MOVED_LINE)?;
            i += 1;
        } else {
            let end_doc_line = doc.lines[base + i + moved_len - 1].line;

            sink.add_line_marker(doc.view, doc_line, markers::MOVED_BEGIN)?;

            for line in doc_line + 1..end_doc_line {
                sink.add_line_marker(doc.view, line, markers::MOVED_MID)?;
            }

            sink.add_line_marker(doc.view, end_doc_line, markers::MOVED_END)?;

            i += moved_len;
        }
    }

    Ok(())
}

/// Emit the CHANGED line markers and intra-line change highlights for the
/// `idx`-th paired line of a linked (In1, In2) block pair.
fn mark_line_diffs(
    provider: &dyn TextProvider,
    sink: &mut dyn MarkerSink,
    doc1: &DocCmpInfo,
    doc2: &DocCmpInfo,
    bd: &BlockDiff,
    mb: &BlockDiff,
    idx: usize,
) -> Result<(), HostError> {
    for (doc, block) in [(doc1, bd), (doc2, mb)] {
        let changed = &block.info.changed_lines[idx];
        let line = doc.lines[block.own_off() + changed.line].line;
        let line_pos = provider.line_start(doc.view, line)?;

        for change in &changed.changes {
            sink.mark_text_changed(doc.view, line_pos + change.off, change.len)?;
        }

        let mark = if !doc.non_unique_lines.contains(&line) {
            markers::CHANGED
        } else {
            markers::CHANGED_LOCAL
        };

        sink.add_line_marker(doc.view, line, mark)?;
    }

    Ok(())
}

/// Walk the final block list, mark every difference and build the
/// alignment map. Returns `None` on cancellation.
pub fn mark_all_diffs(
    provider: &dyn TextProvider,
    sink: &mut dyn MarkerSink,
    progress: &mut dyn Progress,
    cmp: &CompareInfo,
    options: &CompareOptions,
) -> Result<Option<Vec<AlignmentPair>>, HostError> {
    let mut alignment: Vec<AlignmentPair> = Vec::new();

    progress.set_max_count(cmp.block_diffs.len());

    let main_is_doc1 = cmp.doc1.view == ViewId::Main;
    let push_pair =
        |alignment: &mut Vec<AlignmentPair>, d1: AlignmentSide, d2: AlignmentSide| {
            alignment.push(if main_is_doc1 {
                AlignmentPair { main: d1, sub: d2 }
            } else {
                AlignmentPair { main: d2, sub: d1 }
            });
        };

    let mut align1 = 0;
    let mut align2 = 0;

    let mut i = 0;
    while i < cmp.block_diffs.len() {
        let bd = &cmp.block_diffs[i];

        match bd.kind {
            SegmentKind::Match => {
                push_pair(
                    &mut alignment,
                    AlignmentSide {
                        line: to_alignment_line(&cmp.doc1, align1),
                        diff_mask: 0,
                    },
                    AlignmentSide {
                        line: to_alignment_line(&cmp.doc2, align2),
                        diff_mask: 0,
                    },
                );

                align1 += bd.len;
                align2 += bd.len;
            }
            SegmentKind::In2 => {
                mark_section(sink, &cmp.doc2, bd, 0, bd.len)?;

                push_pair(
                    &mut alignment,
                    AlignmentSide {
                        line: to_alignment_line(&cmp.doc1, align1),
                        diff_mask: 0,
                    },
                    AlignmentSide {
                        line: to_alignment_line(&cmp.doc2, align2),
                        diff_mask: cmp.doc2.block_diff_mask,
                    },
                );

                align2 += bd.len;
            }
            SegmentKind::In1 => {
                if let Some(mb_idx) = bd.info.match_block {
                    let mb = &cmp.block_diffs[mb_idx];

                    let mut off1 = 0;
                    let mut off2 = 0;

                    for idx in 0..bd.info.changed_lines.len() {
                        let len1 = bd.info.changed_lines[idx].line - off1;
                        let len2 = mb.info.changed_lines[idx].line - off2;

                        // Residual add/remove region before the changed pair.
                        if len1 > 0 || len2 > 0 {
                            push_pair(
                                &mut alignment,
                                AlignmentSide {
                                    line: to_alignment_line(&cmp.doc1, align1),
                                    diff_mask: if len1 > 0 { cmp.doc1.block_diff_mask } else { 0 },
                                },
                                AlignmentSide {
                                    line: to_alignment_line(&cmp.doc2, align2),
                                    diff_mask: if len2 > 0 { cmp.doc2.block_diff_mask } else { 0 },
                                },
                            );

                            if len1 > 0 {
                                mark_section(sink, &cmp.doc1, bd, off1, len1)?;
                                align1 += len1;
                            }

                            if len2 > 0 {
                                mark_section(sink, &cmp.doc2, mb, off2, len2)?;
                                align2 += len2;
                            }
                        }

                        push_pair(
                            &mut alignment,
                            AlignmentSide {
                                line: to_alignment_line(&cmp.doc1, align1),
                                diff_mask: markers::CHANGED,
                            },
                            AlignmentSide {
                                line: to_alignment_line(&cmp.doc2, align2),
                                diff_mask: markers::CHANGED,
                            },
                        );

                        mark_line_diffs(provider, sink, &cmp.doc1, &cmp.doc2, bd, mb, idx)?;

                        off1 = bd.info.changed_lines[idx].line + 1;
                        off2 = mb.info.changed_lines[idx].line + 1;

                        align1 += 1;
                        align2 += 1;
                    }

                    // Trailing residual after the last changed pair.
                    let len1 = bd.len - off1;
                    let len2 = mb.len - off2;

                    if len1 > 0 || len2 > 0 {
                        push_pair(
                            &mut alignment,
                            AlignmentSide {
                                line: to_alignment_line(&cmp.doc1, align1),
                                diff_mask: if len1 > 0 { cmp.doc1.block_diff_mask } else { 0 },
                            },
                            AlignmentSide {
                                line: to_alignment_line(&cmp.doc2, align2),
                                diff_mask: if len2 > 0 { cmp.doc2.block_diff_mask } else { 0 },
                            },
                        );

                        if len1 > 0 {
                            mark_section(sink, &cmp.doc1, bd, off1, len1)?;
                            align1 += len1;
                        }

                        if len2 > 0 {
                            mark_section(sink, &cmp.doc2, mb, off2, len2)?;
                            align2 += len2;
                        }
                    }

                    // The paired In2 block was consumed with this one.
                    i += 1;
                } else {
                    mark_section(sink, &cmp.doc1, bd, 0, bd.len)?;

                    push_pair(
                        &mut alignment,
                        AlignmentSide {
                            line: to_alignment_line(&cmp.doc1, align1),
                            diff_mask: cmp.doc1.block_diff_mask,
                        },
                        AlignmentSide {
                            line: to_alignment_line(&cmp.doc2, align2),
                            diff_mask: 0,
                        },
                    );

                    align1 += bd.len;
                }
            }
        }

        if !progress.advance() {
            return Ok(None);
        }

        i += 1;
    }

    if options.selection_compare {
        push_pair(
            &mut alignment,
            AlignmentSide {
                line: to_alignment_line(&cmp.doc1, align1),
                diff_mask: 0,
            },
            AlignmentSide {
                line: to_alignment_line(&cmp.doc2, align2),
                diff_mask: 0,
            },
        );

        push_pair(
            &mut alignment,
            AlignmentSide {
                line: options.selection(cmp.doc1.view).last,
                diff_mask: 0,
            },
            AlignmentSide {
                line: options.selection(cmp.doc2.view).last,
                diff_mask: 0,
            },
        );
    }

    if !progress.next_phase() {
        return Ok(None);
    }

    Ok(Some(alignment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::{BlockInfo, Section};
    use crate::hash::hash_bytes;
    use crate::host::SilentProgress;
    use crate::memory::{MemoryDocs, RecordingSink};
    use crate::tokens::LineKey;

    fn doc_for(view: ViewId, lines: &[&str], mask: u32) -> DocCmpInfo {
        let mut doc = DocCmpInfo::new(view);
        doc.block_diff_mask = mask;
        doc.lines = lines
            .iter()
            .enumerate()
            .map(|(i, text)| LineKey {
                line: i,
                hash: hash_bytes(text.as_bytes()),
            })
            .collect();
        doc
    }

    fn block(kind: SegmentKind, off1: usize, off2: usize, len: usize) -> BlockDiff {
        BlockDiff {
            kind,
            off1,
            off2,
            len,
            info: BlockInfo::default(),
        }
    }

    #[test]
    fn alignment_line_anchors() {
        let doc = doc_for(ViewId::Main, &["a", "b"], 0);

        assert_eq!(to_alignment_line(&doc, 0), 0);
        assert_eq!(to_alignment_line(&doc, 1), 1);
        assert_eq!(to_alignment_line(&doc, 2), 2);
        assert_eq!(to_alignment_line(&doc, 9), 2);

        let mut empty = DocCmpInfo::new(ViewId::Main);
        empty.section = Section::new(7, 0);
        assert_eq!(to_alignment_line(&empty, 0), 7);
    }

    #[test]
    fn unmoved_section_gets_block_mask() {
        let doc = doc_for(ViewId::Sub, &["x", "y"], markers::ADDED);
        let bd = block(SegmentKind::In2, 0, 0, 2);

        let mut sink = RecordingSink::new();
        mark_section(&mut sink, &doc, &bd, 0, 2).unwrap();

        assert_eq!(
            sink.markers_for(ViewId::Sub),
            vec![(0, markers::ADDED), (1, markers::ADDED)]
        );
    }

    #[test]
    fn non_unique_lines_get_local_mask() {
        let mut doc = doc_for(ViewId::Main, &["x", "y"], markers::REMOVED);
        doc.non_unique_lines.insert(1);
        let bd = block(SegmentKind::In1, 0, 0, 2);

        let mut sink = RecordingSink::new();
        mark_section(&mut sink, &doc, &bd, 0, 2).unwrap();

        assert_eq!(
            sink.markers_for(ViewId::Main),
            vec![(0, markers::REMOVED), (1, markers::REMOVED_LOCAL)]
        );
    }

    #[test]
    fn moved_span_shapes() {
        let doc = doc_for(ViewId::Main, &["a", "b", "c", "d"], markers::REMOVED);

        let mut bd = block(SegmentKind::In1, 0, 0, 4);
        bd.info.add_move(Section::new(0, 1));
        bd.info.add_move(Section::new(1, 3));

        let mut sink = RecordingSink::new();
        mark_section(&mut sink, &doc, &bd, 0, 4).unwrap();

        assert_eq!(
            sink.markers_for(ViewId::Main),
            vec![
                (0, markers::MOVED_LINE),
                (1, markers::MOVED_BEGIN),
                (2, markers::MOVED_MID),
                (3, markers::MOVED_END),
            ]
        );
    }

    #[test]
    fn moved_span_paints_skipped_original_lines() {
        // Normalized lines 0 and 3: lines 1-2 were dropped (e.g. blank) but
        // sit inside the painted range.
        let mut doc = DocCmpInfo::new(ViewId::Main);
        doc.block_diff_mask = markers::REMOVED;
        doc.lines = vec![
            LineKey { line: 0, hash: 1 },
            LineKey { line: 3, hash: 2 },
        ];

        let mut bd = block(SegmentKind::In1, 0, 0, 2);
        bd.info.add_move(Section::new(0, 2));

        let mut sink = RecordingSink::new();
        mark_section(&mut sink, &doc, &bd, 0, 2).unwrap();

        assert_eq!(
            sink.markers_for(ViewId::Main),
            vec![
                (0, markers::MOVED_BEGIN),
                (1, markers::MOVED_MID),
                (2, markers::MOVED_MID),
                (3, markers::MOVED_END),
            ]
        );
    }

    #[test]
    fn plain_append_alignment() {
        let cmp = CompareInfo {
            doc1: doc_for(ViewId::Main, &["a", "b"], markers::REMOVED),
            doc2: doc_for(ViewId::Sub, &["a", "b", "c"], markers::ADDED),
            block_diffs: vec![
                block(SegmentKind::Match, 0, 0, 2),
                block(SegmentKind::In2, 2, 2, 1),
            ],
        };

        let docs = MemoryDocs::from_lines(&["a", "b"], &["a", "b", "c"]);
        let mut sink = RecordingSink::new();

        let alignment = mark_all_diffs(
            &docs,
            &mut sink,
            &mut SilentProgress,
            &cmp,
            &CompareOptions::default(),
        )
        .unwrap()
        .expect("not cancelled");

        assert_eq!(alignment.len(), 2);

        assert_eq!(alignment[0].main.line, 0);
        assert_eq!(alignment[0].sub.line, 0);
        assert_eq!(alignment[0].main.diff_mask, 0);

        assert_eq!(alignment[1].main.line, 2);
        assert_eq!(alignment[1].sub.line, 2);
        assert_eq!(alignment[1].sub.diff_mask, markers::ADDED);

        assert_eq!(sink.markers_for(ViewId::Sub), vec![(2, markers::ADDED)]);
        assert!(sink.markers_for(ViewId::Main).is_empty());
    }

    #[test]
    fn swapped_docs_still_report_main_first() {
        // Engine-level swap: doc1 holds the Sub view.
        let cmp = CompareInfo {
            doc1: doc_for(ViewId::Sub, &["a", "x"], markers::ADDED),
            doc2: doc_for(ViewId::Main, &["a"], markers::REMOVED),
            block_diffs: vec![
                block(SegmentKind::Match, 0, 0, 1),
                block(SegmentKind::In1, 1, 1, 1),
            ],
        };

        let docs = MemoryDocs::from_lines(&["a"], &["a", "x"]);
        let mut sink = RecordingSink::new();

        let alignment = mark_all_diffs(
            &docs,
            &mut sink,
            &mut SilentProgress,
            &cmp,
            &CompareOptions::default(),
        )
        .unwrap()
        .expect("not cancelled");

        // The In1 block belongs to doc1 == Sub view; its mask lands on the
        // pair's `sub` side.
        assert_eq!(alignment[1].sub.diff_mask, markers::ADDED);
        assert_eq!(alignment[1].main.diff_mask, 0);
        assert_eq!(sink.markers_for(ViewId::Sub), vec![(1, markers::ADDED)]);
    }

    #[test]
    fn cancellation_mid_walk_returns_none() {
        let cmp = CompareInfo {
            doc1: doc_for(ViewId::Main, &["a"], markers::REMOVED),
            doc2: doc_for(ViewId::Sub, &["b"], markers::ADDED),
            block_diffs: vec![
                block(SegmentKind::In1, 0, 0, 1),
                block(SegmentKind::In2, 1, 0, 1),
            ],
        };

        let docs = MemoryDocs::from_lines(&["a"], &["b"]);
        let mut sink = RecordingSink::new();
        let mut progress = crate::memory::CancellingProgress::cancel_at_advance(0);

        let result = mark_all_diffs(
            &docs,
            &mut sink,
            &mut progress,
            &cmp,
            &CompareOptions::default(),
        )
        .unwrap();

        assert!(result.is_none());
    }
}
