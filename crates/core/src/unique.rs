//! Non-unique line index and the find-unique mode
//!
//! Both features reduce a document to its multiset of line hashes. The
//! index feeds marker coloration in the full pipeline (lines whose content
//! also appears in the other document get the dimmed `_LOCAL` variants);
//! find-unique is the standalone short-circuit mode that marks every line
//! without a counterpart and skips the rest of the pipeline.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::config::CompareOptions;
use crate::diff::CompareInfo;
use crate::engine::{setup_docs, CompareReport};
use crate::error::EngineError;
use crate::extract::get_lines;
use crate::host::{MarkerSink, Progress, TextProvider};

/// Record, in each document, the original indices of lines whose hash also
/// occurs in the other document.
pub fn find_unique_lines(cmp: &mut CompareInfo) {
    let mut doc1_lines: HashMap<u64, Vec<usize>> = HashMap::new();

    for line in &cmp.doc1.lines {
        doc1_lines.entry(line.hash).or_default().push(line.line);
    }

    for line in &cmp.doc2.lines {
        if let Some(doc1_hits) = doc1_lines.get(&line.hash) {
            cmp.doc2.non_unique_lines.insert(line.line);

            if cmp.doc1.non_unique_lines.insert(doc1_hits[0]) {
                for &hit in &doc1_hits[1..] {
                    cmp.doc1.non_unique_lines.insert(hit);
                }
            }
        }
    }
}

/// The find-unique mode: mark every line that has no hash counterpart in
/// the opposite document, on both sides, and emit a single alignment pair
/// anchoring the two section starts.
pub fn run_find_unique(
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

    let doc1_hashes: HashSet<u64> = doc1.lines.iter().map(|l| l.hash).collect();

    if !progress.next_phase() {
        return Ok(CompareReport::cancelled());
    }

    let doc2_hashes: HashSet<u64> = doc2.lines.iter().map(|l| l.hash).collect();

    if !progress.next_phase() {
        return Ok(CompareReport::cancelled());
    }

    let unique1: Vec<usize> = doc1
        .lines
        .iter()
        .filter(|l| !doc2_hashes.contains(&l.hash))
        .map(|l| l.line)
        .collect();

    let unique2: Vec<usize> = doc2
        .lines
        .iter()
        .filter(|l| !doc1_hashes.contains(&l.hash))
        .map(|l| l.line)
        .collect();

    debug!(
        unique_main = unique1.len(),
        unique_sub = unique2.len(),
        "find-unique scan done"
    );

    if unique1.is_empty() && unique2.is_empty() {
        return Ok(CompareReport::matched());
    }

    for line in unique1 {
        sink.add_line_marker(doc1.view, line, doc1.block_diff_mask)?;
    }

    for line in unique2 {
        sink.add_line_marker(doc2.view, line, doc2.block_diff_mask)?;
    }

    Ok(CompareReport::mismatch_at(
        doc1.section.off,
        doc2.section.off,
    ))
}
