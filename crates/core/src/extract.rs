//! Line extraction
//!
//! Converts a document section into the normalized line-hash sequence the
//! rest of the pipeline operates on. This is the only stage that reads
//! whole documents, so it is also where cancellation is polled most often.

use std::collections::HashSet;

use crate::config::{CompareOptions, ViewId};
use crate::diff::Section;
use crate::error::HostError;
use crate::hash::{hash_byte, HASH_SEED};
use crate::host::{Progress, TextProvider};
use crate::tokens::LineKey;

/// Poll the progress object every this many lines.
const CANCEL_POLL_INTERVAL: usize = 500;

/// Per-document state of one compare run.
#[derive(Debug, Clone)]
pub struct DocCmpInfo {
    pub view: ViewId,
    /// Compared line range of the document, in original line indices.
    pub section: Section,
    /// Mask painted on plain added/removed lines of this side.
    pub block_diff_mask: u32,
    /// Normalized lines, strictly ordered by source line index.
    pub lines: Vec<LineKey>,
    /// Original indices of lines whose hash also occurs in the other
    /// document.
    pub non_unique_lines: HashSet<usize>,
}

impl DocCmpInfo {
    pub fn new(view: ViewId) -> Self {
        Self {
            view,
            section: Section::default(),
            block_diff_mask: 0,
            lines: Vec::new(),
            non_unique_lines: HashSet::new(),
        }
    }
}

impl Default for DocCmpInfo {
    fn default() -> Self {
        Self::new(ViewId::Main)
    }
}

/// Fill `doc.lines` from the host document, honoring the normalization
/// options. Returns `false` when the progress object requested
/// cancellation; `doc.lines` is left empty in that case.
pub fn get_lines(
    provider: &dyn TextProvider,
    progress: &mut dyn Progress,
    doc: &mut DocCmpInfo,
    options: &CompareOptions,
) -> Result<bool, HostError> {
    doc.lines.clear();

    let line_count = provider.line_count(doc.view)?;

    if line_count == 0 || doc.section.off >= line_count {
        return Ok(true);
    }

    if doc.section.len == 0 || doc.section.end() > line_count {
        doc.section.len = line_count - doc.section.off;
    }

    progress.set_max_count(doc.section.len / CANCEL_POLL_INTERVAL + 1);

    doc.lines.reserve(doc.section.len);

    for line_num in 0..doc.section.len {
        if line_num % CANCEL_POLL_INTERVAL == 0 && !progress.advance() {
            doc.lines.clear();
            return Ok(false);
        }

        let doc_line = doc.section.off + line_num;
        let start = provider.line_start(doc.view, doc_line)?;
        let end = provider.line_end(doc.view, doc_line)?;

        let mut hash = HASH_SEED;

        if end > start {
            let mut bytes = provider.text(doc.view, start, end)?;

            if options.ignore_case {
                bytes.make_ascii_lowercase();
            }

            for &byte in &bytes {
                if options.ignore_spaces && (byte == b' ' || byte == b'\t') {
                    continue;
                }

                hash = hash_byte(hash, byte);
            }
        }

        if !options.ignore_empty_lines || hash != HASH_SEED {
            doc.lines.push(LineKey {
                line: doc_line,
                hash,
            });
        }
    }

    Ok(true)
}
