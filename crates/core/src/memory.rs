//! In-memory host implementations
//!
//! [`MemoryDocs`] and [`RecordingSink`] let the engine run without an
//! editor attached: build the two documents from string slices, compare,
//! then inspect the recorded markers and change ranges. [`compare_strings`]
//! in the crate root wires them together.
//!
//! [`compare_strings`]: crate::compare_strings

use crate::config::ViewId;
use crate::error::HostError;
use crate::host::{MarkerSink, Progress, TextProvider};

#[derive(Debug, Clone, Default)]
struct DocBuf {
    bytes: Vec<u8>,
    /// Byte span of each line, terminator excluded.
    lines: Vec<(usize, usize)>,
}

impl DocBuf {
    fn from_lines(lines: &[&str]) -> Self {
        let mut bytes = Vec::new();
        let mut spans = Vec::with_capacity(lines.len());

        for (i, line) in lines.iter().enumerate() {
            let start = bytes.len();
            bytes.extend_from_slice(line.as_bytes());
            spans.push((start, bytes.len()));

            if i + 1 < lines.len() {
                bytes.push(b'\n');
            }
        }

        Self {
            bytes,
            lines: spans,
        }
    }
}

/// Two documents held in memory, one per [`ViewId`].
#[derive(Debug, Clone, Default)]
pub struct MemoryDocs {
    docs: [DocBuf; 2],
}

impl MemoryDocs {
    /// Build the pair from per-view line slices (no trailing terminator on
    /// the last line). An empty slice is a zero-length document.
    pub fn from_lines(main: &[&str], sub: &[&str]) -> Self {
        Self {
            docs: [DocBuf::from_lines(main), DocBuf::from_lines(sub)],
        }
    }

    /// Build the pair from whole document texts split on `'\n'`.
    pub fn from_texts(main: &str, sub: &str) -> Self {
        let main: Vec<&str> = main.split('\n').collect();
        let sub: Vec<&str> = sub.split('\n').collect();
        Self::from_lines(&main, &sub)
    }

    fn doc(&self, view: ViewId) -> &DocBuf {
        &self.docs[view.index()]
    }

    fn line_span(&self, view: ViewId, line: usize) -> Result<(usize, usize), HostError> {
        self.doc(view)
            .lines
            .get(line)
            .copied()
            .ok_or(HostError::LineOutOfRange { view, line })
    }
}

impl TextProvider for MemoryDocs {
    fn line_count(&self, view: ViewId) -> Result<usize, HostError> {
        Ok(self.doc(view).lines.len())
    }

    fn line_start(&self, view: ViewId, line: usize) -> Result<usize, HostError> {
        Ok(self.line_span(view, line)?.0)
    }

    fn line_end(&self, view: ViewId, line: usize) -> Result<usize, HostError> {
        Ok(self.line_span(view, line)?.1)
    }

    fn text(&self, view: ViewId, start: usize, end: usize) -> Result<Vec<u8>, HostError> {
        let doc = self.doc(view);

        if start > end || end > doc.bytes.len() {
            return Err(HostError::ByteRangeOutOfRange { view, start, end });
        }

        Ok(doc.bytes[start..end].to_vec())
    }
}

/// A [`MarkerSink`] that records every emission for later inspection.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    /// `(view, line, mask)` in emission order.
    pub line_markers: Vec<(ViewId, usize, u32)>,
    /// `(view, byte_offset, byte_len)` in emission order.
    pub changed_ranges: Vec<(ViewId, usize, usize)>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Combined marker mask on one line, 0 when unmarked.
    pub fn mask_at(&self, view: ViewId, line: usize) -> u32 {
        self.line_markers
            .iter()
            .filter(|(v, l, _)| *v == view && *l == line)
            .fold(0, |acc, (_, _, mask)| acc | mask)
    }

    /// `(line, mask)` pairs for one view, in emission order.
    pub fn markers_for(&self, view: ViewId) -> Vec<(usize, u32)> {
        self.line_markers
            .iter()
            .filter(|(v, _, _)| *v == view)
            .map(|(_, line, mask)| (*line, *mask))
            .collect()
    }

    /// `(offset, len)` change ranges for one view, in emission order.
    pub fn changes_for(&self, view: ViewId) -> Vec<(usize, usize)> {
        self.changed_ranges
            .iter()
            .filter(|(v, _, _)| *v == view)
            .map(|(_, off, len)| (*off, *len))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.line_markers.is_empty() && self.changed_ranges.is_empty()
    }
}

impl MarkerSink for RecordingSink {
    fn add_line_marker(&mut self, view: ViewId, line: usize, mask: u32) -> Result<(), HostError> {
        self.line_markers.push((view, line, mask));
        Ok(())
    }

    fn mark_text_changed(
        &mut self,
        view: ViewId,
        offset: usize,
        len: usize,
    ) -> Result<(), HostError> {
        self.changed_ranges.push((view, offset, len));
        Ok(())
    }
}

/// A [`Progress`] that cancels after a fixed number of polls. Used to
/// exercise the cooperative cancellation paths.
#[derive(Debug, Clone, Default)]
pub struct CancellingProgress {
    /// Cancel on the nth `advance` call (0-based), if set.
    pub cancel_on_advance: Option<usize>,
    /// Cancel on the nth `next_phase` call (0-based), if set.
    pub cancel_on_phase: Option<usize>,
    advances: usize,
    phases: usize,
}

impl CancellingProgress {
    pub fn cancel_at_advance(n: usize) -> Self {
        Self {
            cancel_on_advance: Some(n),
            ..Self::default()
        }
    }

    pub fn cancel_at_phase(n: usize) -> Self {
        Self {
            cancel_on_phase: Some(n),
            ..Self::default()
        }
    }
}

impl Progress for CancellingProgress {
    fn set_max_count(&mut self, _max: usize) {}

    fn advance(&mut self) -> bool {
        let cancel = self.cancel_on_advance == Some(self.advances);
        self.advances += 1;
        !cancel
    }

    fn next_phase(&mut self) -> bool {
        let cancel = self.cancel_on_phase == Some(self.phases);
        self.phases += 1;
        !cancel
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_spans_exclude_terminators() {
        let docs = MemoryDocs::from_lines(&["ab", "", "cde"], &[]);

        assert_eq!(docs.line_count(ViewId::Main).unwrap(), 3);
        assert_eq!(docs.line_start(ViewId::Main, 0).unwrap(), 0);
        assert_eq!(docs.line_end(ViewId::Main, 0).unwrap(), 2);
        assert_eq!(docs.line_start(ViewId::Main, 1).unwrap(), 3);
        assert_eq!(docs.line_end(ViewId::Main, 1).unwrap(), 3);
        assert_eq!(docs.line_start(ViewId::Main, 2).unwrap(), 4);
        assert_eq!(docs.line_end(ViewId::Main, 2).unwrap(), 7);

        assert_eq!(docs.text(ViewId::Main, 4, 7).unwrap(), b"cde");
        assert_eq!(docs.line_count(ViewId::Sub).unwrap(), 0);
    }

    #[test]
    fn from_texts_splits_on_newline() {
        let docs = MemoryDocs::from_texts("a\nb", "x");
        assert_eq!(docs.line_count(ViewId::Main).unwrap(), 2);
        assert_eq!(docs.line_count(ViewId::Sub).unwrap(), 1);
    }

    #[test]
    fn out_of_range_reports_host_error() {
        let docs = MemoryDocs::from_lines(&["a"], &["b"]);

        assert!(matches!(
            docs.line_start(ViewId::Main, 5),
            Err(HostError::LineOutOfRange { line: 5, .. })
        ));
        assert!(matches!(
            docs.text(ViewId::Sub, 0, 99),
            Err(HostError::ByteRangeOutOfRange { .. })
        ));
    }

    #[test]
    fn recording_sink_accumulates_masks() {
        let mut sink = RecordingSink::new();
        sink.add_line_marker(ViewId::Main, 3, 0b01).unwrap();
        sink.add_line_marker(ViewId::Main, 3, 0b10).unwrap();
        sink.mark_text_changed(ViewId::Sub, 7, 4).unwrap();

        assert_eq!(sink.mask_at(ViewId::Main, 3), 0b11);
        assert_eq!(sink.mask_at(ViewId::Sub, 3), 0);
        assert_eq!(sink.changes_for(ViewId::Sub), vec![(7, 4)]);
    }

    #[test]
    fn cancelling_progress_counts_polls() {
        let mut progress = CancellingProgress::cancel_at_advance(2);
        assert!(progress.advance());
        assert!(progress.advance());
        assert!(!progress.advance());
        assert!(progress.next_phase());
    }
}
