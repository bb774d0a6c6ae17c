//! Result and error types

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ViewId;

/// Outcome of a completed (or cancelled) compare run.
///
/// Cancellation is cooperative and is not an error: the engine unwinds and
/// reports it here. Failures (host I/O, broken invariants) are `Err` on the
/// calling function instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareStatus {
    /// The documents are identical under the configured normalization.
    Match,
    /// Differences were found and emitted to the marker sink.
    Mismatch,
    /// The progress object requested cancellation mid-run.
    Cancelled,
}

/// Failure reported by a host capability ([`crate::TextProvider`] or
/// [`crate::MarkerSink`]).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HostError {
    #[error("line {line} out of range for {view:?}")]
    LineOutOfRange { view: ViewId, line: usize },

    #[error("byte range {start}..{end} out of range for {view:?}")]
    ByteRangeOutOfRange {
        view: ViewId,
        start: usize,
        end: usize,
    },

    #[error("host I/O failure: {0}")]
    Io(String),
}

/// Errors surfaced by the compare engine.
///
/// Markers already written before the failure are not rolled back; the
/// caller is expected to clear them.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Host(#[from] HostError),

    #[error("internal invariant violated: {0}")]
    Internal(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_error_display() {
        let err = HostError::LineOutOfRange {
            view: ViewId::Sub,
            line: 12,
        };
        assert_eq!(err.to_string(), "line 12 out of range for Sub");
    }

    #[test]
    fn engine_error_wraps_host_error() {
        let err = EngineError::from(HostError::Io("mapping lost".into()));
        assert!(matches!(err, EngineError::Host(_)));
    }
}
