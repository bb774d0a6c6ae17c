//! # splitdiff-core
//!
//! A side-by-side compare engine for two in-memory documents. The pipeline
//! computes a line-level longest-common-subsequence decomposition, filters
//! non-unique lines, detects moved blocks by iterative cross-referencing,
//! re-aligns lines inside replaced blocks by character convergence, and
//! emits per-line markers plus an alignment map for vertically aligned
//! rendering.
//!
//! ## Core concepts
//!
//! - **Host capabilities**: text access, marker output and cancellation are
//!   traits ([`TextProvider`], [`MarkerSink`], [`Progress`]) so the engine
//!   runs against any editor — or against the bundled in-memory host.
//! - **Three granularities**: one generic LCS engine serves lines, words
//!   and characters.
//! - **Markers + alignment**: results are deposited as marker masks and
//!   [`AlignmentPair`] entries, not as patch text.
//!
//! ## Example
//!
//! ```rust
//! use splitdiff_core::{compare_strings, CompareOptions, CompareStatus};
//!
//! let options = CompareOptions::default();
//! let (report, markers) =
//!     compare_strings("alpha\nbravo", "alpha\ncharlie", &options).unwrap();
//!
//! assert_eq!(report.status, CompareStatus::Mismatch);
//! assert!(!markers.is_empty());
//! ```

pub mod algorithm;
pub mod config;
pub mod diff;
pub mod emit;
pub mod engine;
pub mod error;
pub mod extract;
pub mod hash;
pub mod host;
pub mod memory;
pub mod moves;
pub mod realign;
pub mod tokens;
pub mod unique;

// Re-export main types
pub use config::{CompareOptions, LineRange, ViewId};
pub use emit::{AlignmentPair, AlignmentSide};
pub use engine::{CompareEngine, CompareReport};
pub use error::{CompareStatus, EngineError, HostError};
pub use host::{markers, MarkerSink, Progress, SilentProgress, TextProvider};
pub use memory::{MemoryDocs, RecordingSink};

/// Run one compare against a host.
///
/// Dispatches to the full pipeline or to find-unique mode according to the
/// options. Markers land in `sink`; the report carries the status and the
/// alignment map.
pub fn compare_views(
    provider: &dyn TextProvider,
    sink: &mut dyn MarkerSink,
    progress: &mut dyn Progress,
    options: &CompareOptions,
) -> Result<CompareReport, EngineError> {
    CompareEngine::new(options.clone()).compare(provider, sink, progress)
}

/// Compare two documents given as plain text (lines split on `'\n'`),
/// without an editor attached. Returns the report and the recorded marker
/// output.
pub fn compare_strings(
    main: &str,
    sub: &str,
    options: &CompareOptions,
) -> Result<(CompareReport, RecordingSink), EngineError> {
    let docs = MemoryDocs::from_texts(main, sub);
    let mut sink = RecordingSink::new();
    let mut progress = SilentProgress;

    let report = compare_views(&docs, &mut sink, &mut progress, options)?;
    Ok((report, sink))
}
