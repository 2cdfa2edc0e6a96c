//! Capabilities the surrounding application supplies to the pipeline.
//!
//! The core depends only on these traits, so tests substitute in-memory doubles.

use std::borrow::Cow;
use std::path::PathBuf;

use catlint_types::{AnalyzerSettings, DocumentId};

use crate::types::RangeDiagnostic;

/// Read access to the host's open documents.
pub trait DocumentAccess {
    /// File-system path passed to the analyzer.
    fn path(&self, document: &DocumentId) -> Option<PathBuf>;

    /// Full current text, piped to the analyzer's stdin.
    fn text(&self, document: &DocumentId) -> Option<String>;

    /// Current text of one line (0-indexed, without terminator).
    ///
    /// Returns `None` when the line does not exist.
    fn line_text(&self, document: &DocumentId, index: usize) -> Option<Cow<'_, str>>;
}

/// The host's diagnostic display.
///
/// Only [`DiagnosticPublisher`](crate::DiagnosticPublisher) calls this.
pub trait DiagnosticsDisplay {
    /// Replace everything shown for `document`.
    fn set(&mut self, document: &DocumentId, diagnostics: &[RangeDiagnostic]);

    /// Remove everything shown for `document`.
    fn clear(&mut self, document: &DocumentId);
}

/// Per-workspace analyzer configuration.
pub trait ConfigSource {
    /// Analyzer to run for `document`, or `None` when analysis is not configured.
    ///
    /// Looked up on every analysis, so configuration edits apply to the next run.
    fn analyzer_for(&self, document: &DocumentId) -> Option<AnalyzerSettings>;
}

impl ConfigSource for Option<AnalyzerSettings> {
    fn analyzer_for(&self, _document: &DocumentId) -> Option<AnalyzerSettings> {
        self.clone()
    }
}
