//! Public types consumed by hosts.
//!
//! Hosts feed [`DocumentChange`]s into the manager, receive [`LintUpdate`]s
//! back, and read [`DiagnosticsSnapshot`]s for status display.

use std::path::Path;

use catlint_types::{DocumentId, RequestSeq};

use crate::runner::RunError;

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    /// Map the analyzer's free-form severity text.
    ///
    /// Only the exact string `"warning"` is a warning; anything else,
    /// including a missing value, is an error.
    #[must_use]
    pub fn from_analyzer(value: Option<&str>) -> Self {
        match value {
            Some("warning") => Self::Warning,
            _ => Self::Error,
        }
    }

    #[must_use]
    pub fn is_error(self) -> bool {
        self == Self::Error
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
        }
    }
}

/// A diagnostic projected onto a single line of the current document text.
///
/// Invariant: the range never spans lines, starts at the first
/// non-whitespace character (0 for blank lines) and ends at the line's
/// length. Positions are 0-indexed; columns count UTF-16 code units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeDiagnostic {
    severity: Severity,
    message: String,
    line: usize,
    start_column: usize,
    end_column: usize,
}

impl RangeDiagnostic {
    #[must_use]
    pub fn new(
        severity: Severity,
        message: String,
        line: usize,
        start_column: usize,
        end_column: usize,
    ) -> Self {
        Self {
            severity,
            message,
            line,
            start_column,
            end_column,
        }
    }

    #[must_use]
    pub fn severity(&self) -> Severity {
        self.severity
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn start_line(&self) -> usize {
        self.line
    }

    #[must_use]
    pub fn start_column(&self) -> usize {
        self.start_column
    }

    /// Always equal to [`start_line`](Self::start_line).
    #[must_use]
    pub fn end_line(&self) -> usize {
        self.line
    }

    #[must_use]
    pub fn end_column(&self) -> usize {
        self.end_column
    }

    /// Format as `path:line:col: severity: message` (1-indexed for display).
    #[must_use]
    pub fn display_with_path(&self, path: &Path) -> String {
        format!(
            "{}:{}:{}: {}: {}",
            path.display(),
            self.line + 1,
            self.start_column + 1,
            self.severity.label(),
            self.message,
        )
    }
}

/// A text-change notification from the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentChange {
    pub document: DocumentId,
    /// Language kind of the changed document (e.g. "catlua").
    pub language_id: String,
}

impl DocumentChange {
    #[must_use]
    pub fn new(document: DocumentId, language_id: impl Into<String>) -> Self {
        Self {
            document,
            language_id: language_id.into(),
        }
    }
}

/// Why an analysis was not started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No analyzer path is configured for the document's workspace.
    NotConfigured,
    /// The host no longer knows the document (closed, or no path/text).
    DocumentUnavailable,
}

/// What the manager did in response to an event.
#[derive(Debug)]
pub enum LintUpdate {
    /// An analyzer process was launched for the document.
    Started {
        document: DocumentId,
        seq: RequestSeq,
    },
    /// A full diagnostic set replaced the previous one.
    Published {
        document: DocumentId,
        seq: RequestSeq,
        count: usize,
    },
    /// The analyzer could not run; the document's set was cleared.
    Failed {
        document: DocumentId,
        seq: RequestSeq,
        error: RunError,
    },
    /// A result arrived for a request that is no longer the latest.
    Discarded {
        document: DocumentId,
        seq: RequestSeq,
    },
    /// Analysis was not attempted.
    Skipped {
        document: DocumentId,
        reason: SkipReason,
    },
}

impl LintUpdate {
    #[must_use]
    pub fn document(&self) -> &DocumentId {
        match self {
            Self::Started { document, .. }
            | Self::Published { document, .. }
            | Self::Failed { document, .. }
            | Self::Discarded { document, .. }
            | Self::Skipped { document, .. } => document,
        }
    }

    /// Whether this update ends an analysis cycle for its document.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Started { .. })
    }
}

/// Immutable snapshot of all published diagnostics, suitable for status display.
///
/// Counts are computed from the canonical source (`documents`).
#[derive(Debug, Clone, Default)]
pub struct DiagnosticsSnapshot {
    /// Per-document diagnostics, error-containing documents first.
    documents: Vec<(DocumentId, Vec<RangeDiagnostic>)>,
}

impl DiagnosticsSnapshot {
    pub(crate) fn new(documents: Vec<(DocumentId, Vec<RangeDiagnostic>)>) -> Self {
        Self { documents }
    }

    #[must_use]
    pub fn documents(&self) -> &[(DocumentId, Vec<RangeDiagnostic>)] {
        &self.documents
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    fn count_by_severity(&self, severity: Severity) -> usize {
        self.documents
            .iter()
            .flat_map(|(_, items)| items)
            .filter(|d| d.severity() == severity)
            .count()
    }

    #[must_use]
    pub fn error_count(&self) -> usize {
        self.count_by_severity(Severity::Error)
    }

    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.count_by_severity(Severity::Warning)
    }

    #[must_use]
    pub fn total_count(&self) -> usize {
        self.documents.iter().map(|(_, items)| items.len()).sum()
    }

    /// Compact status string like "E:3 W:5"; empty when there is nothing to show.
    #[must_use]
    pub fn status_string(&self) -> String {
        if self.is_empty() {
            return String::new();
        }
        format!("E:{} W:{}", self.error_count(), self.warning_count())
    }
}
