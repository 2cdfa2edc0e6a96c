//! Live diagnostics for CatLua, produced by an external analyzer process.
//!
//! ```text
//! change -> DebounceScheduler -> Analyzer (ProcessRunner) -> parser -> DiagnosticPublisher -> host display
//! ```
//!
//! Hosts talk to [`LintManager`] and supply the capability traits in [`host`].

pub mod debounce;
pub mod document;
pub mod host;
pub mod parser;
pub mod publisher;
pub mod runner;
pub mod types;

mod manager;

#[cfg(test)]
pub(crate) mod testing;

pub use catlint_types::{AnalyzerSettings, DocumentId, LintSettings, RequestSeq};
pub use debounce::{DebounceScheduler, TimerId};
pub use document::{
    LineSource, MemoryDocuments, PathToUriError, TextSnapshot, document_id_for_path,
    path_for_document,
};
pub use host::{ConfigSource, DiagnosticsDisplay, DocumentAccess};
pub use manager::LintManager;
pub use publisher::{DiagnosticPublisher, RequestTicket};
pub use runner::{Analyzer, Invocation, ProcessRunner, RunError, RunOutput};
pub use types::{
    DiagnosticsSnapshot, DocumentChange, LintUpdate, RangeDiagnostic, Severity, SkipReason,
};
