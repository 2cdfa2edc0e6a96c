//! Diagnostic publisher: the single owner of what the host displays.
//!
//! Every analysis request is tagged with a [`RequestTicket`]. Only a result
//! carrying the latest ticket issued for its document is applied; anything
//! older is stale and ignored, whatever order results arrive in.

use std::collections::HashMap;

use catlint_types::{DocumentId, RequestSeq};

use crate::host::DiagnosticsDisplay;
use crate::types::{DiagnosticsSnapshot, RangeDiagnostic};

/// Tag for one in-flight analysis request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTicket {
    document: DocumentId,
    seq: RequestSeq,
}

impl RequestTicket {
    #[must_use]
    pub fn document(&self) -> &DocumentId {
        &self.document
    }

    #[must_use]
    pub fn seq(&self) -> RequestSeq {
        self.seq
    }
}

/// Owns the host display and the request sequence; applies only current results.
pub struct DiagnosticPublisher<S> {
    display: S,
    /// Last sequence number handed out, across all documents.
    last_seq: RequestSeq,
    /// Latest request issued per document. Absent once a document closes.
    latest: HashMap<DocumentId, RequestSeq>,
    /// Currently displayed, non-empty sets.
    sets: HashMap<DocumentId, Vec<RangeDiagnostic>>,
}

impl<S: DiagnosticsDisplay> DiagnosticPublisher<S> {
    pub fn new(display: S) -> Self {
        Self {
            display,
            last_seq: RequestSeq::new(0),
            latest: HashMap::new(),
            sets: HashMap::new(),
        }
    }

    /// Start a new request for `document`, invalidating any earlier one.
    pub fn issue(&mut self, document: &DocumentId) -> RequestTicket {
        self.last_seq = self.last_seq.next();
        self.latest.insert(document.clone(), self.last_seq);
        RequestTicket {
            document: document.clone(),
            seq: self.last_seq,
        }
    }

    #[must_use]
    pub fn is_current(&self, ticket: &RequestTicket) -> bool {
        self.latest.get(&ticket.document) == Some(&ticket.seq)
    }

    /// Replace the document's whole set. Returns `false` for a stale ticket.
    pub fn publish(&mut self, ticket: &RequestTicket, diagnostics: Vec<RangeDiagnostic>) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.display.set(&ticket.document, &diagnostics);
        if diagnostics.is_empty() {
            self.sets.remove(&ticket.document);
        } else {
            self.sets.insert(ticket.document.clone(), diagnostics);
        }
        true
    }

    /// Empty the document's set after a failed analysis. Returns `false` for a stale ticket.
    pub fn clear(&mut self, ticket: &RequestTicket) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.sets.remove(&ticket.document);
        self.display.clear(&ticket.document);
        true
    }

    /// The document closed: clear its set and invalidate in-flight requests.
    pub fn close(&mut self, document: &DocumentId) {
        self.latest.remove(document);
        self.sets.remove(document);
        self.display.clear(document);
    }

    /// Clear every displayed set and invalidate all in-flight requests.
    pub fn clear_all(&mut self) {
        self.latest.clear();
        for (document, _) in self.sets.drain() {
            self.display.clear(&document);
        }
    }

    #[must_use]
    pub fn diagnostics(&self, document: &DocumentId) -> &[RangeDiagnostic] {
        self.sets.get(document).map_or(&[], Vec::as_slice)
    }

    /// Snapshot of all sets: documents with errors first, then by identity.
    #[must_use]
    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        let mut documents: Vec<(DocumentId, Vec<RangeDiagnostic>)> = self
            .sets
            .iter()
            .map(|(document, items)| (document.clone(), items.clone()))
            .collect();

        documents.sort_by(|a, b| {
            let a_has_errors = a.1.iter().any(|d| d.severity().is_error());
            let b_has_errors = b.1.iter().any(|d| d.severity().is_error());
            b_has_errors.cmp(&a_has_errors).then_with(|| a.0.cmp(&b.0))
        });

        DiagnosticsSnapshot::new(documents)
    }

    #[must_use]
    pub fn display(&self) -> &S {
        &self.display
    }
}
