//! Lint manager: the API hosts drive.
//!
//! Debounce timers and analyzer tasks never touch state directly. They send
//! [`LintEvent`]s into a channel, and the host applies them on its own loop
//! through [`LintManager::next_update`] or [`LintManager::poll_events`]. All
//! mutation therefore happens on one task, and no locking is needed.

use catlint_types::{DocumentId, LintSettings};
use tokio::sync::mpsc;

use crate::debounce::{DebounceScheduler, TimerId};
use crate::document::HostLines;
use crate::host::{ConfigSource, DiagnosticsDisplay, DocumentAccess};
use crate::parser;
use crate::publisher::{DiagnosticPublisher, RequestTicket};
use crate::runner::{Analyzer, Invocation, RunError, RunOutput};
use crate::types::{DiagnosticsSnapshot, DocumentChange, LintUpdate, SkipReason};

/// Channel capacity for the event channel between background tasks and the manager.
const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug)]
enum LintEvent {
    /// A document's debounce interval elapsed.
    Quiet {
        document: DocumentId,
        timer: TimerId,
    },
    /// An analyzer run finished, successfully or not.
    Finished {
        ticket: RequestTicket,
        result: Result<RunOutput, RunError>,
    },
}

/// Wires debounce, analyzer runs and publishing together for one host.
///
/// Generic over the host's documents (`D`), display (`S`) and config (`C`).
pub struct LintManager<D, S, C> {
    settings: LintSettings,
    documents: D,
    config: C,
    analyzer: Box<dyn Analyzer>,
    scheduler: DebounceScheduler<DocumentId>,
    publisher: DiagnosticPublisher<S>,
    event_tx: mpsc::Sender<LintEvent>,
    event_rx: mpsc::Receiver<LintEvent>,
}

impl<D, S, C> LintManager<D, S, C>
where
    D: DocumentAccess,
    S: DiagnosticsDisplay,
    C: ConfigSource,
{
    pub fn new(
        settings: LintSettings,
        documents: D,
        display: S,
        config: C,
        analyzer: Box<dyn Analyzer>,
    ) -> Self {
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            scheduler: DebounceScheduler::new(settings.debounce()),
            settings,
            documents,
            config,
            analyzer,
            publisher: DiagnosticPublisher::new(display),
            event_tx,
            event_rx,
        }
    }

    /// A document's text changed.
    ///
    /// Restarts the document's quiet interval. Returns `false` (and does
    /// nothing) for documents of another language.
    pub fn on_document_changed(&mut self, change: &DocumentChange) -> bool {
        if change.language_id != self.settings.language_id() {
            tracing::trace!(
                document = %change.document,
                language = %change.language_id,
                "Ignoring change for other language"
            );
            return false;
        }

        let tx = self.event_tx.clone();
        let document = change.document.clone();
        self.scheduler
            .schedule(change.document.clone(), move |timer| async move {
                let _ = tx.send(LintEvent::Quiet { document, timer }).await;
            });
        true
    }

    /// The document closed: drop its pending trigger and its diagnostics.
    pub fn on_document_closed(&mut self, document: &DocumentId) {
        self.scheduler.cancel(document);
        self.publisher.close(document);
        tracing::debug!(document = %document, "Document closed");
    }

    /// Start an analysis of the document's current text right away.
    ///
    /// Without a configured analyzer this returns
    /// [`SkipReason::NotConfigured`] before anything is spawned and without
    /// touching the displayed diagnostics.
    pub fn request_analysis(&mut self, document: &DocumentId) -> LintUpdate {
        let Some(analyzer_settings) = self.config.analyzer_for(document) else {
            tracing::debug!(document = %document, "No analyzer configured; skipping");
            return LintUpdate::Skipped {
                document: document.clone(),
                reason: SkipReason::NotConfigured,
            };
        };

        let (Some(path), Some(text)) = (self.documents.path(document), self.documents.text(document))
        else {
            tracing::debug!(document = %document, "Document unavailable; skipping");
            return LintUpdate::Skipped {
                document: document.clone(),
                reason: SkipReason::DocumentUnavailable,
            };
        };

        let ticket = self.publisher.issue(document);
        let seq = ticket.seq();
        let invocation = Invocation::for_document(&analyzer_settings, &path, text);
        tracing::debug!(
            document = %document,
            seq = %seq,
            program = %invocation.program(),
            "Starting analysis"
        );

        let run = self.analyzer.run(invocation);
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            let result = run.await;
            let _ = tx.send(LintEvent::Finished { ticket, result }).await;
        });

        LintUpdate::Started {
            document: document.clone(),
            seq,
        }
    }

    /// Wait for the next event and apply it.
    ///
    /// Cancel-safe: dropping the future before it completes loses nothing.
    /// Returns `None` only if the event channel closed, which cannot happen
    /// while the manager is alive.
    pub async fn next_update(&mut self) -> Option<LintUpdate> {
        loop {
            let event = self.event_rx.recv().await?;
            if let Some(update) = self.handle_event(event) {
                return Some(update);
            }
        }
    }

    /// Apply pending events without waiting, up to `budget`.
    pub fn poll_events(&mut self, budget: usize) -> Vec<LintUpdate> {
        let mut updates = Vec::new();
        for _ in 0..budget {
            match self.event_rx.try_recv() {
                Ok(event) => updates.extend(self.handle_event(event)),
                Err(mpsc::error::TryRecvError::Empty | mpsc::error::TryRecvError::Disconnected) => {
                    break;
                }
            }
        }
        updates
    }

    fn handle_event(&mut self, event: LintEvent) -> Option<LintUpdate> {
        match event {
            LintEvent::Quiet { document, timer } => {
                if !self.scheduler.take_fired(&document, timer) {
                    tracing::trace!(document = %document, "Superseded debounce trigger");
                    return None;
                }
                Some(self.request_analysis(&document))
            }
            LintEvent::Finished { ticket, result } => Some(self.finish(&ticket, result)),
        }
    }

    fn finish(
        &mut self,
        ticket: &RequestTicket,
        result: Result<RunOutput, RunError>,
    ) -> LintUpdate {
        let document = ticket.document().clone();
        let seq = ticket.seq();

        if !self.publisher.is_current(ticket) {
            tracing::debug!(document = %document, seq = %seq, "Discarding stale analysis result");
            return LintUpdate::Discarded { document, seq };
        }

        let output = match result {
            Ok(output) => output,
            Err(error) => {
                tracing::warn!(document = %document, "Analyzer could not run: {error}");
                self.publisher.clear(ticket);
                return LintUpdate::Failed {
                    document,
                    seq,
                    error,
                };
            }
        };

        let diagnostics = {
            let lines = HostLines::new(&self.documents, &document);
            match parser::decode_records(output.stdout()) {
                Ok(records) => parser::to_diagnostics(records, &lines),
                Err(e) => {
                    tracing::debug!(
                        document = %document,
                        exit_code = ?output.exit_code(),
                        "Analyzer output is not a diagnostic list ({e}); treating as no diagnostics"
                    );
                    Vec::new()
                }
            }
        };

        let count = diagnostics.len();
        self.publisher.publish(ticket, diagnostics);
        tracing::debug!(document = %document, seq = %seq, count, "Diagnostics published");
        LintUpdate::Published {
            document,
            seq,
            count,
        }
    }

    /// Snapshot of everything currently published.
    #[must_use]
    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        self.publisher.snapshot()
    }

    #[must_use]
    pub fn is_pending(&self, document: &DocumentId) -> bool {
        self.scheduler.is_pending(document)
    }

    #[must_use]
    pub fn settings(&self) -> &LintSettings {
        &self.settings
    }

    #[must_use]
    pub fn documents(&self) -> &D {
        &self.documents
    }

    pub fn documents_mut(&mut self) -> &mut D {
        &mut self.documents
    }

    #[must_use]
    pub fn display(&self) -> &S {
        self.publisher.display()
    }

    /// Cancel all pending triggers and clear everything displayed.
    ///
    /// Analyzer processes still running finish on their own; their results
    /// are stale and never applied.
    pub fn shutdown(&mut self) {
        self.scheduler.cancel_all();
        self.publisher.clear_all();
        tracing::info!("Lint manager shut down");
    }
}
