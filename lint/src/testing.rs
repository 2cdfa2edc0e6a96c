//! Test doubles for the host capabilities and the analyzer.

use std::io;
use std::sync::{Arc, Mutex};

use catlint_types::DocumentId;
use futures_util::future::BoxFuture;
use tokio::sync::oneshot;

use crate::host::DiagnosticsDisplay;
use crate::runner::{Analyzer, Invocation, RunError, RunOutput};
use crate::types::{RangeDiagnostic, Severity};

pub(crate) fn make_diag(severity: Severity, msg: &str, line: usize) -> RangeDiagnostic {
    RangeDiagnostic::new(severity, msg.to_string(), line, 0, 1)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DisplayCall {
    Set(DocumentId, Vec<RangeDiagnostic>),
    Clear(DocumentId),
}

/// Display that records every call it receives.
#[derive(Debug, Default)]
pub(crate) struct RecordingDisplay {
    calls: Vec<DisplayCall>,
}

impl RecordingDisplay {
    pub(crate) fn calls(&self) -> &[DisplayCall] {
        &self.calls
    }

    /// What the host would currently show for `document`.
    pub(crate) fn shown(&self, document: &DocumentId) -> Vec<RangeDiagnostic> {
        self.calls
            .iter()
            .rev()
            .find_map(|call| match call {
                DisplayCall::Set(doc, items) if doc == document => Some(items.clone()),
                DisplayCall::Clear(doc) if doc == document => Some(Vec::new()),
                DisplayCall::Set(..) | DisplayCall::Clear(_) => None,
            })
            .unwrap_or_default()
    }
}

impl DiagnosticsDisplay for RecordingDisplay {
    fn set(&mut self, document: &DocumentId, diagnostics: &[RangeDiagnostic]) {
        self.calls
            .push(DisplayCall::Set(document.clone(), diagnostics.to_vec()));
    }

    fn clear(&mut self, document: &DocumentId) {
        self.calls.push(DisplayCall::Clear(document.clone()));
    }
}

type Responder = oneshot::Sender<Result<RunOutput, RunError>>;

#[derive(Default)]
struct ScriptState {
    invocations: Vec<Invocation>,
    responders: Vec<Option<Responder>>,
}

/// Analyzer whose runs complete only when the test says so.
///
/// Clones share state, so a test can keep one clone and hand another to the
/// manager.
#[derive(Clone, Default)]
pub(crate) struct ScriptedAnalyzer {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedAnalyzer {
    pub(crate) fn invocations(&self) -> Vec<Invocation> {
        self.state.lock().unwrap().invocations.clone()
    }

    /// Complete run number `index` (0-based, in spawn order).
    pub(crate) fn respond(&self, index: usize, result: Result<RunOutput, RunError>) {
        let responder = self.state.lock().unwrap().responders[index]
            .take()
            .expect("run already completed");
        let _ = responder.send(result);
    }

    pub(crate) fn respond_stdout(&self, index: usize, stdout: &str) {
        self.respond(index, Ok(RunOutput::new(Some(0), stdout)));
    }
}

impl Analyzer for ScriptedAnalyzer {
    fn run(&self, invocation: Invocation) -> BoxFuture<'static, Result<RunOutput, RunError>> {
        let (tx, rx) = oneshot::channel();
        {
            let mut state = self.state.lock().unwrap();
            state.invocations.push(invocation);
            state.responders.push(Some(tx));
        }
        Box::pin(async move {
            rx.await.unwrap_or_else(|_| {
                Err(RunError::Io {
                    program: "scripted".to_string(),
                    source: io::Error::other("responder dropped"),
                })
            })
        })
    }
}
