//! Prints published diagnostics to stdout, one per line.

use std::path::PathBuf;

use catlint_lint::{DiagnosticsDisplay, DocumentId, RangeDiagnostic, path_for_document};

#[derive(Debug, Default)]
pub struct TerminalDisplay {
    /// Also report documents that became clean (watch mode).
    announce_clean: bool,
}

impl TerminalDisplay {
    pub fn new(announce_clean: bool) -> Self {
        Self { announce_clean }
    }
}

fn display_path(document: &DocumentId) -> PathBuf {
    path_for_document(document).unwrap_or_else(|| PathBuf::from(document.as_str()))
}

pub(crate) fn render(
    document: &DocumentId,
    diagnostics: &[RangeDiagnostic],
    announce_clean: bool,
) -> Vec<String> {
    let path = display_path(document);
    if diagnostics.is_empty() {
        return if announce_clean {
            vec![format!("{}: no diagnostics", path.display())]
        } else {
            Vec::new()
        };
    }
    diagnostics
        .iter()
        .map(|diagnostic| diagnostic.display_with_path(&path))
        .collect()
}

impl DiagnosticsDisplay for TerminalDisplay {
    fn set(&mut self, document: &DocumentId, diagnostics: &[RangeDiagnostic]) {
        for line in render(document, diagnostics, self.announce_clean) {
            println!("{line}");
        }
    }

    fn clear(&mut self, document: &DocumentId) {
        if self.announce_clean {
            println!("{}: diagnostics cleared", display_path(document).display());
        }
    }
}
