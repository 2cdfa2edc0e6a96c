//! Line access over document text, plus an in-memory document store.

use std::borrow::Cow;
use std::collections::HashMap;
use std::ops::Range;
use std::path::{Path, PathBuf};

use catlint_types::DocumentId;

use crate::host::DocumentAccess;

#[derive(Debug, thiserror::Error)]
#[error("cannot convert path to file URI: {}", path.display())]
pub struct PathToUriError {
    path: PathBuf,
}

/// Identity for a document backed by a file: its `file://` URI.
///
/// `path` must be absolute.
pub fn document_id_for_path(path: &Path) -> Result<DocumentId, PathToUriError> {
    url::Url::from_file_path(path)
        .map(|uri| DocumentId::new(uri.as_str()))
        .map_err(|()| PathToUriError {
            path: path.to_path_buf(),
        })
}

/// Inverse of [`document_id_for_path`]. `None` for non-`file://` identities.
#[must_use]
pub fn path_for_document(document: &DocumentId) -> Option<PathBuf> {
    url::Url::parse(document.as_str())
        .ok()
        .and_then(|u| u.to_file_path().ok())
}

/// Random access to the lines of a document.
pub trait LineSource {
    /// Text of line `index` (0-indexed) without its terminator, or `None`
    /// when the document has no such line.
    fn line_text(&self, index: usize) -> Option<Cow<'_, str>>;
}

/// Owned document text with precomputed line ranges.
///
/// Lines end at `\r\n`, `\n` or a lone `\r`; the terminator is not part of
/// the line text. Text that ends with a terminator has a final empty line, so
/// `"a\n"` has two lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSnapshot {
    text: String,
    lines: Vec<Range<usize>>,
}

impl TextSnapshot {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let bytes = text.as_bytes();
        let mut lines = Vec::new();
        let mut start = 0;
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'\n' => {
                    lines.push(start..i);
                    i += 1;
                    start = i;
                }
                b'\r' => {
                    lines.push(start..i);
                    i += if bytes.get(i + 1) == Some(&b'\n') { 2 } else { 1 };
                    start = i;
                }
                _ => i += 1,
            }
        }
        lines.push(start..bytes.len());
        Self { text, lines }
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn line(&self, index: usize) -> Option<&str> {
        self.text.get(self.lines.get(index)?.clone())
    }
}

impl LineSource for TextSnapshot {
    fn line_text(&self, index: usize) -> Option<Cow<'_, str>> {
        self.line(index).map(Cow::Borrowed)
    }
}

/// Lines of one host document, read at the moment they are asked for.
pub(crate) struct HostLines<'a, D: ?Sized> {
    documents: &'a D,
    document: &'a DocumentId,
}

impl<'a, D: DocumentAccess + ?Sized> HostLines<'a, D> {
    pub(crate) fn new(documents: &'a D, document: &'a DocumentId) -> Self {
        Self {
            documents,
            document,
        }
    }
}

impl<D: DocumentAccess + ?Sized> LineSource for HostLines<'_, D> {
    fn line_text(&self, index: usize) -> Option<Cow<'_, str>> {
        self.documents.line_text(self.document, index)
    }
}

#[derive(Debug, Clone)]
struct OpenDocument {
    path: PathBuf,
    snapshot: TextSnapshot,
}

/// Simple [`DocumentAccess`] for hosts that keep documents in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocuments {
    docs: HashMap<DocumentId, OpenDocument>,
}

impl MemoryDocuments {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, document: DocumentId, path: PathBuf, text: impl Into<String>) {
        self.docs.insert(
            document,
            OpenDocument {
                path,
                snapshot: TextSnapshot::new(text),
            },
        );
    }

    /// Replace the text of an open document. Returns `false` if it is not open.
    pub fn update(&mut self, document: &DocumentId, text: impl Into<String>) -> bool {
        match self.docs.get_mut(document) {
            Some(doc) => {
                doc.snapshot = TextSnapshot::new(text);
                true
            }
            None => false,
        }
    }

    pub fn close(&mut self, document: &DocumentId) -> bool {
        self.docs.remove(document).is_some()
    }

    #[must_use]
    pub fn snapshot(&self, document: &DocumentId) -> Option<&TextSnapshot> {
        self.docs.get(document).map(|doc| &doc.snapshot)
    }

    pub fn ids(&self) -> impl Iterator<Item = &DocumentId> {
        self.docs.keys()
    }
}

impl DocumentAccess for MemoryDocuments {
    fn path(&self, document: &DocumentId) -> Option<PathBuf> {
        self.docs.get(document).map(|doc| doc.path.clone())
    }

    fn text(&self, document: &DocumentId) -> Option<String> {
        self.docs
            .get(document)
            .map(|doc| doc.snapshot.text().to_string())
    }

    fn line_text(&self, document: &DocumentId, index: usize) -> Option<Cow<'_, str>> {
        self.snapshot(document)?.line_text(index)
    }
}
