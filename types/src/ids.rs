use std::fmt;

/// Opaque identity of an open document, as handed out by the host.
///
/// Usually a `file://` URI, but any stable string the host uses works.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(String);

impl DocumentId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Sequence number of an analysis request.
///
/// Issued from a single monotonic counter, so a larger value always means a
/// more recent request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestSeq(u64);

impl RequestSeq {
    #[must_use]
    pub fn new(seq: u64) -> Self {
        Self(seq)
    }

    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }

    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for RequestSeq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_id_display_is_raw_string() {
        let id = DocumentId::new("file:///work/main.cat");
        assert_eq!(id.to_string(), "file:///work/main.cat");
        assert_eq!(id.as_str(), "file:///work/main.cat");
    }

    #[test]
    fn request_seq_next_is_strictly_greater() {
        let first = RequestSeq::new(7);
        let second = first.next();
        assert!(second > first);
        assert_eq!(second.value(), 8);
        assert_eq!(second.to_string(), "#8");
    }
}
