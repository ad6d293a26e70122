//! Buffer collaborator
//!
//! [`BufferPort`] is the seam to whatever owns the text: an editor, the file
//! system adapter, or the in-memory [`MemoryBuffers`] used in tests.

use crate::error::BufferError;
use std::collections::HashMap;

/// A mutable, line-addressable set of documents.
///
/// Lines are 0-based at this boundary.
pub trait BufferPort {
    type Doc: Copy;

    /// Open `path`, or return the handle of the already-open document.
    /// Must not steal focus from whatever the user is looking at.
    fn open_or_load(&mut self, path: &str) -> Result<Self::Doc, BufferError>;

    fn line_count(&self, doc: Self::Doc) -> usize;

    /// Replace lines `[start0, end0_exclusive)` with `lines` as one undoable step.
    fn set_lines(
        &mut self,
        doc: Self::Doc,
        start0: usize,
        end0_exclusive: usize,
        lines: &[String],
    ) -> Result<(), BufferError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct UndoStep {
    start0: usize,
    inserted: usize,
    removed: Vec<String>,
}

/// Lines of one document plus its undo history
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineDoc {
    lines: Vec<String>,
    undo: Vec<UndoStep>,
}

impl LineDoc {
    pub fn new(lines: Vec<String>) -> Self {
        Self {
            lines,
            undo: Vec::new(),
        }
    }

    pub fn from_text(text: &str) -> Self {
        Self::new(text.lines().map(str::to_string).collect())
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Join lines with `\n`, optionally ending with one
    pub fn to_text(&self, trailing_newline: bool) -> String {
        self.to_text_with("\n", trailing_newline)
    }

    /// Join lines with `line_ending`, optionally ending with one
    pub fn to_text_with(&self, line_ending: &str, trailing_newline: bool) -> String {
        let mut text = self.lines.join(line_ending);
        if trailing_newline && !self.lines.is_empty() {
            text.push_str(line_ending);
        }
        text
    }

    /// Replace `[start0, end0_exclusive)`; the end is clamped to the document.
    pub fn splice(
        &mut self,
        start0: usize,
        end0_exclusive: usize,
        lines: &[String],
    ) -> Result<(), BufferError> {
        let len = self.lines.len();
        if start0 > len {
            return Err(BufferError::OutOfRange { start0, len });
        }
        let end = end0_exclusive.clamp(start0, len);
        let removed: Vec<String> = self
            .lines
            .splice(start0..end, lines.iter().cloned())
            .collect();
        self.undo.push(UndoStep {
            start0,
            inserted: lines.len(),
            removed,
        });
        Ok(())
    }

    /// Revert the most recent splice. Returns false when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(step) = self.undo.pop() else {
            return false;
        };
        let end = (step.start0 + step.inserted).min(self.lines.len());
        self.lines.splice(step.start0..end, step.removed);
        true
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    pub fn is_modified(&self) -> bool {
        !self.undo.is_empty()
    }
}

/// In-memory documents keyed by path. Paths must be inserted before use.
#[derive(Debug, Clone, Default)]
pub struct MemoryBuffers {
    docs: Vec<LineDoc>,
    by_path: HashMap<String, usize>,
}

impl MemoryBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a document, returning its handle
    pub fn insert(&mut self, path: &str, text: &str) -> usize {
        self.insert_doc(path, LineDoc::from_text(text))
    }

    pub fn insert_lines<S: AsRef<str>>(&mut self, path: &str, lines: &[S]) -> usize {
        let lines = lines.iter().map(|l| l.as_ref().to_string()).collect();
        self.insert_doc(path, LineDoc::new(lines))
    }

    fn insert_doc(&mut self, path: &str, doc: LineDoc) -> usize {
        if let Some(&handle) = self.by_path.get(path) {
            self.docs[handle] = doc;
            return handle;
        }
        self.docs.push(doc);
        let handle = self.docs.len() - 1;
        self.by_path.insert(path.to_string(), handle);
        handle
    }

    pub fn doc(&self, path: &str) -> Option<&LineDoc> {
        self.by_path.get(path).and_then(|&h| self.docs.get(h))
    }

    pub fn lines(&self, path: &str) -> Option<&[String]> {
        self.doc(path).map(LineDoc::lines)
    }

    pub fn undo(&mut self, path: &str) -> bool {
        match self.by_path.get(path) {
            Some(&h) => self.docs.get_mut(h).is_some_and(LineDoc::undo),
            None => false,
        }
    }
}

impl BufferPort for MemoryBuffers {
    type Doc = usize;

    fn open_or_load(&mut self, path: &str) -> Result<usize, BufferError> {
        self.by_path
            .get(path)
            .copied()
            .ok_or_else(|| BufferError::NotOpen(path.to_string()))
    }

    fn line_count(&self, doc: usize) -> usize {
        self.docs.get(doc).map_or(0, LineDoc::len)
    }

    fn set_lines(
        &mut self,
        doc: usize,
        start0: usize,
        end0_exclusive: usize,
        lines: &[String],
    ) -> Result<(), BufferError> {
        self.docs
            .get_mut(doc)
            .ok_or_else(|| BufferError::NotOpen(format!("#{doc}")))?
            .splice(start0, end0_exclusive, lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|l| l.to_string()).collect()
    }

    #[test]
    fn splice_replaces_and_undo_restores() {
        let mut doc = LineDoc::from_text("a\nb\nc\nd\n");
        doc.splice(1, 3, &strings(&["x", "y", "z"])).unwrap();
        assert_eq!(doc.lines(), strings(&["a", "x", "y", "z", "d"]).as_slice());
        assert!(doc.is_modified());

        assert!(doc.undo());
        assert_eq!(doc.to_text(true), "a\nb\nc\nd\n");
        assert!(!doc.undo());
    }

    #[test]
    fn splice_clamps_end_and_rejects_far_start() {
        let mut doc = LineDoc::from_text("a\nb");
        doc.splice(1, 99, &strings(&["z"])).unwrap();
        assert_eq!(doc.to_text(false), "a\nz");
        assert_eq!(
            doc.splice(5, 6, &[]),
            Err(BufferError::OutOfRange { start0: 5, len: 2 })
        );
        assert_eq!(doc.undo_depth(), 1);
    }

    #[test]
    fn crlf_text_splits_cleanly_and_joins_back() {
        let doc = LineDoc::from_text("a\r\nb\r\n");
        assert_eq!(doc.lines(), strings(&["a", "b"]).as_slice());
        assert_eq!(doc.to_text_with("\r\n", true), "a\r\nb\r\n");
        assert_eq!(doc.to_text(false), "a\nb");
    }

    #[test]
    fn splice_into_empty_document() {
        let mut doc = LineDoc::default();
        doc.splice(0, 1, &strings(&["first"])).unwrap();
        assert_eq!(doc.lines(), strings(&["first"]).as_slice());
    }

    #[test]
    fn memory_buffers_open_is_idempotent() {
        let mut buffers = MemoryBuffers::new();
        let handle = buffers.insert("a.v", "one\ntwo");
        assert_eq!(buffers.open_or_load("a.v"), Ok(handle));
        assert_eq!(buffers.open_or_load("a.v"), Ok(handle));
        assert_eq!(buffers.line_count(handle), 2);
        assert_eq!(
            buffers.open_or_load("b.v"),
            Err(BufferError::NotOpen("b.v".to_string()))
        );
    }

    #[test]
    fn memory_buffers_undo_by_path() {
        let mut buffers = MemoryBuffers::new();
        let handle = buffers.insert_lines("a.v", &["one", "two"]);
        buffers.set_lines(handle, 0, 1, &strings(&["uno"])).unwrap();
        assert_eq!(buffers.lines("a.v"), Some(strings(&["uno", "two"]).as_slice()));
        assert!(buffers.undo("a.v"));
        assert_eq!(buffers.lines("a.v"), Some(strings(&["one", "two"]).as_slice()));
        assert!(!buffers.undo("missing.v"));
    }
}
