//! Buffers backed by files on disk
//!
//! Documents are read on first use and only written back by `flush`.
//! The first write of a file leaves a `<name>.orig` copy next to it when
//! backups are on.

use crate::annotations::write_atomic;
use anyhow::{Context, Result};
use margin_core::{BufferError, BufferPort, LineDoc};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug)]
struct FileDoc {
    path: PathBuf,
    doc: LineDoc,
    line_ending: &'static str,
    trailing_newline: bool,
    dirty: bool,
    backed_up: bool,
}

#[derive(Debug)]
pub struct FileBuffers {
    root: PathBuf,
    backup_on_write: bool,
    docs: Vec<FileDoc>,
    by_path: HashMap<PathBuf, usize>,
}

impl FileBuffers {
    /// Relative annotation paths resolve against `root`
    pub fn new(root: impl Into<PathBuf>, backup_on_write: bool) -> Self {
        Self {
            root: root.into(),
            backup_on_write,
            docs: Vec::new(),
            by_path: HashMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve_path(&self, path: &str) -> PathBuf {
        let candidate = Path::new(path);
        if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.root.join(candidate)
        }
    }

    pub fn lines(&self, path: &str) -> Option<&[String]> {
        self.by_path
            .get(&self.resolve_path(path))
            .and_then(|&h| self.docs.get(h))
            .map(|d| d.doc.lines())
    }

    /// Revert the latest edit of `path` in memory
    pub fn undo(&mut self, path: &str) -> bool {
        let Some(&handle) = self.by_path.get(&self.resolve_path(path)) else {
            return false;
        };
        let Some(file) = self.docs.get_mut(handle) else {
            return false;
        };
        let undone = file.doc.undo();
        file.dirty |= undone;
        undone
    }

    pub fn dirty_paths(&self) -> Vec<&Path> {
        self.docs
            .iter()
            .filter(|d| d.dirty)
            .map(|d| d.path.as_path())
            .collect()
    }

    /// Write every modified document back to disk, returning the paths written
    pub fn flush(&mut self) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();
        for file in self.docs.iter_mut().filter(|d| d.dirty) {
            if self.backup_on_write && !file.backed_up {
                let backup = backup_path(&file.path);
                fs::copy(&file.path, &backup).with_context(|| {
                    format!("Failed to create backup {}", backup.display())
                })?;
                file.backed_up = true;
                debug!(backup = %backup.display(), "backup created");
            }

            let text = file.doc.to_text_with(file.line_ending, file.trailing_newline);
            write_atomic(&file.path, &text)
                .with_context(|| format!("Failed to write {}", file.path.display()))?;
            file.dirty = false;
            written.push(file.path.clone());
        }
        info!(files = written.len(), "buffers flushed");
        Ok(written)
    }
}

fn backup_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{name}.orig"))
}

impl BufferPort for FileBuffers {
    type Doc = usize;

    fn open_or_load(&mut self, path: &str) -> Result<usize, BufferError> {
        let full = self.resolve_path(path);
        if let Some(&handle) = self.by_path.get(&full) {
            return Ok(handle);
        }

        let text = fs::read_to_string(&full).map_err(|e| BufferError::Io {
            path: full.display().to_string(),
            reason: e.to_string(),
        })?;
        self.docs.push(FileDoc {
            path: full.clone(),
            doc: LineDoc::from_text(&text),
            line_ending: if text.contains("\r\n") { "\r\n" } else { "\n" },
            trailing_newline: text.ends_with('\n'),
            dirty: false,
            backed_up: false,
        });
        let handle = self.docs.len() - 1;
        self.by_path.insert(full, handle);
        debug!(path, handle, "document opened");
        Ok(handle)
    }

    fn line_count(&self, doc: usize) -> usize {
        self.docs.get(doc).map_or(0, |d| d.doc.len())
    }

    fn set_lines(
        &mut self,
        doc: usize,
        start0: usize,
        end0_exclusive: usize,
        lines: &[String],
    ) -> Result<(), BufferError> {
        let file = self
            .docs
            .get_mut(doc)
            .ok_or_else(|| BufferError::NotOpen(format!("#{doc}")))?;
        file.doc.splice(start0, end0_exclusive, lines)?;
        file.dirty = true;
        Ok(())
    }
}
