//! Overlay rows for the rendering layer
//!
//! A renderer asks for the rows of one file after every load, apply, or
//! skip and paints them however it likes.

use crate::model::{AnnotationEntry, ApplyStatus, EntryKind};
use crate::resolve::resolve;
use crate::store::AnnotationStore;
use unicode_width::UnicodeWidthChar;

pub const DEFAULT_SNIPPET_WIDTH: usize = 60;

/// Which entries a view shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayFilter {
    /// Errors and warnings
    Diagnostics,
    Suggestions,
}

impl OverlayFilter {
    fn admits(&self, kind: &EntryKind) -> bool {
        match self {
            OverlayFilter::Diagnostics => kind.is_diagnostic(),
            OverlayFilter::Suggestions => *kind == EntryKind::Suggestion,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayRow {
    pub id: String,
    pub kind: EntryKind,
    pub start_line: i64,
    /// Message, or a snippet of the suggested text
    pub text: String,
    pub status: ApplyStatus,
}

/// Rows for `file` in index order. Unrecognized kinds never appear.
pub fn rows_for_file(
    store: &AnnotationStore,
    file: &str,
    filter: OverlayFilter,
    width: usize,
) -> Vec<OverlayRow> {
    store
        .entries_in_file(file)
        .filter(|entry| filter.admits(&entry.kind))
        .map(|entry| OverlayRow {
            id: entry.id.clone(),
            kind: entry.kind.clone(),
            start_line: entry.start_line,
            text: truncate_to_width(&row_text(entry), width),
            status: store.status(&entry.id).unwrap_or_default(),
        })
        .collect()
}

fn row_text(entry: &AnnotationEntry) -> String {
    if let Some(line) = entry.message.as_deref().and_then(first_line) {
        return line.to_string();
    }
    resolve(entry)
        .ok()
        .and_then(|lines| {
            lines
                .iter()
                .find_map(|l| first_line(l))
                .map(str::to_string)
        })
        .unwrap_or_default()
}

fn first_line(text: &str) -> Option<&str> {
    text.lines().map(str::trim).find(|l| !l.is_empty())
}

/// Cut `text` to at most `width` display columns, ending with `…` when cut.
pub fn truncate_to_width(text: &str, width: usize) -> String {
    let total: usize = text.chars().map(|c| c.width().unwrap_or(0)).sum();
    if total <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }

    let budget = width - 1;
    let mut used = 0;
    let mut out = String::new();
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push('…');
    out
}
