//! Cursor-driven review
//!
//! The review flow is a presentation of apply and skip keyed on a cursor
//! position; these helpers map the cursor to a suggestion id.

use crate::buffer::BufferPort;
use crate::engine::{self, AppliedEdit};
use crate::error::ReviewError;
use crate::model::ApplyStatus;
use crate::store::AnnotationStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewItem {
    pub id: String,
    pub file: Option<String>,
    pub start_line: i64,
    pub status: ApplyStatus,
}

/// The suggestion under `line` in `file`, preferring pending ones
pub fn suggestion_at<'a>(store: &'a AnnotationStore, file: &str, line: i64) -> Option<&'a str> {
    let mut fallback = None;
    for entry in store.entries_in_file(file) {
        if !entry.is_suggestion() || !entry.covers(line) {
            continue;
        }
        if store.status(&entry.id).is_some_and(|s| s.is_pending()) {
            return Some(entry.id.as_str());
        }
        fallback.get_or_insert(entry.id.as_str());
    }
    fallback
}

pub fn review_apply<B: BufferPort>(
    store: &mut AnnotationStore,
    buffer: &mut B,
    file: &str,
    line: i64,
) -> Result<AppliedEdit, ReviewError> {
    let id = cursor_id(store, file, line)?;
    Ok(engine::apply(store, buffer, &id)?)
}

/// Skip the suggestion under the cursor, returning its id
pub fn review_skip(store: &mut AnnotationStore, file: &str, line: i64) -> Result<String, ReviewError> {
    let id = cursor_id(store, file, line)?;
    engine::skip(store, &id)?;
    Ok(id)
}

fn cursor_id(store: &AnnotationStore, file: &str, line: i64) -> Result<String, ReviewError> {
    suggestion_at(store, file, line)
        .map(str::to_string)
        .ok_or_else(|| ReviewError::NothingAtCursor {
            file: file.to_string(),
            line,
        })
}

/// Every suggestion with its status, in load order
pub fn review_items(store: &AnnotationStore) -> Vec<ReviewItem> {
    store
        .ids()
        .filter_map(|id| {
            let entry = store.get(id).filter(|e| e.is_suggestion())?;
            Some(ReviewItem {
                id: id.clone(),
                file: entry.file.clone(),
                start_line: entry.start_line,
                status: store.status(id).unwrap_or_default(),
            })
        })
        .collect()
}
