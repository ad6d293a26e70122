//! Annotation store
//!
//! Holds the entry table, a per-file index ordered by `start_line`, and the
//! apply status of every entry. A store is an ordinary value owned by the
//! host; every operation takes it by reference.

use crate::error::{ApplyError, LoadError, SkipError};
use crate::model::{AnnotationEntry, AnnotationSet, ApplyStatus};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Suggestion totals by status, for review summaries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub pending: usize,
    pub applied: usize,
    pub skipped: usize,
}

impl StatusCounts {
    pub fn total(&self) -> usize {
        self.pending + self.applied + self.skipped
    }
}

#[derive(Debug, Default, Clone)]
pub struct AnnotationStore {
    entries: HashMap<String, AnnotationEntry>,
    statuses: HashMap<String, ApplyStatus>,
    by_file: HashMap<String, Vec<String>>,
    /// Ids in load order
    order: Vec<String>,
    next_auto_id: u64,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all state with `set`.
    ///
    /// Records without a usable id, or repeating an id already seen in this
    /// set, get a generated one. Records without a file fall back to
    /// `active_file`. Returns the number of entries loaded.
    pub fn load(&mut self, set: AnnotationSet, active_file: Option<&str>) -> usize {
        self.clear();

        for raw in set.entries {
            let id = match raw.id.clone().filter(|id| !id.trim().is_empty()) {
                Some(id) if !self.entries.contains_key(&id) => id,
                Some(dup) => {
                    let fresh = self.generate_id();
                    warn!(duplicate = %dup, assigned = %fresh, "duplicate annotation id");
                    fresh
                }
                None => self.generate_id(),
            };

            let entry = AnnotationEntry::from_raw(id.clone(), raw, active_file);
            if let Some(file) = &entry.file {
                self.by_file
                    .entry(file.clone())
                    .or_default()
                    .push(id.clone());
            }
            self.statuses.insert(id.clone(), ApplyStatus::Pending);
            self.order.push(id.clone());
            self.entries.insert(id, entry);
        }

        let files: Vec<String> = self.by_file.keys().cloned().collect();
        for file in &files {
            self.sort_file(file);
        }

        info!(
            entries = self.order.len(),
            files = files.len(),
            "loaded annotations"
        );
        self.order.len()
    }

    /// Parse `text` and load it.
    ///
    /// Text that is not JSON leaves the store empty and reports
    /// `LoadError::Malformed`; the empty store stays usable.
    pub fn load_json(&mut self, text: &str, active_file: Option<&str>) -> Result<usize, LoadError> {
        match AnnotationSet::from_json_str(text) {
            Ok(set) => Ok(self.load(set, active_file)),
            Err(err) => {
                self.clear();
                Err(err)
            }
        }
    }

    /// Drop every entry. The id counter keeps running.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.statuses.clear();
        self.by_file.clear();
        self.order.clear();
    }

    fn generate_id(&mut self) -> String {
        self.next_auto_id += 1;
        format!("auto-{}-{}", self.next_auto_id, Uuid::new_v4())
    }

    fn sort_file(&mut self, file: &str) {
        let entries = &self.entries;
        if let Some(ids) = self.by_file.get_mut(file) {
            ids.sort_by_key(|id| entries.get(id).map_or(0, |e| e.start_line));
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&AnnotationEntry> {
        self.entries.get(id)
    }

    /// `None` only for ids the store does not know
    pub fn status(&self, id: &str) -> Option<ApplyStatus> {
        self.statuses.get(id).copied()
    }

    /// Every id in load order
    pub fn ids(&self) -> impl Iterator<Item = &String> {
        self.order.iter()
    }

    /// Every indexed file, sorted by path
    pub fn files(&self) -> Vec<&str> {
        let mut files: Vec<&str> = self.by_file.keys().map(String::as_str).collect();
        files.sort_unstable();
        files
    }

    /// Ids in `file`, ordered by `start_line`
    pub fn entries_for_file(&self, file: &str) -> &[String] {
        self.by_file.get(file).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn entries_in_file<'a>(&'a self, file: &str) -> impl Iterator<Item = &'a AnnotationEntry> {
        self.entries_for_file(file)
            .iter()
            .filter_map(move |id| self.entries.get(id))
    }

    pub fn mark_applied(&mut self, id: &str, at: DateTime<Utc>) -> Result<(), ApplyError> {
        let status = self
            .statuses
            .get_mut(id)
            .ok_or_else(|| ApplyError::NotFound(id.to_string()))?;
        if matches!(status, ApplyStatus::Applied { .. }) {
            return Err(ApplyError::AlreadyApplied(id.to_string()));
        }
        *status = ApplyStatus::Applied { at };
        Ok(())
    }

    /// Overwrites any prior status, including `Applied`. The buffer is not touched.
    pub fn mark_skipped(&mut self, id: &str) -> Result<(), SkipError> {
        let status = self
            .statuses
            .get_mut(id)
            .ok_or_else(|| SkipError::NotFound(id.to_string()))?;
        *status = ApplyStatus::Skipped;
        Ok(())
    }

    /// Shift every entry of `file` that starts strictly after
    /// `edited_end_line` by `delta`, skipping `edited_id`.
    ///
    /// Entries overlapping or straddling the edited range keep their
    /// pre-edit coordinates. The file's index is re-sorted afterwards.
    /// Returns how many entries moved.
    pub fn renumber_after_edit(
        &mut self,
        file: &str,
        edited_id: &str,
        edited_end_line: i64,
        delta: i64,
    ) -> usize {
        if delta == 0 {
            return 0;
        }
        let Some(ids) = self.by_file.get(file) else {
            return 0;
        };

        let mut shifted = 0;
        for id in ids {
            if id == edited_id {
                continue;
            }
            if let Some(entry) = self.entries.get_mut(id) {
                if entry.start_line > edited_end_line {
                    entry.shift(delta);
                    shifted += 1;
                }
            }
        }

        if shifted > 0 {
            self.sort_file(file);
        }
        debug!(file, edited_end_line, delta, shifted, "renumbered annotations");
        shifted
    }

    /// Status totals over suggestion entries only
    pub fn counts(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for id in &self.order {
            let is_suggestion = self.entries.get(id).is_some_and(|e| e.is_suggestion());
            if !is_suggestion {
                continue;
            }
            match self.statuses.get(id) {
                Some(ApplyStatus::Pending) | None => counts.pending += 1,
                Some(ApplyStatus::Applied { .. }) => counts.applied += 1,
                Some(ApplyStatus::Skipped) => counts.skipped += 1,
            }
        }
        counts
    }
}
