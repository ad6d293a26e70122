//! Annotation data model
//!
//! `RawEntry`/`AnnotationSet` mirror the persisted JSON shape and accept
//! anything; `AnnotationEntry` is the validated form the store works with.

use crate::error::LoadError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// Kind of annotation, keyed on the JSON `type` field
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EntryKind {
    Error,
    Warning,
    /// Carries a replacement or diff that can be applied
    Suggestion,
    /// Unrecognized type, preserved verbatim but never rendered or patched
    Other(String),
}

impl EntryKind {
    pub fn label(&self) -> &str {
        match self {
            EntryKind::Error => "error",
            EntryKind::Warning => "warning",
            EntryKind::Suggestion => "suggestion",
            EntryKind::Other(raw) => raw,
        }
    }

    pub fn is_diagnostic(&self) -> bool {
        matches!(self, EntryKind::Error | EntryKind::Warning)
    }
}

impl From<String> for EntryKind {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "error" => EntryKind::Error,
            "warning" => EntryKind::Warning,
            "suggestion" => EntryKind::Suggestion,
            _ => EntryKind::Other(raw),
        }
    }
}

impl From<EntryKind> for String {
    fn from(kind: EntryKind) -> Self {
        kind.label().to_string()
    }
}

/// One record as it appears in an annotation file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_line: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_line: Option<i64>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replacement: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff: Option<String>,
}

impl RawEntry {
    pub fn new(kind: &str, file: &str, start_line: i64) -> Self {
        Self {
            kind: Some(kind.to_string()),
            file: Some(file.to_string()),
            start_line: Some(start_line),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn with_end_line(mut self, end_line: i64) -> Self {
        self.end_line = Some(end_line);
        self
    }

    pub fn with_message(mut self, message: &str) -> Self {
        self.message = Some(message.to_string());
        self
    }

    pub fn with_replacement(mut self, replacement: &str) -> Self {
        self.replacement = Some(replacement.to_string());
        self
    }

    pub fn with_diff(mut self, diff: &str) -> Self {
        self.diff = Some(diff.to_string());
        self
    }
}

/// The `{ "entries": [...] }` document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotationSet {
    #[serde(default)]
    pub entries: Vec<RawEntry>,
}

impl AnnotationSet {
    /// Parse annotation text.
    ///
    /// Only text that is not JSON at all is an error. A missing or non-array
    /// `entries` yields an empty set, and individual records with the wrong
    /// field types are dropped with a warning.
    pub fn from_json_str(text: &str) -> Result<Self, LoadError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| LoadError::Malformed(e.to_string()))?;
        Ok(Self::from_value(&value))
    }

    pub fn from_value(value: &Value) -> Self {
        let Some(items) = value.get("entries").and_then(Value::as_array) else {
            return Self::default();
        };

        let mut entries = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            match serde_json::from_value::<RawEntry>(item.clone()) {
                Ok(raw) => entries.push(raw),
                Err(err) => warn!(index, error = %err, "skipping unreadable annotation record"),
            }
        }
        Self { entries }
    }
}

/// A validated annotation anchored to a file and a 1-based line range
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnotationEntry {
    pub id: String,
    pub file: Option<String>,
    pub kind: EntryKind,
    pub start_line: i64,
    pub end_line: Option<i64>,
    pub message: Option<String>,
    pub replacement: Option<String>,
    pub diff: Option<String>,
}

impl AnnotationEntry {
    pub(crate) fn from_raw(id: String, raw: RawEntry, active_file: Option<&str>) -> Self {
        let file = raw
            .file
            .filter(|f| !f.trim().is_empty())
            .or_else(|| active_file.map(str::to_string));
        Self {
            id,
            file,
            kind: EntryKind::from(raw.kind.unwrap_or_default()),
            start_line: raw.start_line.unwrap_or(0),
            end_line: raw.end_line,
            message: raw.message,
            replacement: raw.replacement,
            diff: raw.diff,
        }
    }

    /// End of the range, falling back to `start_line` when the record had none
    pub fn effective_end(&self) -> i64 {
        self.end_line.unwrap_or(self.start_line)
    }

    pub fn is_suggestion(&self) -> bool {
        self.kind == EntryKind::Suggestion
    }

    /// Whether `line` falls inside the range. A reversed range covers its start line.
    pub fn covers(&self, line: i64) -> bool {
        line >= self.start_line && line <= self.effective_end().max(self.start_line)
    }

    pub(crate) fn shift(&mut self, delta: i64) {
        self.start_line = self.start_line.saturating_add(delta);
        if let Some(end) = self.end_line.as_mut() {
            *end = end.saturating_add(delta);
        }
    }
}

/// Apply state tracked per entry id
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ApplyStatus {
    #[default]
    Pending,
    Applied {
        at: DateTime<Utc>,
    },
    Skipped,
}

impl ApplyStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ApplyStatus::Pending => "pending",
            ApplyStatus::Applied { .. } => "applied",
            ApplyStatus::Skipped => "skipped",
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, ApplyStatus::Pending)
    }

    pub fn applied_at(&self) -> Option<DateTime<Utc>> {
        match self {
            ApplyStatus::Applied { at } => Some(*at),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_kinds_round_trip_verbatim() {
        let kind: EntryKind = serde_json::from_str("\"hint\"").unwrap();
        assert_eq!(kind, EntryKind::Other("hint".to_string()));
        assert_eq!(serde_json::to_string(&kind).unwrap(), "\"hint\"");
        assert!(!kind.is_diagnostic());
    }

    #[test]
    fn missing_entries_is_an_empty_set() {
        let set = AnnotationSet::from_json_str(r#"{"version": 2}"#).unwrap();
        assert!(set.entries.is_empty());

        let set = AnnotationSet::from_json_str(r#"{"entries": "nope"}"#).unwrap();
        assert!(set.entries.is_empty());
    }

    #[test]
    fn non_json_text_is_malformed() {
        let err = AnnotationSet::from_json_str("entries: [").unwrap_err();
        assert!(matches!(err, LoadError::Malformed(_)));
    }

    #[test]
    fn records_with_bad_field_types_are_dropped() {
        let set = AnnotationSet::from_json_str(
            r#"{"entries": [
                {"id": "a", "file": "x.v", "start_line": 3, "type": "error"},
                {"id": "b", "file": "x.v", "start_line": "three", "type": "error"},
                42
            ]}"#,
        )
        .unwrap();
        assert_eq!(set.entries.len(), 1);
        assert_eq!(set.entries[0].id.as_deref(), Some("a"));
    }

    #[test]
    fn entry_defaults_file_and_end_line() {
        let raw = RawEntry {
            start_line: Some(4),
            kind: Some("warning".to_string()),
            ..RawEntry::default()
        };
        let entry = AnnotationEntry::from_raw("w1".to_string(), raw, Some("top.v"));
        assert_eq!(entry.file.as_deref(), Some("top.v"));
        assert_eq!(entry.effective_end(), 4);
        assert!(entry.covers(4));
        assert!(!entry.covers(5));
    }

    #[test]
    fn reversed_range_still_covers_start() {
        let raw = RawEntry::new("suggestion", "a.v", 7).with_end_line(5);
        let entry = AnnotationEntry::from_raw("s".to_string(), raw, None);
        assert!(entry.covers(7));
        assert!(!entry.covers(6));
    }
}
