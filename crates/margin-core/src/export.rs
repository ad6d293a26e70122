//! Export of applied suggestions
//!
//! Produces the `{ "meta": ..., "applied": [...] }` record. Read-only.

use crate::store::AnnotationStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportMeta {
    pub exported_at: DateTime<Utc>,
}

/// One applied entry, with its anchor as it stands after renumbering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedRecord {
    pub id: String,
    pub file: Option<String>,
    pub start_line: i64,
    pub end_line: i64,
    pub applied_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRecord {
    pub meta: ExportMeta,
    pub applied: Vec<AppliedRecord>,
}

impl ExportRecord {
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

pub fn export(store: &AnnotationStore) -> ExportRecord {
    export_at(store, Utc::now())
}

/// Applied entries in load order, stamped with `now`
pub fn export_at(store: &AnnotationStore, now: DateTime<Utc>) -> ExportRecord {
    let applied = store
        .ids()
        .filter_map(|id| {
            let applied_at = store.status(id)?.applied_at()?;
            let entry = store.get(id)?;
            Some(AppliedRecord {
                id: id.clone(),
                file: entry.file.clone(),
                start_line: entry.start_line,
                end_line: entry.effective_end(),
                applied_at,
            })
        })
        .collect();

    ExportRecord {
        meta: ExportMeta { exported_at: now },
        applied,
    }
}
