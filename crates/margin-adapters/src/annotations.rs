//! Annotation files on disk
//!
//! Loading is best-effort: an unreadable file leaves an empty, usable
//! store and an error for the caller to show.

use anyhow::{Context, Result};
use margin_core::{AnnotationStore, ExportRecord, LoadError};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Replace the store's contents with the annotations in `path`
pub fn load_file(
    store: &mut AnnotationStore,
    path: &Path,
    active_file: Option<&str>,
) -> Result<usize, LoadError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            store.clear();
            return Err(LoadError::Io {
                path: path.display().to_string(),
                reason: err.to_string(),
            });
        }
    };
    let loaded = store.load_json(&text, active_file)?;
    info!(path = %path.display(), loaded, "annotation file loaded");
    Ok(loaded)
}

/// Write `record` as pretty JSON, replacing `path` atomically
pub fn write_export(path: &Path, record: &ExportRecord) -> Result<()> {
    let json = record
        .to_json_pretty()
        .context("Failed to serialize export")?;
    write_atomic(path, &json)
        .with_context(|| format!("Failed to write export to {}", path.display()))?;
    info!(path = %path.display(), applied = record.applied.len(), "export written");
    Ok(())
}

/// Write through a sibling temp file and rename over `path`
pub(crate) fn write_atomic(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp_path = path.with_file_name(format!(".{file_name}.tmp"));
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&tmp_path)?;
    file.write_all(content.as_bytes())?;
    file.sync_all()?;

    if let Err(err) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(err.into());
    }
    Ok(())
}
