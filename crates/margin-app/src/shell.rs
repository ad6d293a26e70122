//! Interactive session: one store, one set of file buffers, and the
//! commands that drive them.

use crate::commands::{Command, HELP};
use anyhow::Result;
use margin_adapters::{load_file, write_export, Config, FileBuffers};
use margin_core::overlay::OverlayFilter;
use margin_core::review::{review_apply, review_items, review_skip};
use margin_core::{apply, apply_all, export, rows_for_file, skip, AnnotationStore, AppliedEdit};
use std::io::Write;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

pub struct Session {
    store: AnnotationStore,
    buffers: FileBuffers,
    active_file: Option<String>,
    snippet_width: usize,
}

impl Session {
    pub fn new(root: PathBuf, config: &Config, active_file: Option<String>, no_backup: bool) -> Self {
        Self {
            store: AnnotationStore::new(),
            buffers: FileBuffers::new(root, config.backup_on_write && !no_backup),
            active_file: active_file.or_else(|| config.active_file.clone()),
            snippet_width: config.snippet_width,
        }
    }

    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    pub fn unsaved_files(&self) -> usize {
        self.buffers.dirty_paths().len()
    }

    /// Run one command. Only writes to `out` can fail; command failures are
    /// reported on `out` and the session carries on.
    pub fn execute(&mut self, command: Command, out: &mut impl Write) -> Result<Flow> {
        match command {
            Command::Load(path) => {
                let path = self.resolve(path);
                match load_file(&mut self.store, &path, self.active_file.as_deref()) {
                    Ok(n) => writeln!(out, "  + Loaded {} annotations from {}", n, path.display())?,
                    Err(err) => writeln!(out, "  ! {}", err)?,
                }
            }
            Command::Warnings(file) => self.list(file, OverlayFilter::Diagnostics, out)?,
            Command::Suggestions(file) => self.list(file, OverlayFilter::Suggestions, out)?,
            Command::Apply(id) => match apply(&mut self.store, &mut self.buffers, &id) {
                Ok(edit) => report_edit(&edit, out)?,
                Err(err) => writeln!(out, "  ! {}", err)?,
            },
            Command::Skip(id) => match skip(&mut self.store, &id) {
                Ok(()) => writeln!(out, "  + Skipped {}", id)?,
                Err(err) => writeln!(out, "  ! {}", err)?,
            },
            Command::ApplyAll => {
                let report = apply_all(&mut self.store, &mut self.buffers);
                writeln!(out, "  + Applied {} suggestion(s)", report.applied.len())?;
                for (id, err) in &report.failed {
                    writeln!(out, "    - {}: {}", id, err)?;
                }
            }
            Command::Export(path) => {
                let path = self.resolve(path);
                let record = export(&self.store);
                match write_export(&path, &record) {
                    Ok(()) => writeln!(
                        out,
                        "  + Exported {} applied suggestion(s) to {}",
                        record.applied.len(),
                        path.display()
                    )?,
                    Err(err) => writeln!(out, "  ! {:#}", err)?,
                }
            }
            Command::Review => self.review(out)?,
            Command::ReviewApply { file, line } => {
                match review_apply(&mut self.store, &mut self.buffers, &file, line) {
                    Ok(edit) => report_edit(&edit, out)?,
                    Err(err) => writeln!(out, "  ! {}", err)?,
                }
            }
            Command::ReviewSkip { file, line } => match review_skip(&mut self.store, &file, line) {
                Ok(id) => writeln!(out, "  + Skipped {}", id)?,
                Err(err) => writeln!(out, "  ! {}", err)?,
            },
            Command::Write => match self.buffers.flush() {
                Ok(paths) if paths.is_empty() => writeln!(out, "  Nothing to write")?,
                Ok(paths) => {
                    for path in paths {
                        writeln!(out, "  + Wrote {}", path.display())?;
                    }
                }
                Err(err) => writeln!(out, "  ! {:#}", err)?,
            },
            Command::Help => {
                writeln!(out, "\nAvailable Commands:")?;
                for (syntax, description) in HELP {
                    writeln!(out, "  {:30} - {}", syntax, description)?;
                }
            }
            Command::Exit => return Ok(Flow::Exit),
        }
        Ok(Flow::Continue)
    }

    fn resolve(&self, path: PathBuf) -> PathBuf {
        if path.is_absolute() {
            path
        } else {
            self.buffers.root().join(path)
        }
    }

    fn list(&self, file: Option<String>, filter: OverlayFilter, out: &mut impl Write) -> Result<()> {
        let files: Vec<String> = match file {
            Some(file) => vec![file],
            None => self.store.files().into_iter().map(str::to_string).collect(),
        };

        let mut shown = 0;
        for file in &files {
            let rows = rows_for_file(&self.store, file, filter, self.snippet_width);
            if rows.is_empty() {
                continue;
            }
            writeln!(out, "{}", file)?;
            for row in &rows {
                writeln!(
                    out,
                    "  {:>5}  {:<10} {:<8} {}  [{}]",
                    row.start_line,
                    row.kind.label(),
                    row.status.label(),
                    row.text,
                    row.id
                )?;
            }
            shown += rows.len();
        }
        if shown == 0 {
            writeln!(out, "  Nothing to show")?;
        }
        Ok(())
    }

    fn review(&self, out: &mut impl Write) -> Result<()> {
        let counts = self.store.counts();
        writeln!(
            out,
            "  {} suggestion(s): {} pending, {} applied, {} skipped",
            counts.total(),
            counts.pending,
            counts.applied,
            counts.skipped
        )?;
        for item in review_items(&self.store) {
            writeln!(
                out,
                "  {:<8} {}:{}  [{}]",
                item.status.label(),
                item.file.as_deref().unwrap_or("?"),
                item.start_line,
                item.id
            )?;
        }
        Ok(())
    }
}

fn report_edit(edit: &AppliedEdit, out: &mut impl Write) -> Result<()> {
    writeln!(
        out,
        "  + Applied {} to {} (lines {}-{}, {:+} line(s))",
        edit.id,
        edit.file,
        edit.start0 + 1,
        edit.end0 + 1,
        edit.delta
    )?;
    Ok(())
}
