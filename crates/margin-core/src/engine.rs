//! Patch engine
//!
//! Applies a suggestion to its buffer and renumbers the rest of the file.
//! One apply is one `set_lines` call followed by one renumbering pass.

use crate::buffer::BufferPort;
use crate::error::{ApplyError, SkipError};
use crate::resolve::resolve;
use crate::store::AnnotationStore;
use chrono::{DateTime, Utc};
use tracing::{info, warn};

/// What a successful apply did to the buffer and the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedEdit {
    pub id: String,
    pub file: String,
    /// First replaced line, 0-based
    pub start0: usize,
    /// Last replaced line, 0-based and inclusive
    pub end0: usize,
    pub inserted: usize,
    pub delta: i64,
    /// Sibling entries moved by renumbering
    pub shifted: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyAllReport {
    pub applied: Vec<String>,
    pub failed: Vec<(String, ApplyError)>,
}

pub fn apply<B: BufferPort>(
    store: &mut AnnotationStore,
    buffer: &mut B,
    id: &str,
) -> Result<AppliedEdit, ApplyError> {
    apply_at(store, buffer, id, Utc::now())
}

/// [`apply`] with an explicit timestamp for the `applied` status.
pub fn apply_at<B: BufferPort>(
    store: &mut AnnotationStore,
    buffer: &mut B,
    id: &str,
    now: DateTime<Utc>,
) -> Result<AppliedEdit, ApplyError> {
    let entry = store
        .get(id)
        .ok_or_else(|| ApplyError::NotFound(id.to_string()))?;
    if !entry.is_suggestion() {
        return Err(ApplyError::NotASuggestion {
            id: id.to_string(),
            kind: entry.kind.label().to_string(),
        });
    }
    if store.status(id).is_some_and(|s| s.applied_at().is_some()) {
        return Err(ApplyError::AlreadyApplied(id.to_string()));
    }
    let file = entry
        .file
        .clone()
        .ok_or_else(|| ApplyError::MissingFile(id.to_string()))?;
    let lines = resolve(entry).map_err(|_| ApplyError::NoContent(id.to_string()))?;
    let start_line = entry.start_line;
    let end_line = entry.effective_end();

    let doc = buffer.open_or_load(&file)?;
    let count = buffer.line_count(doc);
    let start0 = clamp_line(start_line, count);
    let end0 = clamp_line(end_line, count).max(start0);

    buffer.set_lines(doc, start0, end0 + 1, &lines)?;

    let replaced = end0 - start0 + 1;
    let delta = lines.len() as i64 - replaced as i64;
    // The pre-clamp end line is the shift boundary, even for stale anchors.
    let shifted = store.renumber_after_edit(&file, id, end_line, delta);
    store.mark_applied(id, now)?;

    info!(id, file = %file, start0, end0, delta, shifted, "applied suggestion");
    Ok(AppliedEdit {
        id: id.to_string(),
        file,
        start0,
        end0,
        inserted: lines.len(),
        delta,
        shifted,
    })
}

/// Map a 1-based line onto a valid 0-based index of a `count`-line buffer
fn clamp_line(line: i64, count: usize) -> usize {
    if count == 0 || line <= 1 {
        return 0;
    }
    usize::try_from(line - 1)
        .unwrap_or(usize::MAX)
        .min(count - 1)
}

/// Mark `id` skipped. Never touches the buffer, even for applied entries.
pub fn skip(store: &mut AnnotationStore, id: &str) -> Result<(), SkipError> {
    store.mark_skipped(id)?;
    info!(id, "skipped annotation");
    Ok(())
}

/// Apply every pending suggestion, in load order.
///
/// Failures are logged and collected; they never stop the batch.
pub fn apply_all<B: BufferPort>(store: &mut AnnotationStore, buffer: &mut B) -> ApplyAllReport {
    let pending: Vec<String> = store
        .ids()
        .filter(|id| {
            store.get(id).is_some_and(|e| e.is_suggestion())
                && store.status(id).is_some_and(|s| s.is_pending())
        })
        .cloned()
        .collect();

    let mut report = ApplyAllReport::default();
    for id in pending {
        match apply(store, buffer, &id) {
            Ok(_) => report.applied.push(id),
            Err(err) => {
                warn!(id = %id, error = %err, "could not apply suggestion");
                report.failed.push((id, err));
            }
        }
    }
    info!(
        applied = report.applied.len(),
        failed = report.failed.len(),
        "apply-all finished"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::MemoryBuffers;
    use crate::model::{AnnotationSet, ApplyStatus, RawEntry};

    fn ten_lines() -> String {
        (1..=10).map(|n| format!("line {n}\n")).collect()
    }

    fn setup(entries: Vec<RawEntry>) -> (AnnotationStore, MemoryBuffers) {
        let mut store = AnnotationStore::new();
        store.load(AnnotationSet { entries }, None);
        let mut buffers = MemoryBuffers::new();
        buffers.insert("alu.v", &ten_lines());
        (store, buffers)
    }

    fn start(store: &AnnotationStore, id: &str) -> Option<i64> {
        store.get(id).map(|e| e.start_line)
    }

    #[test]
    fn apply_grows_buffer_and_shifts_later_entries() {
        let (mut store, mut buffers) = setup(vec![
            RawEntry::new("suggestion", "alu.v", 3)
                .with_id("fix")
                .with_end_line(3)
                .with_replacement("wire a;\nwire b;\n"),
            RawEntry::new("warning", "alu.v", 5).with_id("later"),
            RawEntry::new("warning", "alu.v", 1).with_id("earlier"),
        ]);

        let edit = apply(&mut store, &mut buffers, "fix").unwrap();
        assert_eq!((edit.start0, edit.end0, edit.delta), (2, 2, 1));

        let lines = buffers.lines("alu.v").unwrap();
        assert_eq!(lines.len(), 11);
        assert_eq!(lines[2], "wire a;");
        assert_eq!(lines[3], "wire b;");
        assert_eq!(lines[4], "line 4");
        assert_eq!(start(&store, "later"), Some(6));
        assert_eq!(start(&store, "earlier"), Some(1));
        assert!(store.status("fix").is_some_and(|s| s.applied_at().is_some()));
    }

    #[test]
    fn shrinking_edit_shifts_entries_up() {
        let (mut store, mut buffers) = setup(vec![
            RawEntry::new("suggestion", "alu.v", 2)
                .with_id("fix")
                .with_end_line(5)
                .with_diff("@@ -2,4 +2,1 @@\n-a\n-b\n-c\n-d\n+merged"),
            RawEntry::new("error", "alu.v", 8).with_id("e").with_end_line(9),
        ]);
        let edit = apply(&mut store, &mut buffers, "fix").unwrap();
        assert_eq!(edit.delta, -3);
        assert_eq!(buffers.lines("alu.v").map(|l| l.len()), Some(7));
        assert_eq!(store.get("e").map(|e| (e.start_line, e.end_line)), Some((5, Some(6))));
    }

    #[test]
    fn stale_anchor_clamps_to_last_line() {
        let (mut store, mut buffers) = setup(vec![RawEntry::new("suggestion", "alu.v", 9999)
            .with_id("far")
            .with_replacement("endmodule")]);
        let edit = apply(&mut store, &mut buffers, "far").unwrap();
        assert_eq!((edit.start0, edit.end0), (9, 9));
        let lines = buffers.lines("alu.v").unwrap();
        assert_eq!(lines.len(), 10);
        assert_eq!(lines[9], "endmodule");
    }

    #[test]
    fn stale_anchor_uses_pre_clamp_boundary_for_renumbering() {
        let (mut store, mut buffers) = setup(vec![
            RawEntry::new("suggestion", "alu.v", 9999)
                .with_id("far")
                .with_replacement("endmodule\n// eof"),
            RawEntry::new("warning", "alu.v", 50).with_id("sib"),
        ]);
        let edit = apply(&mut store, &mut buffers, "far").unwrap();
        assert_eq!((edit.start0, edit.end0, edit.delta), (9, 9, 1));
        assert_eq!(edit.shifted, 0);
        assert_eq!(start(&store, "sib"), Some(50));
        assert_eq!(buffers.lines("alu.v").unwrap().len(), 11);
    }

    #[test]
    fn shifting_saturates_at_the_largest_line_number() {
        let (mut store, mut buffers) = setup(vec![
            RawEntry::new("suggestion", "alu.v", 1)
                .with_id("fix")
                .with_replacement("x\ny"),
            RawEntry::new("warning", "alu.v", i64::MAX)
                .with_id("edge")
                .with_end_line(i64::MAX),
        ]);
        let edit = apply(&mut store, &mut buffers, "fix").unwrap();
        assert_eq!((edit.delta, edit.shifted), (1, 1));
        assert_eq!(
            store.get("edge").map(|e| (e.start_line, e.end_line)),
            Some((i64::MAX, Some(i64::MAX)))
        );
        assert_eq!(store.status("fix").map(|s| s.is_pending()), Some(false));
    }

    #[test]
    fn reversed_and_nonpositive_ranges_degrade_to_one_line() {
        let (mut store, mut buffers) = setup(vec![
            RawEntry::new("suggestion", "alu.v", 4)
                .with_id("rev")
                .with_end_line(2)
                .with_replacement("R"),
            RawEntry::new("suggestion", "alu.v", -3)
                .with_id("neg")
                .with_replacement("N"),
        ]);
        let edit = apply(&mut store, &mut buffers, "rev").unwrap();
        assert_eq!((edit.start0, edit.end0, edit.delta), (3, 3, 0));
        let edit = apply(&mut store, &mut buffers, "neg").unwrap();
        assert_eq!((edit.start0, edit.end0), (0, 0));
        let lines = buffers.lines("alu.v").unwrap();
        assert_eq!(lines[0], "N");
        assert_eq!(lines[3], "R");
    }

    #[test]
    fn apply_into_empty_buffer() {
        let mut store = AnnotationStore::new();
        store.load(
            AnnotationSet {
                entries: vec![RawEntry::new("suggestion", "new.v", 1)
                    .with_id("init")
                    .with_replacement("module top;\nendmodule\n")],
            },
            None,
        );
        let mut buffers = MemoryBuffers::new();
        buffers.insert("new.v", "");
        let edit = apply(&mut store, &mut buffers, "init").unwrap();
        assert_eq!(edit.delta, 1);
        assert_eq!(buffers.lines("new.v").map(|l| l.len()), Some(2));
    }

    #[test]
    fn second_apply_is_rejected_without_touching_buffer() {
        let (mut store, mut buffers) = setup(vec![RawEntry::new("suggestion", "alu.v", 3)
            .with_id("fix")
            .with_replacement("a\nb\nc")]);
        apply(&mut store, &mut buffers, "fix").unwrap();
        let after_first = buffers.lines("alu.v").map(<[String]>::to_vec);

        assert_eq!(
            apply(&mut store, &mut buffers, "fix"),
            Err(ApplyError::AlreadyApplied("fix".to_string()))
        );
        assert_eq!(buffers.lines("alu.v").map(<[String]>::to_vec), after_first);
        assert_eq!(buffers.doc("alu.v").map(|d| d.undo_depth()), Some(1));
    }

    #[test]
    fn precondition_failures() {
        let (mut store, mut buffers) = setup(vec![
            RawEntry::new("error", "alu.v", 1).with_id("err"),
            RawEntry::new("suggestion", "alu.v", 1).with_id("empty"),
            RawEntry::new("suggestion", "gone.v", 1)
                .with_id("unopened")
                .with_replacement("x"),
            RawEntry {
                id: Some("nofile".to_string()),
                kind: Some("suggestion".to_string()),
                start_line: Some(1),
                replacement: Some("x".to_string()),
                ..RawEntry::default()
            },
        ]);

        assert_eq!(
            apply(&mut store, &mut buffers, "nope"),
            Err(ApplyError::NotFound("nope".to_string()))
        );
        assert!(matches!(
            apply(&mut store, &mut buffers, "err"),
            Err(ApplyError::NotASuggestion { .. })
        ));
        assert_eq!(
            apply(&mut store, &mut buffers, "empty"),
            Err(ApplyError::NoContent("empty".to_string()))
        );
        assert_eq!(
            apply(&mut store, &mut buffers, "nofile"),
            Err(ApplyError::MissingFile("nofile".to_string()))
        );
        assert!(matches!(
            apply(&mut store, &mut buffers, "unopened"),
            Err(ApplyError::Buffer(_))
        ));
        assert!(store.ids().all(|id| store.status(id) == Some(ApplyStatus::Pending)));
        assert_eq!(buffers.doc("alu.v").map(|d| d.undo_depth()), Some(0));
    }

    #[test]
    fn skip_changes_status_only() {
        let (mut store, mut buffers) = setup(vec![RawEntry::new("suggestion", "alu.v", 3)
            .with_id("fix")
            .with_replacement("a\nb")]);
        skip(&mut store, "fix").unwrap();
        assert_eq!(store.status("fix"), Some(ApplyStatus::Skipped));
        assert_eq!(buffers.lines("alu.v").map(|l| l.len()), Some(10));
        assert_eq!(
            skip(&mut store, "ghost"),
            Err(SkipError::NotFound("ghost".to_string()))
        );

        apply(&mut store, &mut buffers, "fix").unwrap();
        skip(&mut store, "fix").unwrap();
        assert_eq!(store.status("fix"), Some(ApplyStatus::Skipped));
        assert_eq!(buffers.lines("alu.v").map(|l| l.len()), Some(11));
    }

    #[test]
    fn apply_all_keeps_going_past_failures() {
        let (mut store, mut buffers) = setup(vec![
            RawEntry::new("suggestion", "alu.v", 2)
                .with_id("a")
                .with_replacement("A1\nA2"),
            RawEntry::new("suggestion", "alu.v", 5).with_id("broken"),
            RawEntry::new("suggestion", "alu.v", 7)
                .with_id("c")
                .with_replacement("C"),
            RawEntry::new("suggestion", "alu.v", 9)
                .with_id("skipped")
                .with_replacement("S"),
            RawEntry::new("warning", "alu.v", 8).with_id("w"),
        ]);
        skip(&mut store, "skipped").unwrap();

        let report = apply_all(&mut store, &mut buffers);
        assert_eq!(report.applied, vec!["a", "c"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "broken");

        let lines = buffers.lines("alu.v").unwrap();
        assert_eq!(lines.len(), 11);
        assert_eq!(lines[1], "A1");
        assert_eq!(lines[2], "A2");
        // "c" was anchored at line 7 and moved to 8 after "a" grew the file.
        assert_eq!(lines[7], "C");
        assert_eq!(store.status("broken"), Some(ApplyStatus::Pending));
        assert_eq!(store.status("skipped"), Some(ApplyStatus::Skipped));
        assert_eq!(store.get("w").map(|e| e.start_line), Some(9));
    }

    #[test]
    fn clamp_line_policy() {
        assert_eq!(clamp_line(0, 10), 0);
        assert_eq!(clamp_line(1, 10), 0);
        assert_eq!(clamp_line(10, 10), 9);
        assert_eq!(clamp_line(11, 10), 9);
        assert_eq!(clamp_line(5, 0), 0);
        assert_eq!(clamp_line(i64::MAX, 3), 2);
    }
}
