//! Replacement resolution
//!
//! Turns a suggestion's stored text into the lines that replace its range.
//! Diffs are classified line by line; hunk offsets are never read.

use crate::error::ResolveError;
use crate::model::AnnotationEntry;

/// Lines to write for `entry`. A literal replacement wins over a diff.
pub fn resolve(entry: &AnnotationEntry) -> Result<Vec<String>, ResolveError> {
    if let Some(text) = entry.replacement.as_deref() {
        return Ok(split_lines(text));
    }
    if let Some(diff) = entry.diff.as_deref() {
        return Ok(lines_from_diff(diff));
    }
    Err(ResolveError::NoContent)
}

/// Split on line boundaries. A final newline does not add an empty line.
pub fn split_lines(text: &str) -> Vec<String> {
    text.lines().map(str::to_string).collect()
}

/// Added lines of a diff with their `+` stripped.
///
/// A diff with no added lines is read as a plain listing instead: every
/// line except hunk headers and removals, kept verbatim.
pub fn lines_from_diff(diff: &str) -> Vec<String> {
    let added: Vec<String> = diff
        .lines()
        .filter(|line| line.starts_with('+') && !line.starts_with("+++"))
        .map(|line| line[1..].to_string())
        .collect();
    if !added.is_empty() {
        return added;
    }

    diff.lines()
        .filter(|line| !line.starts_with("@@") && !line.starts_with('-'))
        .map(str::to_string)
        .collect()
}
