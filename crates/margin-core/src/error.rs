//! Error taxonomy for annotation operations.
//!
//! Every failure here is local and recoverable: callers report the message
//! and the store is left as it was before the failing call.

use thiserror::Error;

/// The annotation input could not be turned into a table at all.
///
/// A store that hit a `LoadError` is left empty but usable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("annotation data is not valid JSON: {0}")]
    Malformed(String),
    #[error("could not read annotations from {path}: {reason}")]
    Io { path: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("entry has neither a replacement nor a diff")]
    NoContent,
}

/// Failures surfaced by the buffer collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BufferError {
    #[error("document is not open: {0}")]
    NotOpen(String),
    #[error("could not access {path}: {reason}")]
    Io { path: String, reason: String },
    #[error("line {start0} is past the end of a {len}-line document")]
    OutOfRange { start0: usize, len: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplyError {
    #[error("no annotation with id {0}")]
    NotFound(String),
    #[error("annotation {id} is a {kind}, not a suggestion")]
    NotASuggestion { id: String, kind: String },
    #[error("suggestion {0} was already applied")]
    AlreadyApplied(String),
    #[error("suggestion {0} has no target file")]
    MissingFile(String),
    #[error("suggestion {0} has no replacement or diff to apply")]
    NoContent(String),
    #[error(transparent)]
    Buffer(#[from] BufferError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipError {
    #[error("no annotation with id {0}")]
    NotFound(String),
}

/// Cursor-driven review failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReviewError {
    #[error("no suggestion at {file}:{line}")]
    NothingAtCursor { file: String, line: i64 },
    #[error(transparent)]
    Apply(#[from] ApplyError),
    #[error(transparent)]
    Skip(#[from] SkipError),
}
