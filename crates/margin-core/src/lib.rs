//! Core domain model and contracts for Margin.
//!
//! Owns the annotation store, turns suggestion text into replacement lines,
//! applies those lines against a [`BufferPort`], and keeps every sibling
//! annotation anchored after an edit changes a file's line count.

pub mod buffer;
pub mod engine;
pub mod error;
pub mod export;
pub mod model;
pub mod overlay;
pub mod resolve;
pub mod review;
pub mod store;

pub use buffer::{BufferPort, LineDoc, MemoryBuffers};
pub use engine::{apply, apply_all, apply_at, skip, AppliedEdit, ApplyAllReport};
pub use error::{ApplyError, BufferError, LoadError, ResolveError, ReviewError, SkipError};
pub use export::{export, export_at, AppliedRecord, ExportMeta, ExportRecord};
pub use model::{AnnotationEntry, AnnotationSet, ApplyStatus, EntryKind, RawEntry};
pub use overlay::{rows_for_file, OverlayFilter, OverlayRow};
pub use resolve::resolve;
pub use store::{AnnotationStore, StatusCounts};
