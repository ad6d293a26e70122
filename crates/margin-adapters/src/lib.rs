//! File-system edge of Margin: annotation files, exports, buffers on disk,
//! and user configuration.

pub mod annotations;
pub mod config;
pub mod files;

pub use annotations::{load_file, write_export};
pub use config::Config;
pub use files::FileBuffers;
