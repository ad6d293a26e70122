//! Configuration management for Margin
//!
//! Stores settings in ~/.config/margin/config.json

use crate::annotations::write_atomic;
use anyhow::{Context, Result};
use margin_core::overlay::DEFAULT_SNIPPET_WIDTH;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Document that annotations without a `file` belong to
    pub active_file: Option<String>,
    /// Keep a `.orig` copy of every file before the first write
    pub backup_on_write: bool,
    /// Display width of message snippets in overlay listings
    pub snippet_width: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            active_file: None,
            backup_on_write: true,
            snippet_width: DEFAULT_SNIPPET_WIDTH,
        }
    }
}

impl Config {
    fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("margin"))
    }

    fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("config.json"))
    }

    /// Load config from disk, or return default
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = fs::read_to_string(path) else {
            return Self::default();
        };
        match serde_json::from_str(&content) {
            Ok(config) => config,
            Err(err) => {
                preserve_corrupt_config(path, &content);
                warn!(
                    path = %path.display(),
                    error = %err,
                    "config file was corrupted; a backup was saved and defaults were loaded"
                );
                Self::default()
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content =
            serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        write_atomic(path, &content).context("Failed to write config")
    }
}

fn preserve_corrupt_config(path: &Path, content: &str) {
    let corrupt_path = path.with_extension("json.corrupt");
    if fs::rename(path, &corrupt_path).is_err() {
        let _ = fs::write(&corrupt_path, content);
    }
}
