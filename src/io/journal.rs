//! Append-only JSONL journal of script executions.
//!
//! Product artifact under `.scriptpilot/journal.jsonl`, one line per script
//! file written, unaffected by `RUST_LOG`. The journal lives in a dot
//! directory so it never leaks into working-directory listings.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JournalEntry {
    /// Outer loop step (0-indexed).
    pub step: u32,
    /// Correction attempt within the step; 0 for the step's first script.
    pub attempt: u32,
    /// Monotonic script index (matches the `py<index>.py` file name).
    pub script_index: u32,
    /// False for skip-execution scripts that were persisted but never run.
    pub executed: bool,
    pub exit_code: Option<i32>,
    pub timed_out: bool,
    pub stderr_bytes: usize,
    pub duration_ms: u64,
}

/// Writer for the mission journal.
#[derive(Debug, Clone)]
pub struct Journal {
    path: PathBuf,
}

impl Journal {
    pub fn new(workdir: &Path) -> Self {
        Self {
            path: workdir.join(".scriptpilot").join("journal.jsonl"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, entry: &JournalEntry) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create journal dir {}", parent.display()))?;
        }
        let mut line = serde_json::to_string(entry).context("serialize journal entry")?;
        line.push('\n');
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("open journal {}", self.path.display()))?;
        file.write_all(line.as_bytes())
            .with_context(|| format!("append journal {}", self.path.display()))?;
        Ok(())
    }
}
