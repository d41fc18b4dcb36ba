//! Working-directory listings fed back into step prompts.
//!
//! Pipeline steps discover artifacts from earlier scripts by re-listing the
//! directory; the listing (and the per-step new-file manifest derived from
//! it) is rendered into the next prompt as plain text.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// List regular files in `dir`, sorted by name. Directories (including the
/// journal's state directory) are excluded.
pub fn list_files(dir: &Path) -> Result<Vec<String>> {
    let entries = fs::read_dir(dir).with_context(|| format!("list {}", dir.display()))?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("read entry in {}", dir.display()))?;
        let file_type = entry.file_type().context("stat directory entry")?;
        if file_type.is_file() {
            files.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    files.sort();
    Ok(files)
}

/// Render a listing the way it appears in prompts: space-joined names.
pub fn render_listing(files: &[String]) -> String {
    files.join(" ")
}

/// Files present in `after` but not in `before`. Both inputs must be sorted.
pub fn new_files(before: &[String], after: &[String]) -> Vec<String> {
    after
        .iter()
        .filter(|name| before.binary_search(name).is_err())
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_files_but_not_directories() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::write(temp.path().join("b.csv"), "x").expect("write");
        fs::write(temp.path().join("a.py"), "x").expect("write");
        fs::create_dir(temp.path().join(".scriptpilot")).expect("mkdir");

        let files = list_files(temp.path()).expect("list");
        assert_eq!(files, vec!["a.py".to_string(), "b.csv".to_string()]);
    }

    #[test]
    fn renders_space_joined_listing() {
        let files = vec!["a.py".to_string(), "out.csv".to_string()];
        assert_eq!(render_listing(&files), "a.py out.csv");
    }

    #[test]
    fn diff_reports_only_created_files() {
        let before = vec!["a.py".to_string()];
        let after = vec!["a.py".to_string(), "out.csv".to_string()];
        assert_eq!(new_files(&before, &after), vec!["out.csv".to_string()]);
        assert!(new_files(&after, &before).is_empty());
    }
}
