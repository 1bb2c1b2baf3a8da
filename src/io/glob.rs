//! Hive-style partition discovery.

use anyhow::{Context, Result};
use glob::{Pattern, glob};
use std::path::{Path, PathBuf};

/// Every `*.parquet` file inside `root/<key>=*/`, sorted lexicographically.
///
/// Directories are skipped; an absent root yields an empty vector.
///
/// # Errors
/// Returns an error if the pattern is invalid or a matched entry cannot be read.
pub fn partition_files(root: &Path, key: &str) -> Result<Vec<PathBuf>> {
    let base = Pattern::escape(&root.to_string_lossy());
    let pattern = format!("{base}/{}=*/*.parquet", Pattern::escape(key));
    let paths = glob(&pattern).with_context(|| format!("invalid glob pattern: {pattern}"))?;

    let mut result = Vec::new();
    for entry in paths {
        let path =
            entry.with_context(|| format!("error reading glob entry for pattern: {pattern}"))?;
        if path.is_file() {
            result.push(path);
        }
    }
    result.sort();
    Ok(result)
}

/// Every `root/<key>=*` directory, sorted lexicographically.
///
/// # Errors
/// Returns an error if the pattern is invalid or a matched entry cannot be read.
pub fn partition_dirs(root: &Path, key: &str) -> Result<Vec<PathBuf>> {
    let base = Pattern::escape(&root.to_string_lossy());
    let pattern = format!("{base}/{}=*", Pattern::escape(key));
    let mut dirs = Vec::new();
    for entry in glob(&pattern).with_context(|| format!("invalid glob pattern: {pattern}"))? {
        let path = entry.with_context(|| format!("error reading glob entry for pattern: {pattern}"))?;
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}
