//! Payload discovery
//!
//! Recursively collects candidate payload files under a root directory,
//! matching a fixed extension. The full list is sorted before returning so
//! repeated scans of an unchanged tree always yield the same order.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors from the payload scan. Both are configuration errors and fatal to
/// the run.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("Failed to read directory '{path}': {source}")]
    ReadDir {
        path: PathBuf,
        source: io::Error,
    },
}

/// Find all files with the given extension (case-insensitive) under `root`,
/// in lexicographic path order. Hidden directories are skipped.
pub fn scan_payloads(root: &Path, extension: &str) -> Result<Vec<PathBuf>, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::DirectoryNotFound(root.to_path_buf()));
    }

    let mut files = Vec::new();
    walk(root, extension, &mut files)?;
    files.sort();
    Ok(files)
}

fn walk(dir: &Path, extension: &str, out: &mut Vec<PathBuf>) -> Result<(), ScanError> {
    let entries = fs::read_dir(dir).map_err(|source| ScanError::ReadDir {
        path: dir.to_path_buf(),
        source,
    })?;

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            if !name.starts_with('.') {
                walk(&path, extension, out)?;
            }
        } else if path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(extension))
        {
            out.push(path);
        }
    }

    Ok(())
}
