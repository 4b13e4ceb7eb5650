//! Marker file handling
//!
//! The marker is an out-of-band success signal: the invoked command (or the
//! exploit it triggers) creates the file, and this tool only checks that it
//! exists. Contents are never inspected. The marker must be cleared before
//! every trial so a hit from one payload cannot bleed into the next.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

/// Default marker path created by common proof-of-concept gadget chains.
pub const DEFAULT_MARKER_PATH: &str = "/tmp/poc";

/// A well-known filesystem path whose existence signals code execution.
#[derive(Debug, Clone)]
pub struct MarkerFile {
    path: PathBuf,
}

impl MarkerFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the marker if present. Best-effort: a failed removal only
    /// risks a false positive on the next trial, so errors are ignored.
    pub fn clear(&self) {
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => debug!(path = %self.path.display(), error = %e, "marker cleanup failed"),
        }
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Wait out the grace delay, then check for the marker. The delay
    /// tolerates commands that create the marker asynchronously after the
    /// process itself has already exited or been killed.
    pub fn probe(&self, grace: Duration) -> bool {
        if !grace.is_zero() {
            std::thread::sleep(grace);
        }
        self.exists()
    }
}

impl Default for MarkerFile {
    fn default() -> Self {
        Self::new(DEFAULT_MARKER_PATH)
    }
}
