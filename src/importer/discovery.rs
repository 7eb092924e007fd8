//! File discovery for building exports and weather files
//!
//! Walks a data root recursively and collects regular files whose extension
//! matches a requested suffix exactly (case-sensitive).

use crate::error::{DataError, Result};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// File discovery component for a data root
#[derive(Debug, Clone)]
pub struct FileDiscovery {
    root: PathBuf,
}

impl FileDiscovery {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Discover all files below the root with the given extension
    ///
    /// Files are returned in the order the directory walk yields them; no
    /// sorting is applied.
    pub fn discover(&self, extension: &str) -> Result<Vec<PathBuf>> {
        if !self.root.is_dir() {
            return Err(DataError::DataDirectoryNotFound {
                path: self.root.clone(),
            });
        }

        debug!(
            "Searching for *.{} files in: {}",
            extension,
            self.root.display()
        );

        let mut files = Vec::new();
        for entry in WalkDir::new(&self.root) {
            let entry = entry?;
            if entry.file_type().is_file() && has_extension(entry.path(), extension) {
                files.push(entry.into_path());
            }
        }

        debug!("Found {} *.{} files", files.len(), extension);
        Ok(files)
    }
}

/// Check whether a path carries exactly the given extension
fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension().is_some_and(|ext| ext == extension)
}
