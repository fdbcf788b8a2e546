//! Dataset directory enumeration
//!
//! The dataset is laid out as flat directories: metadata tables next to one
//! directory per session, and heatmap directories holding one archive per
//! session. Enumeration is therefore single-level, sorted by file name so the
//! order never depends on the file system.

use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

/// Directory scanner errors
#[derive(Debug, Error)]
pub enum ScanError {
    /// Specified path does not exist
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// Path exists but is not a directory
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// Entry could not be read
    #[error("Directory access error {0}: {1}")]
    AccessError(PathBuf, String),
}

/// Which entries a listing returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    File,
    Directory,
}

/// Single-level directory scanner
pub struct DirScanner {
    ignore_patterns: Vec<String>,
}

impl DirScanner {
    /// Create new scanner with default ignore patterns
    ///
    /// Ignores desktop metadata files like .DS_Store and Thumbs.db.
    pub fn new() -> Self {
        Self {
            ignore_patterns: vec![".DS_Store".to_string(), "Thumbs.db".to_string()],
        }
    }

    /// All files directly inside `dir`
    pub fn list_files(&self, dir: &Path) -> Result<Vec<PathBuf>, ScanError> {
        self.list(dir, EntryKind::File, None)
    }

    /// Files directly inside `dir` whose name contains `term`
    pub fn list_matching_files(&self, dir: &Path, term: &str) -> Result<Vec<PathBuf>, ScanError> {
        self.list(dir, EntryKind::File, Some(term))
    }

    /// Subdirectories of `dir` whose name contains `term`
    pub fn list_matching_dirs(&self, dir: &Path, term: &str) -> Result<Vec<PathBuf>, ScanError> {
        self.list(dir, EntryKind::Directory, Some(term))
    }

    fn list(
        &self,
        dir: &Path,
        kind: EntryKind,
        term: Option<&str>,
    ) -> Result<Vec<PathBuf>, ScanError> {
        if !dir.exists() {
            return Err(ScanError::PathNotFound(dir.to_path_buf()));
        }

        if !dir.is_dir() {
            return Err(ScanError::NotADirectory(dir.to_path_buf()));
        }

        let walker = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name();

        let mut found = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|e| ScanError::AccessError(dir.to_path_buf(), e.to_string()))?;

            if self.is_ignored(&entry) {
                continue;
            }

            let matches_kind = match kind {
                EntryKind::File => entry.file_type().is_file(),
                EntryKind::Directory => entry.file_type().is_dir(),
            };
            let matches_term = term
                .map(|t| entry.file_name().to_string_lossy().contains(t))
                .unwrap_or(true);

            if matches_kind && matches_term {
                found.push(entry.into_path());
            }
        }

        tracing::trace!(dir = %dir.display(), count = found.len(), "Listed directory");
        Ok(found)
    }

    fn is_ignored(&self, entry: &DirEntry) -> bool {
        let file_name = entry.file_name().to_string_lossy();
        self.ignore_patterns
            .iter()
            .any(|pattern| file_name.contains(pattern.as_str()))
    }
}

impl Default for DirScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// File name up to its first `.`
///
/// `timestamps_transcription.csv` → `timestamps_transcription`,
/// `P102R108387.npy.json` → `P102R108387`.
pub fn base_name(path: &Path) -> Option<String> {
    let file_name = path.file_name()?.to_str()?;
    file_name.split('.').next().map(str::to_string)
}
