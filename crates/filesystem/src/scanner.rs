//! File system scanner producing upload manifests.

use std::path::{Path, PathBuf};

use rusty_multipart_common::{relative_posix_path, to_absolute, FileManifest, FileManifestEntry};
use walkdir::WalkDir;

use crate::error::FileSystemError;

/// Options for scanning a directory.
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Root directory; manifest keys are relative to it.
    pub root: PathBuf,
    /// Whether to follow symlinks (false = skip them).
    pub follow_symlinks: bool,
}

impl ScanOptions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }

    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }
}

/// Builds a `FileManifest` from a directory tree.
#[derive(Debug, Default)]
pub struct FileSystemScanner;

impl FileSystemScanner {
    /// Create a new scanner.
    pub fn new() -> Self {
        Self
    }

    /// Walk `options.root` and record every regular file.
    ///
    /// Keys are POSIX paths relative to the root. Entries that cannot be
    /// read are skipped with a warning rather than failing the scan.
    ///
    /// # Errors
    /// Returns `NotADirectory` if the root is missing or is a file.
    pub fn scan(&self, options: &ScanOptions) -> Result<FileManifest, FileSystemError> {
        let root: &Path = &options.root;
        let metadata = std::fs::metadata(root).map_err(|e| FileSystemError::IoError {
            path: root.display().to_string(),
            source: e,
        })?;
        if !metadata.is_dir() {
            return Err(FileSystemError::NotADirectory {
                path: root.display().to_string(),
            });
        }

        let mut manifest: FileManifest = FileManifest::new();
        let walker = WalkDir::new(root)
            .follow_links(options.follow_symlinks)
            .sort_by_file_name();

        for entry in walker {
            let entry: walkdir::DirEntry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };

            let file_type = entry.file_type();
            if file_type.is_symlink() {
                log::debug!("Skipping symlink {}", entry.path().display());
                continue;
            }
            if !file_type.is_file() {
                continue;
            }

            let size: u64 = match entry.metadata() {
                Ok(m) => m.len(),
                Err(e) => {
                    log::warn!("Skipping {}: {}", entry.path().display(), e);
                    continue;
                }
            };

            let key: String = relative_posix_path(entry.path(), root)?;
            let local_path: PathBuf = to_absolute(entry.path())?;
            manifest.insert(
                key,
                FileManifestEntry::new(local_path.display().to_string(), size),
            );
        }

        log::info!(
            "Scanned {}: {} file(s), {} bytes",
            root.display(),
            manifest.len(),
            manifest.total_bytes()
        );

        Ok(manifest)
    }
}

/// Scan `root` with default options.
pub fn scan_directory(root: impl AsRef<Path>) -> Result<FileManifest, FileSystemError> {
    FileSystemScanner::new().scan(&ScanOptions::new(root.as_ref()))
}
