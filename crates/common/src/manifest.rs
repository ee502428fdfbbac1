//! File manifest handed over by the file-discovery stage.
//!
//! Maps manifest keys (object key relative to the upload prefix) to the local
//! file that backs them. The uploader uses it to find the bytes for a remote
//! multipart session.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ManifestError;

/// Local file backing one object key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileManifestEntry {
    /// Path of the file on local disk.
    pub local_path: String,
    /// File size in bytes at discovery time.
    pub file_size: u64,
}

impl FileManifestEntry {
    pub fn new(local_path: impl Into<String>, file_size: u64) -> Self {
        Self {
            local_path: local_path.into(),
            file_size,
        }
    }
}

/// Mapping of manifest keys to local files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileManifest {
    entries: BTreeMap<String, FileManifestEntry>,
}

impl FileManifest {
    /// Create an empty manifest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the entry for `key`.
    pub fn insert(&mut self, key: impl Into<String>, entry: FileManifestEntry) {
        self.entries.insert(key.into(), entry);
    }

    /// Look up the entry for a manifest key.
    pub fn get(&self, key: &str) -> Option<&FileManifestEntry> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &FileManifestEntry)> {
        self.entries.iter()
    }

    /// Total bytes across all entries.
    pub fn total_bytes(&self) -> u64 {
        self.entries.values().map(|e| e.file_size).sum()
    }

    /// Read a manifest persisted as JSON.
    ///
    /// # Errors
    /// Returns error if the file cannot be read or is not a valid manifest.
    pub fn load_json(path: &Path) -> Result<Self, ManifestError> {
        let data: Vec<u8> = std::fs::read(path).map_err(|source| ManifestError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_slice(&data).map_err(|source| ManifestError::Json {
            path: path.display().to_string(),
            source,
        })
    }

    /// Persist the manifest as pretty-printed JSON.
    ///
    /// # Errors
    /// Returns error if the file cannot be written.
    pub fn save_json(&self, path: &Path) -> Result<(), ManifestError> {
        let data: Vec<u8> =
            serde_json::to_vec_pretty(self).map_err(|source| ManifestError::Json {
                path: path.display().to_string(),
                source,
            })?;
        std::fs::write(path, data).map_err(|source| ManifestError::Io {
            path: path.display().to_string(),
            source,
        })
    }
}

impl FromIterator<(String, FileManifestEntry)> for FileManifest {
    fn from_iter<I: IntoIterator<Item = (String, FileManifestEntry)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
