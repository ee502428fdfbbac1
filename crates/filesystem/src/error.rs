//! Error types for file discovery.

use rusty_multipart_common::PathError;
use thiserror::Error;

/// Errors raised while building a manifest from the local file system.
#[derive(Debug, Error)]
pub enum FileSystemError {
    /// The scan root does not exist or is not a directory.
    #[error("Not a directory: {path}")]
    NotADirectory { path: String },

    /// A path could not be expressed relative to the scan root.
    #[error(transparent)]
    Path(#[from] PathError),

    /// IO error while walking the tree.
    #[error("IO error at {path}: {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
