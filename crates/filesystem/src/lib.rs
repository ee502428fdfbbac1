//! File discovery for rusty-multipart.
//!
//! Walks a local directory and produces the `FileManifest` that maps each
//! object key (relative to the upload prefix) to its local file and size.

pub mod error;
pub mod scanner;

pub use error::FileSystemError;
pub use scanner::{scan_directory, FileSystemScanner, ScanOptions};
