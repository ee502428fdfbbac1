//! Shared types and utilities for rusty-multipart.
//!
//! This crate provides common functionality used across all rusty-multipart crates:
//! - MD5 part fingerprints and ETag parsing
//! - Object-key and path normalization helpers
//! - The file manifest produced by the discovery stage
//! - Generic progress callback trait
//! - Shared constants and error types

pub mod constants;
pub mod error;
pub mod hash;
pub mod manifest;
pub mod path_utils;
pub mod progress;

// Re-export commonly used items at crate root
pub use constants::*;
pub use error::{ManifestError, PathError};
pub use hash::{etag_fingerprint, hash_bytes, matches_etag, quoted_etag};
pub use manifest::{FileManifest, FileManifestEntry};
pub use path_utils::{
    lexical_normalize, relative_object_key, relative_posix_path, to_absolute,
    to_posix_path,
};
pub use progress::{progress_fn, FnProgress, NoOpProgress, ProgressCallback};
