//! Error types for storage and upload operations.

use rusty_multipart_common::INTEGRITY_VIOLATION_EXIT_CODE;
use thiserror::Error;

use crate::types::SessionState;

/// Errors reported by a storage-service backend.
#[derive(Error, Debug, Clone)]
pub enum StorageError {
    /// The multipart session no longer exists (aborted or already completed).
    #[error("No such upload {upload_id} for s3://{bucket}/{key}")]
    NoSuchUpload {
        bucket: String,
        key: String,
        upload_id: String,
    },

    /// Access denied.
    #[error("Access denied to s3://{bucket}/{key}: {message}")]
    AccessDenied {
        bucket: String,
        key: String,
        message: String,
    },

    /// The service refused to assemble the object from the supplied parts.
    #[error("Completion rejected for s3://{bucket}/{key}: {message}")]
    CompletionRejected {
        bucket: String,
        key: String,
        message: String,
    },

    /// Network error.
    #[error("Network error: {message}")]
    NetworkError { message: String, retryable: bool },

    /// Local I/O error.
    #[error("I/O error for {path}: {message}")]
    IoError { path: String, message: String },

    /// Operation cancelled by user.
    #[error("Operation cancelled")]
    Cancelled,

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Other error.
    #[error("{message}")]
    Other { message: String },
}

impl StorageError {
    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            StorageError::NetworkError { retryable, .. } => *retryable,
            StorageError::NoSuchUpload { .. } => false,
            StorageError::AccessDenied { .. } => false,
            StorageError::CompletionRejected { .. } => false,
            StorageError::IoError { .. } => false,
            StorageError::Cancelled => false,
            StorageError::InvalidConfig { .. } => false,
            StorageError::Other { .. } => false,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::IoError {
            path: String::new(),
            message: err.to_string(),
        }
    }
}

/// Errors driving a single multipart session.
#[derive(Error, Debug, Clone)]
pub enum UploadError {
    /// Local content no longer matches a part committed in a previous attempt.
    ///
    /// Fatal for the whole run: the input data is not safe to keep using.
    #[error(
        "The file for {key} seems to be modified since previous upload attempt \
         (part {part_number}: md5 {actual} does not match {expected})"
    )]
    IntegrityViolation {
        key: String,
        part_number: u32,
        expected: String,
        actual: String,
    },

    /// Remote parts contradict the uniform chunk-size layout.
    #[error("Inconsistent parts for {key}: {message}")]
    InconsistentParts { key: String, message: String },

    #[error("Invalid part number {part_number} (must be 1..={max})")]
    InvalidPartNumber { part_number: u32, max: u32 },

    #[error("Part {part_number} already recorded for {key}")]
    DuplicatePart { key: String, part_number: u32 },

    #[error("Cannot {operation} while session is {state:?}")]
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },

    /// The file needs more parts than the service accepts at this chunk size.
    #[error("{key} needs {required} parts of {chunk_size} bytes (at most {max} allowed)")]
    TooManyParts {
        key: String,
        required: u64,
        chunk_size: u64,
        max: u32,
    },

    /// Local bookkeeping shows the file is not fully covered; completion was
    /// not attempted.
    #[error(
        "Upload of {key} is incomplete: missing parts {missing:?}, \
         {covered_bytes} of {file_size} bytes covered"
    )]
    IncompleteUpload {
        key: String,
        missing: Vec<u32>,
        covered_bytes: u64,
        file_size: u64,
    },

    #[error("No local file for object key {key}")]
    ManifestEntryNotFound { key: String },

    #[error("I/O error for {path}: {message}")]
    Io { path: String, message: String },

    #[error("Operation cancelled")]
    Cancelled,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl UploadError {
    /// Whether this error must stop every session in the run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, UploadError::IntegrityViolation { .. })
    }

    /// Process exit code for errors that terminate the run.
    ///
    /// Only integrity violations carry one.
    pub fn exit_code(&self) -> Option<i32> {
        self.is_fatal().then_some(INTEGRITY_VIOLATION_EXIT_CODE)
    }

    pub(crate) fn io(path: &str, err: std::io::Error) -> Self {
        UploadError::Io {
            path: path.to_string(),
            message: err.to_string(),
        }
    }
}
