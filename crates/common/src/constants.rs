//! Shared constants used across rusty-multipart crates.

/// Default part size for sessions with no committed parts yet (8MB).
pub const DEFAULT_PART_SIZE: u64 = 8 * 1024 * 1024;

/// Highest part number S3 accepts within one multipart upload.
pub const MAX_PART_NUMBER: u32 = 10_000;

/// Default number of upload sessions driven concurrently.
pub const DEFAULT_UPLOAD_CONCURRENCY: usize = 10;

/// Exit code for a run stopped by a data-integrity violation (128 + SIGTERM).
pub const INTEGRITY_VIOLATION_EXIT_CODE: i32 = 128 + 15;
