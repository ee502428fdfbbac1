//! Resumable multipart uploads for S3-compatible object stores.
//!
//! This crate provides a platform-agnostic layer above a `StorageClient`
//! backend (see `rusty-multipart-storage-crt` for the AWS SDK one):
//!
//! - **UploadReconciler** - finds the multipart uploads left open under a
//!   prefix and aborts duplicate sessions
//! - **PartUploader** - resumes one session from its committed parts,
//!   verifies them against local content, uploads the rest and completes it
//! - **UploadOrchestrator** - runs both for a whole prefix, many sessions at
//!   once
//!
//! # Integrity
//!
//! A committed part whose MD5 no longer matches the local bytes means the
//! file changed since the previous attempt. That surfaces as the fatal
//! `UploadError::IntegrityViolation`; callers are expected to stop the run.

mod error;
mod part_uploader;
mod plan;
mod reconcile;
mod traits;
mod types;
mod upload;

pub use error::{StorageError, UploadError};
pub use part_uploader::{PartUploader, UploadSession};
pub use plan::{expected_part_count, expected_part_length, plan_parts, PartPlan};
pub use reconcile::UploadReconciler;
pub use traits::{CredentialProvider, StorageClient};
pub use types::{
    AwsCredentials, MultipartUploadInfo, PartRecord, PendingUpload, RemotePart, SessionState,
    SessionSummary, StorageSettings, TokenRequest, TransferStatistics, UploadProgress,
};
pub use upload::{UploadOptions, UploadOrchestrator};
