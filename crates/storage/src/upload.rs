//! Upload orchestration for resumable multipart sessions.
//!
//! This module provides high-level operations that work with any
//! `StorageClient` implementation. It handles:
//!
//! - Reconciliation of open uploads under a prefix
//! - Resuming each session from its committed parts
//! - Integrity verification of committed parts against local content
//! - Parallel sessions with run-wide cancellation on integrity violations
//! - Progress reporting and cancellation
//!
//! # Example
//!
//! ```ignore
//! use rusty_multipart_storage::{UploadOrchestrator, UploadOptions};
//!
//! let orchestrator = UploadOrchestrator::new(&client, "my-bucket", "submission-42", &manifest)
//!     .with_options(UploadOptions::default().with_max_concurrency(4));
//! match orchestrator.resume_all(None).await {
//!     Ok(stats) => println!("{} sessions completed", stats.sessions_completed),
//!     Err(e) if e.is_fatal() => std::process::exit(e.exit_code().unwrap_or(1)),
//!     Err(e) => return Err(e.into()),
//! }
//! ```

use std::io::SeekFrom;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::stream::{self, StreamExt};
use rusty_multipart_common::{
    FileManifest, FileManifestEntry, ProgressCallback, DEFAULT_PART_SIZE,
    DEFAULT_UPLOAD_CONCURRENCY,
};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use crate::error::{StorageError, UploadError};
use crate::part_uploader::PartUploader;
use crate::plan::{plan_parts, PartPlan};
use crate::reconcile::UploadReconciler;
use crate::traits::StorageClient;
use crate::types::{PendingUpload, SessionSummary, TransferStatistics, UploadProgress};

/// Options for upload operations.
#[derive(Debug, Clone)]
pub struct UploadOptions {
    /// Maximum sessions driven concurrently.
    pub max_concurrency: usize,
    /// Part size for sessions without committed parts.
    pub part_size: u64,
    /// Stop every other session when one hits an integrity violation.
    pub cancel_on_integrity_violation: bool,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_UPLOAD_CONCURRENCY,
            part_size: DEFAULT_PART_SIZE,
            cancel_on_integrity_violation: true,
        }
    }
}

impl UploadOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum concurrency for parallel sessions.
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    /// Set the part size for fresh sessions.
    pub fn with_part_size(mut self, part_size: u64) -> Self {
        self.part_size = part_size;
        self
    }

    /// Choose whether an integrity violation cancels the other sessions.
    pub fn with_cancel_on_integrity_violation(mut self, cancel: bool) -> Self {
        self.cancel_on_integrity_violation = cancel;
        self
    }
}

/// Resumes every open multipart upload under one bucket and prefix.
pub struct UploadOrchestrator<'a, C: StorageClient> {
    /// The storage client for S3 operations.
    client: &'a C,
    bucket: String,
    prefix: String,
    /// Local files by key relative to `prefix`.
    manifest: &'a FileManifest,
    options: UploadOptions,
}

impl<'a, C: StorageClient> UploadOrchestrator<'a, C> {
    /// Create a new upload orchestrator.
    ///
    /// # Arguments
    /// * `client` - Authenticated storage client, shared by every session
    /// * `bucket` - Target bucket
    /// * `prefix` - Key prefix the uploads live under
    /// * `manifest` - Local files from the discovery stage
    pub fn new(
        client: &'a C,
        bucket: impl Into<String>,
        prefix: impl Into<String>,
        manifest: &'a FileManifest,
    ) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            prefix: prefix.into(),
            manifest,
            options: UploadOptions::default(),
        }
    }

    /// Set upload options.
    pub fn with_options(mut self, options: UploadOptions) -> Self {
        self.options = options;
        self
    }

    /// Find the uploads to resume, aborting duplicates.
    pub async fn reconcile(&self) -> Result<Vec<PendingUpload>, StorageError> {
        UploadReconciler::new(self.client)
            .discover_uploads(&self.bucket, &self.prefix)
            .await
    }

    /// Drive one pending upload to completion.
    ///
    /// Every committed part is verified against local content before any new
    /// part is sent, so a modified file stops the session before further
    /// uploads.
    ///
    /// # Arguments
    /// * `pending` - Session to resume
    /// * `progress` - Optional progress callback; returning false cancels
    pub async fn resume_upload(
        &self,
        pending: PendingUpload,
        progress: Option<&dyn ProgressCallback<UploadProgress>>,
    ) -> Result<SessionSummary, UploadError> {
        let never_cancelled = AtomicBool::new(false);
        self.drive_session(pending, progress, &never_cancelled).await
    }

    /// Reconcile, then resume every pending upload.
    ///
    /// Up to `max_concurrency` sessions run at once. When a session hits an
    /// integrity violation and `cancel_on_integrity_violation` is set, the
    /// other sessions stop before their next part.
    ///
    /// # Returns
    /// Aggregated statistics across completed sessions.
    ///
    /// # Errors
    /// An integrity violation takes precedence over any other failure;
    /// otherwise the first failed session's error is returned.
    pub async fn resume_all(
        &self,
        progress: Option<&dyn ProgressCallback<UploadProgress>>,
    ) -> Result<TransferStatistics, UploadError> {
        let pending: Vec<PendingUpload> = self.reconcile().await?;
        if pending.is_empty() {
            return Ok(TransferStatistics::default());
        }

        let cancelled = AtomicBool::new(false);
        let max_concurrency: usize = self.options.max_concurrency.max(1);

        let results: Vec<Result<SessionSummary, UploadError>> = stream::iter(pending)
            .map(|upload| {
                let cancelled: &AtomicBool = &cancelled;
                async move {
                    let key: String = upload.key.clone();
                    let result = self.drive_session(upload, progress, cancelled).await;
                    if let Err(ref e) = result {
                        if e.is_fatal() && self.options.cancel_on_integrity_violation {
                            log::error!("Stopping all sessions: {}", e);
                            cancelled.store(true, Ordering::SeqCst);
                        } else {
                            log::warn!("Session for {} failed: {}", key, e);
                        }
                    }
                    result
                }
            })
            .buffer_unordered(max_concurrency)
            .collect()
            .await;

        let mut stats = TransferStatistics::default();
        let mut first_error: Option<UploadError> = None;
        for result in results {
            match result {
                Ok(summary) => stats.record(&summary),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(stats),
        }
    }

    async fn drive_session(
        &self,
        pending: PendingUpload,
        progress: Option<&dyn ProgressCallback<UploadProgress>>,
        cancelled: &AtomicBool,
    ) -> Result<SessionSummary, UploadError> {
        let mut uploader: PartUploader<'_, C> =
            PartUploader::new(self.client, pending, &self.prefix, self.manifest)?
                .with_part_size(self.options.part_size);
        uploader.load_existing_parts().await?;

        let entry: FileManifestEntry = uploader.entry().clone();
        let (present, missing): (Vec<PartPlan>, Vec<PartPlan>) =
            plan_parts(entry.file_size, uploader.chunk_size())
                .into_iter()
                .partition(|plan| uploader.part(plan.part_number).is_some());

        let mut summary = SessionSummary {
            key: uploader.pending().key.clone(),
            upload_id: uploader.pending().upload_id.clone(),
            parts_verified: 0,
            parts_uploaded: 0,
            bytes_verified: 0,
            bytes_uploaded: 0,
        };

        let mut file: File = File::open(&entry.local_path)
            .await
            .map_err(|e| UploadError::io(&entry.local_path, e))?;

        for plan in &present {
            check_cancelled(cancelled)?;
            let data: Vec<u8> = read_part(&mut file, &entry.local_path, plan).await?;
            if let Some(record) = uploader.part(plan.part_number) {
                uploader.verify_chunk_integrity(record, &data)?;
            }
            summary.parts_verified += 1;
            summary.bytes_verified += plan.length;
            report(progress, &uploader, plan.part_number)?;
        }

        for plan in &missing {
            check_cancelled(cancelled)?;
            let data: Vec<u8> = read_part(&mut file, &entry.local_path, plan).await?;
            uploader.upload_part(&data, plan.part_number).await?;
            summary.parts_uploaded += 1;
            summary.bytes_uploaded += plan.length;
            report(progress, &uploader, plan.part_number)?;
        }

        check_cancelled(cancelled)?;
        uploader.complete().await?;

        Ok(summary)
    }
}

fn check_cancelled(cancelled: &AtomicBool) -> Result<(), UploadError> {
    if cancelled.load(Ordering::SeqCst) {
        Err(UploadError::Cancelled)
    } else {
        Ok(())
    }
}

fn report<C: StorageClient>(
    progress: Option<&dyn ProgressCallback<UploadProgress>>,
    uploader: &PartUploader<'_, C>,
    part_number: u32,
) -> Result<(), UploadError> {
    let Some(cb) = progress else {
        return Ok(());
    };
    let update = UploadProgress {
        key: uploader.pending().key.clone(),
        part_number,
        session_bytes: uploader.completed_bytes(),
        session_total: uploader.entry().file_size,
    };
    if cb.on_progress(&update) {
        Ok(())
    } else {
        Err(UploadError::Cancelled)
    }
}

/// Read the byte range of one part from the local file.
async fn read_part(file: &mut File, path: &str, plan: &PartPlan) -> Result<Vec<u8>, UploadError> {
    file.seek(SeekFrom::Start(plan.offset))
        .await
        .map_err(|e| UploadError::io(path, e))?;

    let mut buffer: Vec<u8> = vec![0u8; plan.length as usize];
    file.read_exact(&mut buffer)
        .await
        .map_err(|e| UploadError::io(path, e))?;

    Ok(buffer)
}
