//! Reconciliation of open multipart uploads left over from earlier runs.
//!
//! The service may report the same upload more than once (for example after
//! a retried initiation). Every later sighting of a record is aborted before
//! the pass returns. An abort closes the session for every sighting sharing
//! its upload id, so those ids are never returned for resumption.

use std::collections::HashSet;

use crate::error::StorageError;
use crate::traits::StorageClient;
use crate::types::{MultipartUploadInfo, PendingUpload};

/// Finds the uploads under a prefix that should be resumed.
pub struct UploadReconciler<'a, C: StorageClient> {
    client: &'a C,
}

impl<'a, C: StorageClient> UploadReconciler<'a, C> {
    /// Create a reconciler over an authenticated storage client.
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }

    /// List the open uploads under `prefix` and abort duplicate sightings.
    ///
    /// # Arguments
    /// * `bucket` - Bucket to inspect
    /// * `prefix` - Key prefix the uploads were started under
    ///
    /// # Returns
    /// One `PendingUpload` per distinct upload that is still open, in listing
    /// order. Uploads aborted by this pass are not returned. An empty listing
    /// yields an empty vector and aborts nothing.
    ///
    /// # Errors
    /// Listing or abort failures are returned as-is; aborts already issued
    /// are not rolled back.
    pub async fn discover_uploads(
        &self,
        bucket: &str,
        prefix: &str,
    ) -> Result<Vec<PendingUpload>, StorageError> {
        let listing: Vec<MultipartUploadInfo> =
            self.client.list_multipart_uploads(bucket, prefix).await?;

        let (canonical, duplicates) = partition_duplicates(listing);

        for dup in &duplicates {
            log::warn!(
                "Aborting duplicate multipart upload {} for s3://{}/{}",
                dup.upload_id,
                bucket,
                dup.key
            );
            self.client
                .abort_multipart_upload(bucket, &dup.key, &dup.upload_id)
                .await?;
        }

        // Records for one upload id that differ only in metadata are not
        // aborted, but the session is still resumed only once.
        let mut returned_ids: HashSet<String> =
            duplicates.iter().map(|d| d.upload_id.clone()).collect();
        let pending: Vec<PendingUpload> = canonical
            .into_iter()
            .filter(|u| returned_ids.insert(u.upload_id.clone()))
            .map(|u| PendingUpload::new(bucket, u.key, u.upload_id))
            .collect();

        log::info!(
            "Found {} resumable upload(s) under s3://{}/{} ({} duplicated upload(s) aborted)",
            pending.len(),
            bucket,
            prefix,
            duplicates.len()
        );

        Ok(pending)
    }
}

/// Split a listing into first sightings and the duplicates to abort.
///
/// Records are compared by full structural equality. Duplicates are keyed by
/// `(key, upload_id)`, so each one is scheduled for abort only once however
/// often it repeats.
fn partition_duplicates(
    listing: Vec<MultipartUploadInfo>,
) -> (Vec<MultipartUploadInfo>, Vec<MultipartUploadInfo>) {
    let mut seen: HashSet<MultipartUploadInfo> = HashSet::new();
    let mut scheduled: HashSet<(String, String)> = HashSet::new();
    let mut canonical: Vec<MultipartUploadInfo> = Vec::new();
    let mut duplicates: Vec<MultipartUploadInfo> = Vec::new();

    for upload in listing {
        if seen.contains(&upload) {
            if scheduled.insert((upload.key.clone(), upload.upload_id.clone())) {
                duplicates.push(upload);
            }
        } else {
            seen.insert(upload.clone());
            canonical.push(upload);
        }
    }

    (canonical, duplicates)
}
