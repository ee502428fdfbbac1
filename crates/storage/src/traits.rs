//! Storage traits/interfaces for multipart operations.

use async_trait::async_trait;

use crate::error::StorageError;
use crate::types::{AwsCredentials, MultipartUploadInfo, PartRecord, RemotePart, TokenRequest};

/// Low-level multipart operations - implemented by each backend.
///
/// A single client instance, with its credentials, is shared by reference
/// between the reconciler and every uploader of a run.
#[async_trait]
pub trait StorageClient: Send + Sync {
    /// List every open multipart upload whose key starts with `prefix`.
    ///
    /// Backends follow pagination until the listing is exhausted. An empty
    /// listing is `Ok(vec![])`.
    async fn list_multipart_uploads(
        &self,
        bucket: &str,
        prefix: &str,
    ) -> Result<Vec<MultipartUploadInfo>, StorageError>;

    /// Abort an open multipart upload, discarding its parts.
    async fn abort_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
    ) -> Result<(), StorageError>;

    /// List the parts committed so far for an upload, in part-number order.
    async fn list_parts(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
    ) -> Result<Vec<RemotePart>, StorageError>;

    /// Upload one part and return the fingerprint (ETag) the service assigned.
    async fn upload_part(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        part_number: u32,
        body: &[u8],
    ) -> Result<String, StorageError>;

    /// Assemble the object from `parts`, which must be sorted by part number.
    async fn complete_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        parts: &[PartRecord],
    ) -> Result<(), StorageError>;
}

/// Source of temporary credentials for a storage client.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Exchange user credentials for temporary storage credentials.
    async fn generate_token(&self, request: &TokenRequest) -> Result<AwsCredentials, StorageError>;
}
