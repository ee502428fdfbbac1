//! AWS SDK S3 client implementation.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart, MultipartUpload, Part};
use aws_sdk_s3::Client as S3Client;

use rusty_multipart_storage::{
    CredentialProvider, MultipartUploadInfo, PartRecord, RemotePart, StorageClient, StorageError,
    StorageSettings, TokenRequest,
};

use crate::error::CrtError;

/// StorageClient implementation using AWS SDK for Rust.
///
/// Retries, connection pooling and request signing come from the SDK.
pub struct CrtStorageClient {
    /// The underlying S3 client.
    s3_client: S3Client,
    /// Expected bucket owner for security validation.
    expected_bucket_owner: Option<String>,
}

impl CrtStorageClient {
    /// Create a new CRT storage client.
    ///
    /// Static credentials in `settings` take precedence over the default
    /// credential chain. A custom `endpoint_url` switches to path-style
    /// addressing for S3-compatible services.
    ///
    /// # Arguments
    /// * `settings` - Storage settings including region and optional credentials
    pub async fn new(settings: StorageSettings) -> Result<Self, StorageError> {
        if settings.region.trim().is_empty() {
            return Err(CrtError::ConfigError("region must not be empty".to_string()).into());
        }

        let config_loader = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_sdk_s3::config::Region::new(settings.region.clone()));

        let config_loader = if let Some(ref creds) = settings.credentials {
            let credentials = Credentials::new(
                &creds.access_key_id,
                &creds.secret_access_key,
                creds.session_token.clone(),
                None,
                "rusty-multipart",
            );
            config_loader.credentials_provider(credentials)
        } else {
            config_loader
        };

        let config_loader = match settings.endpoint_url {
            Some(ref url) => config_loader.endpoint_url(url),
            None => config_loader,
        };

        let sdk_config = config_loader.load().await;
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(settings.endpoint_url.is_some())
            .build();

        log::debug!(
            "Created S3 client for region {} (endpoint: {})",
            settings.region,
            settings.endpoint_url.as_deref().unwrap_or("default")
        );

        Ok(Self {
            s3_client: S3Client::from_conf(s3_config),
            expected_bucket_owner: settings.expected_bucket_owner,
        })
    }

    /// Create a client whose credentials come from `provider`.
    ///
    /// The token is requested once; the resulting credentials are held for
    /// the client's lifetime and replace any in `settings`.
    pub async fn with_credential_provider(
        mut settings: StorageSettings,
        provider: &dyn CredentialProvider,
        request: &TokenRequest,
    ) -> Result<Self, StorageError> {
        let credentials = provider.generate_token(request).await?;
        log::info!("Obtained temporary credentials from {}", request.service_url);
        settings.credentials = Some(credentials);
        Self::new(settings).await
    }

    /// Create a client from an existing S3Client (for testing).
    ///
    /// # Arguments
    /// * `s3_client` - Pre-configured S3 client
    /// * `expected_bucket_owner` - Optional expected bucket owner
    pub fn from_client(s3_client: S3Client, expected_bucket_owner: Option<String>) -> Self {
        Self {
            s3_client,
            expected_bucket_owner,
        }
    }
}

#[async_trait]
impl StorageClient for CrtStorageClient {
    async fn list_multipart_uploads(
        &self,
        bucket: &str,
        prefix: &str,
    ) -> Result<Vec<MultipartUploadInfo>, StorageError> {
        let mut uploads: Vec<MultipartUploadInfo> = Vec::new();
        let mut key_marker: Option<String> = None;
        let mut upload_id_marker: Option<String> = None;

        loop {
            let response = self
                .s3_client
                .list_multipart_uploads()
                .bucket(bucket)
                .prefix(prefix)
                .set_key_marker(key_marker.take())
                .set_upload_id_marker(upload_id_marker.take())
                .set_expected_bucket_owner(self.expected_bucket_owner.clone())
                .send()
                .await
                .map_err(|err| CrtError::from_sdk(err, true).into_storage_error(bucket, prefix, ""))?;

            for upload in response.uploads() {
                uploads.push(upload_info_from_sdk(upload)?);
            }

            if response.is_truncated() == Some(true) {
                key_marker = response.next_key_marker().map(str::to_string);
                upload_id_marker = response.next_upload_id_marker().map(str::to_string);
                if key_marker.is_none() && upload_id_marker.is_none() {
                    break;
                }
            } else {
                break;
            }
        }

        log::debug!(
            "Listed {} multipart upload(s) under s3://{}/{}",
            uploads.len(),
            bucket,
            prefix
        );
        Ok(uploads)
    }

    async fn abort_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
    ) -> Result<(), StorageError> {
        self.s3_client
            .abort_multipart_upload()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .set_expected_bucket_owner(self.expected_bucket_owner.clone())
            .send()
            .await
            .map_err(|err| CrtError::from_sdk(err, true).into_storage_error(bucket, key, upload_id))?;

        Ok(())
    }

    async fn list_parts(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
    ) -> Result<Vec<RemotePart>, StorageError> {
        let mut parts: Vec<RemotePart> = Vec::new();
        let mut part_number_marker: Option<String> = None;

        loop {
            let response = self
                .s3_client
                .list_parts()
                .bucket(bucket)
                .key(key)
                .upload_id(upload_id)
                .set_part_number_marker(part_number_marker.take())
                .set_expected_bucket_owner(self.expected_bucket_owner.clone())
                .send()
                .await
                .map_err(|err| {
                    CrtError::from_sdk(err, true).into_storage_error(bucket, key, upload_id)
                })?;

            for part in response.parts() {
                parts.push(remote_part_from_sdk(part)?);
            }

            if response.is_truncated() == Some(true) {
                part_number_marker = response.next_part_number_marker().map(str::to_string);
                if part_number_marker.is_none() {
                    break;
                }
            } else {
                break;
            }
        }

        Ok(parts)
    }

    async fn upload_part(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        part_number: u32,
        body: &[u8],
    ) -> Result<String, StorageError> {
        let sdk_part_number: i32 = i32::try_from(part_number).map_err(|_| {
            StorageError::InvalidConfig {
                message: format!("part number {} out of range", part_number),
            }
        })?;

        let response = self
            .s3_client
            .upload_part()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .part_number(sdk_part_number)
            .body(ByteStream::from(body.to_vec()))
            .set_expected_bucket_owner(self.expected_bucket_owner.clone())
            .send()
            .await
            .map_err(|err| CrtError::from_sdk(err, true).into_storage_error(bucket, key, upload_id))?;

        response
            .e_tag()
            .map(str::to_string)
            .ok_or_else(|| CrtError::MissingField("ETag").into())
    }

    async fn complete_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        parts: &[PartRecord],
    ) -> Result<(), StorageError> {
        let completed: CompletedMultipartUpload = completed_upload(parts)?;

        self.s3_client
            .complete_multipart_upload()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .multipart_upload(completed)
            .set_expected_bucket_owner(self.expected_bucket_owner.clone())
            .send()
            .await
            .map_err(|err| {
                CrtError::from_sdk(err, false).into_storage_error(bucket, key, upload_id)
            })?;

        Ok(())
    }
}

/// Convert a listed upload, rejecting records without an id or key.
fn upload_info_from_sdk(upload: &MultipartUpload) -> Result<MultipartUploadInfo, CrtError> {
    let upload_id: &str = upload.upload_id().ok_or(CrtError::MissingField("UploadId"))?;
    let key: &str = upload.key().ok_or(CrtError::MissingField("Key"))?;

    Ok(MultipartUploadInfo {
        upload_id: upload_id.to_string(),
        key: key.to_string(),
        initiated: upload
            .initiated()
            .and_then(|dt| dt.to_millis().ok())
            .map(|ms| ms / 1000),
    })
}

/// Convert a listed part. A missing size is reported as 0.
fn remote_part_from_sdk(part: &Part) -> Result<RemotePart, CrtError> {
    let part_number: u32 = part
        .part_number()
        .and_then(|n| u32::try_from(n).ok())
        .ok_or(CrtError::MissingField("PartNumber"))?;

    Ok(RemotePart {
        part_number,
        e_tag: part.e_tag().map(str::to_string),
        size: part.size().and_then(|s| u64::try_from(s).ok()).unwrap_or(0),
    })
}

fn completed_upload(parts: &[PartRecord]) -> Result<CompletedMultipartUpload, StorageError> {
    let completed: Vec<CompletedPart> = parts
        .iter()
        .map(|p| {
            let part_number: i32 =
                i32::try_from(p.part_number).map_err(|_| StorageError::InvalidConfig {
                    message: format!("part number {} out of range", p.part_number),
                })?;
            Ok(CompletedPart::builder()
                .part_number(part_number)
                .e_tag(&p.e_tag)
                .build())
        })
        .collect::<Result<_, StorageError>>()?;

    Ok(CompletedMultipartUpload::builder()
        .set_parts(Some(completed))
        .build())
}
