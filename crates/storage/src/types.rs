//! Shared data structures for multipart operations.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Configuration settings for storage backends.
#[derive(Debug, Clone)]
pub struct StorageSettings {
    /// AWS region.
    pub region: String,
    /// Static credentials; the default provider chain is used when absent.
    pub credentials: Option<AwsCredentials>,
    /// Custom endpoint for S3-compatible services.
    pub endpoint_url: Option<String>,
    /// Expected bucket owner for security validation.
    pub expected_bucket_owner: Option<String>,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            region: "us-east-1".into(),
            credentials: None,
            endpoint_url: None,
            expected_bucket_owner: None,
        }
    }
}

/// Temporary AWS credentials (access key, secret key, session token).
#[derive(Clone)]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Request for temporary credentials from a token service.
#[derive(Clone)]
pub struct TokenRequest {
    /// Token service URL.
    pub service_url: String,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for TokenRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenRequest")
            .field("service_url", &self.service_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// One record from a multipart upload listing, as the service reported it.
///
/// Two records are the same sighting only if every field is equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MultipartUploadInfo {
    pub upload_id: String,
    pub key: String,
    /// Initiation time (Unix epoch seconds), when reported.
    pub initiated: Option<i64>,
}

/// A multipart session the storage service currently has open.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PendingUpload {
    pub upload_id: String,
    pub key: String,
    pub bucket: String,
}

impl PendingUpload {
    pub fn new(
        bucket: impl Into<String>,
        key: impl Into<String>,
        upload_id: impl Into<String>,
    ) -> Self {
        Self {
            upload_id: upload_id.into(),
            key: key.into(),
            bucket: bucket.into(),
        }
    }
}

/// One record from a part listing. `e_tag` may be missing for parts the
/// service has not finished recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemotePart {
    pub part_number: u32,
    pub e_tag: Option<String>,
    pub size: u64,
}

/// A committed chunk of a multipart upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartRecord {
    /// 1-based part number.
    pub part_number: u32,
    /// Fingerprint returned by the service (quoted MD5 for S3).
    pub e_tag: String,
    /// Part length in bytes.
    pub size: u64,
}

/// Lifecycle of one upload session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Existing parts not loaded yet.
    Uninitialized,
    /// Loaded; the service had no usable parts.
    Empty,
    /// Loaded; at least one usable part was already committed.
    Resumed,
    /// Completion requested but not confirmed.
    Completing,
    /// Object assembled; terminal.
    Done,
}

impl SessionState {
    /// Whether existing parts have been loaded and the session is still open.
    pub fn is_open(self) -> bool {
        matches!(self, SessionState::Empty | SessionState::Resumed)
    }
}

/// Progress update for one session.
#[derive(Debug, Clone)]
pub struct UploadProgress {
    /// Object key of the session.
    pub key: String,
    /// Part that was just verified or uploaded.
    pub part_number: u32,
    /// Bytes accounted for in this session so far.
    pub session_bytes: u64,
    /// Total bytes of this session's file.
    pub session_total: u64,
}

/// Outcome of driving one session to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub key: String,
    pub upload_id: String,
    /// Parts already committed and verified against local content.
    pub parts_verified: u32,
    /// Parts uploaded in this run.
    pub parts_uploaded: u32,
    pub bytes_verified: u64,
    pub bytes_uploaded: u64,
}

/// Aggregated statistics for a run over many sessions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferStatistics {
    pub sessions_completed: u64,
    pub parts_verified: u64,
    pub parts_uploaded: u64,
    pub bytes_verified: u64,
    pub bytes_uploaded: u64,
}

impl TransferStatistics {
    /// Fold a completed session into the totals.
    pub fn record(&mut self, summary: &SessionSummary) {
        self.sessions_completed += 1;
        self.parts_verified += u64::from(summary.parts_verified);
        self.parts_uploaded += u64::from(summary.parts_uploaded);
        self.bytes_verified += summary.bytes_verified;
        self.bytes_uploaded += summary.bytes_uploaded;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_statistics_record() {
        let mut stats = TransferStatistics::default();
        stats.record(&SessionSummary {
            key: "p/a".into(),
            upload_id: "u1".into(),
            parts_verified: 1,
            parts_uploaded: 2,
            bytes_verified: 5,
            bytes_uploaded: 10,
        });
        stats.record(&SessionSummary {
            key: "p/b".into(),
            upload_id: "u2".into(),
            parts_verified: 0,
            parts_uploaded: 1,
            bytes_verified: 0,
            bytes_uploaded: 3,
        });

        assert_eq!(stats.sessions_completed, 2);
        assert_eq!(stats.parts_verified, 1);
        assert_eq!(stats.parts_uploaded, 3);
        assert_eq!(stats.bytes_uploaded, 13);
    }

    #[test]
    fn test_credentials_debug_redacts_secrets() {
        let creds = AwsCredentials {
            access_key_id: "AKIA".into(),
            secret_access_key: "very-secret".into(),
            session_token: Some("token".into()),
        };
        let printed: String = format!("{:?}", creds);
        assert!(printed.contains("AKIA"));
        assert!(!printed.contains("very-secret"));
        assert!(!printed.contains("\"token\""));
    }

    #[test]
    fn test_session_state_is_open() {
        assert!(!SessionState::Uninitialized.is_open());
        assert!(SessionState::Empty.is_open());
        assert!(SessionState::Resumed.is_open());
        assert!(!SessionState::Done.is_open());
    }
}
