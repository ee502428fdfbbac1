//! Error types for CRT storage operations.

use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use rusty_multipart_storage::StorageError;
use thiserror::Error;

/// Errors specific to the CRT storage client.
#[derive(Error, Debug)]
pub enum CrtError {
    /// AWS SDK error.
    #[error("AWS SDK error: {message}")]
    SdkError {
        code: Option<String>,
        message: String,
        retryable: bool,
    },

    /// A response lacked a field the client depends on.
    #[error("Response is missing {0}")]
    MissingField(&'static str),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl CrtError {
    /// Capture the service error code and full message of an SDK failure.
    pub(crate) fn from_sdk<E, R>(err: SdkError<E, R>, retryable: bool) -> Self
    where
        E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
        R: std::fmt::Debug + Send + Sync + 'static,
    {
        let retryable: bool =
            retryable || matches!(err, SdkError::TimeoutError(_) | SdkError::DispatchFailure(_));
        CrtError::SdkError {
            code: err.code().map(str::to_string),
            message: DisplayErrorContext(&err).to_string(),
            retryable,
        }
    }

    /// Map onto the storage error taxonomy for a request against `bucket`/`key`.
    pub(crate) fn into_storage_error(self, bucket: &str, key: &str, upload_id: &str) -> StorageError {
        let (code, message, retryable) = match self {
            CrtError::SdkError {
                code: Some(code),
                message,
                retryable,
            } => (code, message, retryable),
            other => return other.into(),
        };

        match code.as_str() {
            "NoSuchUpload" => StorageError::NoSuchUpload {
                bucket: bucket.to_string(),
                key: key.to_string(),
                upload_id: upload_id.to_string(),
            },
            "AccessDenied" => StorageError::AccessDenied {
                bucket: bucket.to_string(),
                key: key.to_string(),
                message,
            },
            "InvalidPart" | "InvalidPartOrder" | "EntityTooSmall" => {
                StorageError::CompletionRejected {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                    message: format!("{}: {}", code, message),
                }
            }
            _ => StorageError::NetworkError { message, retryable },
        }
    }
}

impl From<CrtError> for StorageError {
    fn from(err: CrtError) -> Self {
        match err {
            CrtError::SdkError {
                message, retryable, ..
            } => StorageError::NetworkError { message, retryable },
            CrtError::MissingField(field) => StorageError::Other {
                message: format!("Response is missing {}", field),
            },
            CrtError::ConfigError(message) => StorageError::InvalidConfig { message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sdk_error(code: Option<&str>) -> CrtError {
        CrtError::SdkError {
            code: code.map(str::to_string),
            message: "boom".to_string(),
            retryable: true,
        }
    }

    #[test]
    fn test_no_such_upload_is_classified() {
        let err = sdk_error(Some("NoSuchUpload")).into_storage_error("b", "p/a", "u1");
        assert!(matches!(
            err,
            StorageError::NoSuchUpload { ref upload_id, .. } if upload_id == "u1"
        ));
    }

    #[test]
    fn test_completion_codes_are_rejections() {
        for code in ["InvalidPart", "InvalidPartOrder", "EntityTooSmall"] {
            let err = sdk_error(Some(code)).into_storage_error("b", "p/a", "u1");
            match err {
                StorageError::CompletionRejected { message, .. } => {
                    assert!(message.starts_with(code))
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }
    }

    #[test]
    fn test_access_denied_is_not_retryable() {
        let err = sdk_error(Some("AccessDenied")).into_storage_error("b", "p/a", "u1");
        assert!(matches!(err, StorageError::AccessDenied { .. }));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_unknown_code_keeps_retryable_flag() {
        let err = sdk_error(Some("SlowDown")).into_storage_error("b", "p/a", "u1");
        assert!(err.is_retryable());

        let err = sdk_error(None).into_storage_error("b", "p/a", "u1");
        assert!(matches!(err, StorageError::NetworkError { retryable: true, .. }));
    }

    #[test]
    fn test_missing_field_and_config_conversions() {
        let err: StorageError = CrtError::MissingField("ETag").into();
        assert!(matches!(err, StorageError::Other { ref message } if message.contains("ETag")));

        let err: StorageError = CrtError::ConfigError("no region".to_string()).into();
        assert!(matches!(err, StorageError::InvalidConfig { .. }));
    }
}
