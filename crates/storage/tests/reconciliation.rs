//! Integration tests for reconciliation of open multipart uploads.

mod support;

use rusty_multipart_storage::{
    MultipartUploadInfo, PendingUpload, StorageError, UploadReconciler,
};
use support::MemoryStorage;

fn record(upload_id: &str, key: &str) -> MultipartUploadInfo {
    MultipartUploadInfo {
        upload_id: upload_id.to_string(),
        key: key.to_string(),
        initiated: Some(1_700_000_000),
    }
}

#[tokio::test]
async fn test_empty_listing_returns_nothing_and_aborts_nothing() {
    let storage = MemoryStorage::new();

    let pending: Vec<PendingUpload> = UploadReconciler::new(&storage)
        .discover_uploads("b", "p")
        .await
        .unwrap();

    assert!(pending.is_empty());
    assert!(storage.aborts().is_empty());
}

#[tokio::test]
async fn test_unique_uploads_are_returned_in_listing_order() {
    let storage = MemoryStorage::new();
    storage.open_upload("p/a.bin", "u1");
    storage.open_upload("p/b.bin", "u2");
    storage.open_upload("other/c.bin", "u3");

    let pending: Vec<PendingUpload> = UploadReconciler::new(&storage)
        .discover_uploads("b", "p")
        .await
        .unwrap();

    assert_eq!(
        pending,
        vec![
            PendingUpload::new("b", "p/a.bin", "u1"),
            PendingUpload::new("b", "p/b.bin", "u2"),
        ]
    );
    assert!(storage.aborts().is_empty());
}

#[tokio::test]
async fn test_duplicated_uploads_are_aborted_once_and_not_returned() {
    let storage = MemoryStorage::new();
    storage.list_record(record("u1", "p/a.bin"));
    storage.list_record(record("u2", "p/b.bin"));
    storage.list_record(record("u1", "p/a.bin"));
    storage.list_record(record("u2", "p/b.bin"));
    storage.list_record(record("u3", "p/c.bin"));

    let pending: Vec<PendingUpload> = UploadReconciler::new(&storage)
        .discover_uploads("b", "p")
        .await
        .unwrap();

    let ids: Vec<&str> = pending.iter().map(|p| p.upload_id.as_str()).collect();
    assert_eq!(ids, vec!["u3"]);

    assert_eq!(
        storage.aborts(),
        vec![
            ("p/a.bin".to_string(), "u1".to_string()),
            ("p/b.bin".to_string(), "u2".to_string()),
        ]
    );
    assert!(!storage.is_open("u1"));
    assert!(!storage.is_open("u2"));
    assert!(storage.is_open("u3"));
}

#[tokio::test]
async fn test_repeated_duplicate_is_aborted_exactly_once() {
    let storage = MemoryStorage::new();
    for _ in 0..4 {
        storage.list_record(record("u1", "p/a.bin"));
    }

    let pending: Vec<PendingUpload> = UploadReconciler::new(&storage)
        .discover_uploads("b", "p")
        .await
        .unwrap();

    assert!(pending.is_empty());
    assert_eq!(storage.aborts().len(), 1);
}

#[tokio::test]
async fn test_same_id_with_different_metadata_is_returned_once_without_abort() {
    let storage = MemoryStorage::new();
    storage.list_record(MultipartUploadInfo {
        initiated: Some(1),
        ..record("u1", "p/a.bin")
    });
    storage.list_record(MultipartUploadInfo {
        initiated: Some(2),
        ..record("u1", "p/a.bin")
    });

    let pending: Vec<PendingUpload> = UploadReconciler::new(&storage)
        .discover_uploads("b", "p")
        .await
        .unwrap();

    assert_eq!(pending, vec![PendingUpload::new("b", "p/a.bin", "u1")]);
    assert!(storage.aborts().is_empty());
}

#[tokio::test]
async fn test_abort_failure_is_propagated() {
    let storage = MemoryStorage::new();
    storage.list_record(record("u1", "p/a.bin"));
    storage.list_record(record("u1", "p/a.bin"));
    storage.fail_aborts();

    let result = UploadReconciler::new(&storage)
        .discover_uploads("b", "p")
        .await;

    assert!(matches!(result, Err(StorageError::AccessDenied { .. })));
}
