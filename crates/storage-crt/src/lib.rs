//! AWS SDK S3 backend for rusty-multipart storage.
//!
//! This crate provides a `StorageClient` implementation using the AWS SDK for Rust.
//! It covers the multipart operations needed to reconcile and resume uploads.
//!
//! # Example
//!
//! ```ignore
//! use rusty_multipart_storage_crt::CrtStorageClient;
//! use rusty_multipart_storage::{StorageSettings, UploadOrchestrator};
//!
//! let settings = StorageSettings::default();
//! let client = CrtStorageClient::new(settings).await?;
//!
//! let orchestrator = UploadOrchestrator::new(&client, "my-bucket", "submission-42", &manifest);
//! let stats = orchestrator.resume_all(None).await?;
//! ```

mod client;
mod error;

pub use client::CrtStorageClient;
pub use error::CrtError;
