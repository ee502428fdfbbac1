//! In-memory storage service used by the integration tests.
//!
//! Emulates the S3 multipart behaviour the uploader relies on: quoted MD5
//! ETags, completion only when the supplied parts match the recorded ones,
//! and sessions that disappear once aborted or completed.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use rusty_multipart_common::{hash_bytes, quoted_etag};
use rusty_multipart_storage::{
    MultipartUploadInfo, PartRecord, RemotePart, StorageClient, StorageError,
};

/// A call received by the in-memory service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListUploads { prefix: String },
    Abort { key: String, upload_id: String },
    ListParts { upload_id: String },
    UploadPart { upload_id: String, part_number: u32 },
    Complete { upload_id: String, part_numbers: Vec<u32> },
}

#[derive(Debug, Default)]
struct State {
    /// Listing as the service reports it, duplicates included.
    listing: Vec<MultipartUploadInfo>,
    /// Open sessions: upload id to key.
    open: HashMap<String, String>,
    parts: HashMap<String, BTreeMap<u32, RemotePart>>,
    bodies: HashMap<(String, u32), Vec<u8>>,
    objects: HashMap<String, Vec<u8>>,
    calls: Vec<Call>,
    fail_aborts: bool,
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    state: Mutex<State>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a session and add it to the listing.
    pub fn open_upload(&self, key: &str, upload_id: &str) {
        self.list_record(MultipartUploadInfo {
            upload_id: upload_id.to_string(),
            key: key.to_string(),
            initiated: Some(1_700_000_000),
        });
    }

    /// Append a raw listing record, opening its session.
    pub fn list_record(&self, info: MultipartUploadInfo) {
        let mut state = self.state.lock().unwrap();
        state.open.insert(info.upload_id.clone(), info.key.clone());
        state.listing.push(info);
    }

    /// Record a committed part whose ETag is the MD5 of `body`.
    pub fn commit_part(&self, upload_id: &str, part_number: u32, body: &[u8]) {
        let e_tag: String = quoted_etag(&hash_bytes(body));
        self.commit_raw_part(upload_id, part_number, Some(&e_tag), body.len() as u64);
        self.state
            .lock()
            .unwrap()
            .bodies
            .insert((upload_id.to_string(), part_number), body.to_vec());
    }

    /// Record a part with an arbitrary ETag and size.
    pub fn commit_raw_part(&self, upload_id: &str, part_number: u32, e_tag: Option<&str>, size: u64) {
        self.state
            .lock()
            .unwrap()
            .parts
            .entry(upload_id.to_string())
            .or_default()
            .insert(
                part_number,
                RemotePart {
                    part_number,
                    e_tag: e_tag.map(str::to_string),
                    size,
                },
            );
    }

    pub fn fail_aborts(&self) {
        self.state.lock().unwrap().fail_aborts = true;
    }

    pub fn object(&self, key: &str) -> Option<Vec<u8>> {
        self.state.lock().unwrap().objects.get(key).cloned()
    }

    pub fn is_open(&self, upload_id: &str) -> bool {
        self.state.lock().unwrap().open.contains_key(upload_id)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn aborts(&self) -> Vec<(String, String)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Abort { key, upload_id } => Some((key, upload_id)),
                _ => None,
            })
            .collect()
    }

    pub fn uploaded_parts(&self, upload_id: &str) -> Vec<u32> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::UploadPart {
                    upload_id: id,
                    part_number,
                } if id == upload_id => Some(part_number),
                _ => None,
            })
            .collect()
    }

    pub fn completions(&self) -> Vec<(String, Vec<u32>)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Complete {
                    upload_id,
                    part_numbers,
                } => Some((upload_id, part_numbers)),
                _ => None,
            })
            .collect()
    }

    fn no_such_upload(bucket: &str, key: &str, upload_id: &str) -> StorageError {
        StorageError::NoSuchUpload {
            bucket: bucket.to_string(),
            key: key.to_string(),
            upload_id: upload_id.to_string(),
        }
    }
}

#[async_trait]
impl StorageClient for MemoryStorage {
    async fn list_multipart_uploads(
        &self,
        _bucket: &str,
        prefix: &str,
    ) -> Result<Vec<MultipartUploadInfo>, StorageError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::ListUploads {
            prefix: prefix.to_string(),
        });
        Ok(state
            .listing
            .iter()
            .filter(|u| u.key.starts_with(prefix) && state.open.contains_key(&u.upload_id))
            .cloned()
            .collect())
    }

    async fn abort_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
    ) -> Result<(), StorageError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Abort {
            key: key.to_string(),
            upload_id: upload_id.to_string(),
        });
        if state.fail_aborts {
            return Err(StorageError::AccessDenied {
                bucket: bucket.to_string(),
                key: key.to_string(),
                message: "abort not permitted".to_string(),
            });
        }
        state
            .open
            .remove(upload_id)
            .map(|_| ())
            .ok_or_else(|| Self::no_such_upload(bucket, key, upload_id))
    }

    async fn list_parts(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
    ) -> Result<Vec<RemotePart>, StorageError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::ListParts {
            upload_id: upload_id.to_string(),
        });
        if !state.open.contains_key(upload_id) {
            return Err(Self::no_such_upload(bucket, key, upload_id));
        }
        Ok(state
            .parts
            .get(upload_id)
            .map(|parts| parts.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn upload_part(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        part_number: u32,
        body: &[u8],
    ) -> Result<String, StorageError> {
        let e_tag: String = quoted_etag(&hash_bytes(body));
        {
            let mut state = self.state.lock().unwrap();
            state.calls.push(Call::UploadPart {
                upload_id: upload_id.to_string(),
                part_number,
            });
            if !state.open.contains_key(upload_id) {
                return Err(Self::no_such_upload(bucket, key, upload_id));
            }
            state
                .bodies
                .insert((upload_id.to_string(), part_number), body.to_vec());
        }
        self.commit_raw_part(upload_id, part_number, Some(&e_tag), body.len() as u64);
        Ok(e_tag)
    }

    async fn complete_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        parts: &[PartRecord],
    ) -> Result<(), StorageError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Complete {
            upload_id: upload_id.to_string(),
            part_numbers: parts.iter().map(|p| p.part_number).collect(),
        });
        if !state.open.contains_key(upload_id) {
            return Err(Self::no_such_upload(bucket, key, upload_id));
        }

        let recorded: Vec<(u32, Option<String>)> = state
            .parts
            .get(upload_id)
            .map(|parts| {
                parts
                    .values()
                    .map(|p| (p.part_number, p.e_tag.clone()))
                    .collect()
            })
            .unwrap_or_default();
        let supplied: Vec<(u32, Option<String>)> = parts
            .iter()
            .map(|p| (p.part_number, Some(p.e_tag.clone())))
            .collect();
        if recorded != supplied {
            return Err(StorageError::CompletionRejected {
                bucket: bucket.to_string(),
                key: key.to_string(),
                message: format!("InvalidPart: recorded {:?}, supplied {:?}", recorded, supplied),
            });
        }

        let mut object: Vec<u8> = Vec::new();
        for part in parts {
            if let Some(body) = state.bodies.get(&(upload_id.to_string(), part.part_number)) {
                object.extend_from_slice(body);
            }
        }
        state.open.remove(upload_id);
        state.objects.insert(key.to_string(), object);
        Ok(())
    }
}
