//! Driving a single multipart session to completion.
//!
//! A `PartUploader` owns one `UploadSession`. It first loads the parts the
//! service already committed (possibly in an earlier run), then accepts new
//! parts, and finally asks the service to assemble the object.
//!
//! ```text
//! Uninitialized --load_existing_parts--> Empty | Resumed
//!     --upload_part*--> --complete--> Completing --> Done
//! ```
//!
//! On resume the chunk size is taken from the first listed part. All parts
//! except the last must have that size; a listing that breaks this layout is
//! rejected instead of being trusted for offset arithmetic.

use std::collections::BTreeSet;

use rusty_multipart_common::{
    etag_fingerprint, hash_bytes, matches_etag, relative_object_key, FileManifest, FileManifestEntry,
    DEFAULT_PART_SIZE, MAX_PART_NUMBER,
};

use crate::error::{StorageError, UploadError};
use crate::plan::{expected_part_count, expected_part_length};
use crate::traits::StorageClient;
use crate::types::{PartRecord, PendingUpload, RemotePart, SessionState};

/// Mutable state of one multipart session.
#[derive(Debug, Clone)]
pub struct UploadSession {
    pending: PendingUpload,
    entry: FileManifestEntry,
    /// Parts in the order they were confirmed.
    parts: Vec<PartRecord>,
    completed_parts: BTreeSet<u32>,
    completed_bytes: u64,
    chunk_size: u64,
    state: SessionState,
}

/// Resumes and completes one pending multipart upload.
pub struct PartUploader<'a, C: StorageClient> {
    client: &'a C,
    session: UploadSession,
}

impl<'a, C: StorageClient> PartUploader<'a, C> {
    /// Create an uploader for `pending`.
    ///
    /// # Arguments
    /// * `client` - Authenticated storage client
    /// * `pending` - Open session to drive
    /// * `prefix` - Key prefix the session was listed under
    /// * `manifest` - Local files by key relative to `prefix`
    ///
    /// # Errors
    /// Returns `ManifestEntryNotFound` if no local file backs the object key.
    pub fn new(
        client: &'a C,
        pending: PendingUpload,
        prefix: &str,
        manifest: &FileManifest,
    ) -> Result<Self, UploadError> {
        let relative: &str = relative_object_key(&pending.key, prefix);
        let entry: FileManifestEntry = manifest
            .get(relative)
            .cloned()
            .ok_or_else(|| UploadError::ManifestEntryNotFound {
                key: pending.key.clone(),
            })?;

        Ok(Self::with_entry(client, pending, entry))
    }

    /// Create an uploader with an already-resolved local file.
    pub fn with_entry(client: &'a C, pending: PendingUpload, entry: FileManifestEntry) -> Self {
        Self {
            client,
            session: UploadSession {
                pending,
                entry,
                parts: Vec::new(),
                completed_parts: BTreeSet::new(),
                completed_bytes: 0,
                chunk_size: DEFAULT_PART_SIZE,
                state: SessionState::Uninitialized,
            },
        }
    }

    /// Set the part size used when the service has no parts for this session.
    ///
    /// Ignored once existing parts are loaded from a resumed session.
    pub fn with_part_size(mut self, part_size: u64) -> Self {
        self.session.chunk_size = part_size;
        self
    }

    /// Load the parts the service has already committed for this session.
    ///
    /// Parts reported without an ETag are skipped. `completed_bytes` becomes
    /// the total size of the usable parts.
    ///
    /// # Errors
    /// - `InvalidState` if called more than once
    /// - `InconsistentParts` if the listing contradicts the chunk layout
    /// - `TooManyParts` if the file needs more than `MAX_PART_NUMBER` parts
    ///   at the chunk size in effect
    /// - `Storage` if the listing fails
    pub async fn load_existing_parts(&mut self) -> Result<(), UploadError> {
        self.require_state("load existing parts", |s| s == SessionState::Uninitialized)?;

        let pending: &PendingUpload = &self.session.pending;
        let listed: Vec<RemotePart> = self
            .client
            .list_parts(&pending.bucket, &pending.key, &pending.upload_id)
            .await?;

        let file_size: u64 = self.session.entry.file_size;
        // Parts without an ETag are unusable and do not define the layout.
        if let Some(first) = listed.iter().find(|p| p.e_tag.is_some()) {
            // A zero-length first part is only meaningful for an empty file.
            if first.size == 0 && file_size > 0 {
                return Err(self.inconsistent(format!(
                    "first listed part {} has size 0",
                    first.part_number
                )));
            }
            if first.size > 0 {
                self.session.chunk_size = first.size;
            }
        }
        if self.session.chunk_size == 0 {
            return Err(StorageError::InvalidConfig {
                message: "part size must be non-zero".to_string(),
            }
            .into());
        }

        let required: u64 = expected_part_count(file_size, self.session.chunk_size);
        if required > u64::from(MAX_PART_NUMBER) {
            return Err(UploadError::TooManyParts {
                key: self.session.pending.key.clone(),
                required,
                chunk_size: self.session.chunk_size,
                max: MAX_PART_NUMBER,
            });
        }

        for part in listed {
            let Some(e_tag) = part.e_tag else {
                log::debug!(
                    "Skipping part {} of {} without ETag",
                    part.part_number,
                    self.session.pending.key
                );
                continue;
            };

            let expected: Option<u64> =
                expected_part_length(file_size, self.session.chunk_size, part.part_number);
            if expected != Some(part.size) {
                return Err(self.inconsistent(format!(
                    "part {} has size {}, expected {:?} for a {} byte file in {} byte chunks",
                    part.part_number, part.size, expected, file_size, self.session.chunk_size
                )));
            }

            if !self.session.completed_parts.insert(part.part_number) {
                continue;
            }
            self.session.completed_bytes += part.size;
            self.session.parts.push(PartRecord {
                part_number: part.part_number,
                e_tag,
                size: part.size,
            });
        }

        self.session.state = if self.session.parts.is_empty() {
            SessionState::Empty
        } else {
            SessionState::Resumed
        };

        log::info!(
            "Loaded {} existing part(s) ({} bytes, chunk size {}) for {}",
            self.session.parts.len(),
            self.session.completed_bytes,
            self.session.chunk_size,
            self.session.pending.key
        );

        Ok(())
    }

    /// Check that `local_chunk` still matches a previously committed part.
    ///
    /// # Errors
    /// Returns the fatal `IntegrityViolation` when the MD5 of `local_chunk`
    /// differs from the fingerprint embedded in the part's ETag.
    pub fn verify_chunk_integrity(
        &self,
        part: &PartRecord,
        local_chunk: &[u8],
    ) -> Result<(), UploadError> {
        self.require_state("verify a part", SessionState::is_open)?;

        if matches_etag(&part.e_tag, local_chunk) {
            return Ok(());
        }

        let expected: &str = etag_fingerprint(&part.e_tag);
        let actual: String = hash_bytes(local_chunk);
        log::error!(
            "Part {} of {} changed since the previous upload attempt (md5 {} != {})",
            part.part_number,
            self.session.pending.key,
            actual,
            expected
        );
        Err(UploadError::IntegrityViolation {
            key: self.session.pending.key.clone(),
            part_number: part.part_number,
            expected: expected.to_string(),
            actual,
        })
    }

    /// Upload `chunk` as part `part_number` and record the returned ETag.
    ///
    /// # Errors
    /// - `InvalidPartNumber` outside `1..=10000`
    /// - `DuplicatePart` if the part is already recorded
    /// - `Storage` if the service rejects the part
    pub async fn upload_part(&mut self, chunk: &[u8], part_number: u32) -> Result<(), UploadError> {
        self.require_state("upload a part", SessionState::is_open)?;

        if part_number == 0 || part_number > MAX_PART_NUMBER {
            return Err(UploadError::InvalidPartNumber {
                part_number,
                max: MAX_PART_NUMBER,
            });
        }
        if self.session.completed_parts.contains(&part_number) {
            return Err(UploadError::DuplicatePart {
                key: self.session.pending.key.clone(),
                part_number,
            });
        }

        let pending: &PendingUpload = &self.session.pending;
        let e_tag: String = self
            .client
            .upload_part(
                &pending.bucket,
                &pending.key,
                &pending.upload_id,
                part_number,
                chunk,
            )
            .await?;

        log::debug!(
            "Uploaded part {} ({} bytes) of {}",
            part_number,
            chunk.len(),
            pending.key
        );

        self.session.completed_parts.insert(part_number);
        self.session.completed_bytes += chunk.len() as u64;
        self.session.parts.push(PartRecord {
            part_number,
            e_tag,
            size: chunk.len() as u64,
        });

        Ok(())
    }

    /// Ask the service to assemble the object from every recorded part.
    ///
    /// Parts are sent sorted by part number. The call is not idempotent: a
    /// completed session cannot be completed again.
    ///
    /// # Errors
    /// - `IncompleteUpload` if part numbers have gaps or the file is not
    ///   fully covered (no service call is made)
    /// - `Storage` if the service rejects the part list
    pub async fn complete(&mut self) -> Result<(), UploadError> {
        self.require_state("complete", |s| s.is_open() || s == SessionState::Completing)?;

        let missing: Vec<u32> = self.missing_parts();
        let covered_bytes: u64 = self.session.completed_bytes;
        let file_size: u64 = self.session.entry.file_size;
        if !missing.is_empty() || covered_bytes != file_size {
            return Err(UploadError::IncompleteUpload {
                key: self.session.pending.key.clone(),
                missing,
                covered_bytes,
                file_size,
            });
        }

        self.session.state = SessionState::Completing;

        let mut ordered: Vec<PartRecord> = self.session.parts.clone();
        ordered.sort_by_key(|p| p.part_number);

        let pending: &PendingUpload = &self.session.pending;
        self.client
            .complete_multipart_upload(&pending.bucket, &pending.key, &pending.upload_id, &ordered)
            .await?;

        self.session.state = SessionState::Done;
        log::info!(
            "Completed s3://{}/{} from {} part(s)",
            pending.bucket,
            pending.key,
            ordered.len()
        );

        Ok(())
    }

    /// Part numbers still needed before the session can complete.
    pub fn missing_parts(&self) -> Vec<u32> {
        let highest: u64 = self
            .session
            .completed_parts
            .last()
            .map(|n| u64::from(*n))
            .unwrap_or(0);
        let expected: u64 =
            expected_part_count(self.session.entry.file_size, self.session.chunk_size)
                .max(highest);

        (1..=expected.min(u64::from(MAX_PART_NUMBER)) as u32)
            .filter(|n| !self.session.completed_parts.contains(n))
            .collect()
    }

    /// Recorded part with the given number, if any.
    pub fn part(&self, part_number: u32) -> Option<&PartRecord> {
        self.session
            .parts
            .iter()
            .find(|p| p.part_number == part_number)
    }

    /// Recorded parts in confirmation order.
    pub fn parts(&self) -> &[PartRecord] {
        &self.session.parts
    }

    pub fn completed_parts(&self) -> &BTreeSet<u32> {
        &self.session.completed_parts
    }

    pub fn completed_bytes(&self) -> u64 {
        self.session.completed_bytes
    }

    /// Chunk size in effect: the first listed part's size on resume,
    /// otherwise the configured part size.
    pub fn chunk_size(&self) -> u64 {
        self.session.chunk_size
    }

    pub fn state(&self) -> SessionState {
        self.session.state
    }

    pub fn pending(&self) -> &PendingUpload {
        &self.session.pending
    }

    pub fn entry(&self) -> &FileManifestEntry {
        &self.session.entry
    }

    fn require_state(
        &self,
        operation: &'static str,
        allowed: impl Fn(SessionState) -> bool,
    ) -> Result<(), UploadError> {
        if allowed(self.session.state) {
            Ok(())
        } else {
            Err(UploadError::InvalidState {
                operation,
                state: self.session.state,
            })
        }
    }

    fn inconsistent(&self, message: String) -> UploadError {
        UploadError::InconsistentParts {
            key: self.session.pending.key.clone(),
            message,
        }
    }
}
