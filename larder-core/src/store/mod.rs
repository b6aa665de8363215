//! Storage collaborators: an object store for uploaded images and a record
//! store for analysis results.
//!
//! The server provides Postgres implementations; [`memory`] has in-process
//! ones used by the CLI and the tests.

pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{ImageHandle, NewRecord, Record, RecordId, RecordState, UserId};

pub use memory::{MemoryObjectStore, MemoryRecordStore, StoredObject};

#[derive(Error, Debug)]
pub enum ObjectStoreError {
    #[error("Upload target is unknown or was already used")]
    InvalidTarget,

    #[error("Empty upload")]
    EmptyUpload,

    #[error("Object store backend error: {0}")]
    Backend(String),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Record not found: {0}")]
    NotFound(RecordId),

    #[error("Record {0} already reached a terminal status")]
    AlreadyTerminal(RecordId),

    #[error("Records can only be patched into a terminal status")]
    InvalidTransition,

    #[error("Record store backend error: {0}")]
    Backend(String),

    #[error("Corrupt record {id}: {message}")]
    Corrupt { id: RecordId, message: String },
}

/// A one-time destination for a single image upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTarget {
    pub token: String,
    pub url: String,
}

/// Blob storage for uploaded photos.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Reserve a one-time upload target for `owner`.
    async fn request_upload_target(&self, owner: UserId) -> Result<UploadTarget, ObjectStoreError>;

    /// Transfer the bytes to a previously issued target. A target accepts
    /// exactly one transfer.
    async fn transfer(
        &self,
        target: &UploadTarget,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<ImageHandle, ObjectStoreError>;

    /// A URL the image can be fetched from, or `None` when the handle is unknown.
    async fn resolve(&self, handle: &ImageHandle) -> Option<String>;

    /// Delete an image. Returns whether it existed; its URL stops resolving.
    async fn remove(&self, handle: &ImageHandle) -> Result<bool, ObjectStoreError>;
}

/// Document collection holding one kind of record, indexed by owner.
///
/// Records are inserted in the processing state and patched exactly once
/// into a terminal state. Implementations must reject any later patch with
/// [`StoreError::AlreadyTerminal`].
#[async_trait]
pub trait RecordStore<S: RecordState>: Send + Sync {
    async fn insert(&self, new: NewRecord) -> Result<Record<S>, StoreError>;

    async fn patch(&self, id: RecordId, state: S) -> Result<(), StoreError>;

    async fn get(&self, id: RecordId) -> Result<Option<Record<S>>, StoreError>;

    /// The owner's records, newest first, at most `limit`.
    async fn query(&self, owner: UserId, limit: usize) -> Result<Vec<Record<S>>, StoreError>;

    /// Returns whether a record was removed.
    async fn delete(&self, id: RecordId) -> Result<bool, StoreError>;
}
