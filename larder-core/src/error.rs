use thiserror::Error;

use crate::store::{ObjectStoreError, StoreError};

/// Errors returned synchronously from [`Larder`](crate::Larder) entry points.
///
/// Failures inside the background analysis never show up here; they end in a
/// `failed` record instead.
#[derive(Error, Debug)]
pub enum LarderError {
    #[error("Authentication required")]
    Unauthenticated,

    #[error("Not authorized to access this record")]
    NotAuthorized,

    #[error("Invalid upload: {0}")]
    InvalidUpload(String),

    #[error("Upload failed: {0}")]
    Upload(#[from] ObjectStoreError),

    #[error("Record store error: {0}")]
    Store(#[from] StoreError),
}
