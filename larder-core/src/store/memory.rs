//! In-process stores.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ObjectStore, ObjectStoreError, RecordStore, StoreError, UploadTarget};
use crate::types::{ImageHandle, NewRecord, Record, RecordId, RecordState, UserId};

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub owner: UserId,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Object store that keeps images in memory and resolves them to `data:` URLs,
/// so a vision model can read them without any public endpoint.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    pending: RwLock<HashMap<String, UserId>>,
    objects: RwLock<HashMap<ImageHandle, StoredObject>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn fetch(&self, handle: &ImageHandle) -> Option<StoredObject> {
        self.objects.read().await.get(handle).cloned()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn request_upload_target(&self, owner: UserId) -> Result<UploadTarget, ObjectStoreError> {
        let token = Uuid::new_v4().simple().to_string();
        self.pending.write().await.insert(token.clone(), owner);

        Ok(UploadTarget {
            url: format!("memory://uploads/{}", token),
            token,
        })
    }

    async fn transfer(
        &self,
        target: &UploadTarget,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<ImageHandle, ObjectStoreError> {
        if data.is_empty() {
            return Err(ObjectStoreError::EmptyUpload);
        }

        let owner = self
            .pending
            .write()
            .await
            .remove(&target.token)
            .ok_or(ObjectStoreError::InvalidTarget)?;

        let handle = ImageHandle::new(Uuid::new_v4().to_string());
        self.objects.write().await.insert(
            handle.clone(),
            StoredObject {
                owner,
                content_type: content_type.to_string(),
                data,
            },
        );

        Ok(handle)
    }

    async fn resolve(&self, handle: &ImageHandle) -> Option<String> {
        let objects = self.objects.read().await;
        let object = objects.get(handle)?;
        Some(format!(
            "data:{};base64,{}",
            object.content_type,
            STANDARD.encode(&object.data)
        ))
    }

    async fn remove(&self, handle: &ImageHandle) -> Result<bool, ObjectStoreError> {
        Ok(self.objects.write().await.remove(handle).is_some())
    }
}

/// Record store backed by a vector in insertion order.
#[derive(Debug)]
pub struct MemoryRecordStore<S> {
    records: RwLock<Vec<Record<S>>>,
}

impl<S> Default for MemoryRecordStore<S> {
    fn default() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }
}

impl<S> MemoryRecordStore<S> {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl<S: RecordState> RecordStore<S> for MemoryRecordStore<S> {
    async fn insert(&self, new: NewRecord) -> Result<Record<S>, StoreError> {
        let now = Utc::now();
        let record = Record {
            id: Uuid::new_v4(),
            owner: new.owner,
            image: new.image,
            created_at: now,
            updated_at: now,
            state: S::processing(),
        };

        self.records.write().await.push(record.clone());
        Ok(record)
    }

    async fn patch(&self, id: RecordId, state: S) -> Result<(), StoreError> {
        if !state.status().is_terminal() {
            return Err(StoreError::InvalidTransition);
        }

        let mut records = self.records.write().await;
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(StoreError::NotFound(id))?;

        if record.status().is_terminal() {
            return Err(StoreError::AlreadyTerminal(id));
        }

        record.state = state;
        record.updated_at = Utc::now();
        Ok(())
    }

    async fn get(&self, id: RecordId) -> Result<Option<Record<S>>, StoreError> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .find(|r| r.id == id)
            .cloned())
    }

    async fn query(&self, owner: UserId, limit: usize) -> Result<Vec<Record<S>>, StoreError> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .rev()
            .filter(|r| r.owner == owner)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn delete(&self, id: RecordId) -> Result<bool, StoreError> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| r.id != id);
        Ok(records.len() != before)
    }
}
