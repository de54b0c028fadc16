//! Object storage client (avatars and other uploaded blobs).

use axum::body::Bytes;
use dashmap::DashMap;
use futures_util::future::{self, BoxFuture, FutureExt};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// A stored blob.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

pub trait StorageClient: Send + Sync {
    fn put<'a>(&'a self, key: &'a str, object: StoredObject)
        -> BoxFuture<'a, Result<(), StorageError>>;

    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<StoredObject>, StorageError>>;
}

/// In-process bucket.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    objects: DashMap<String, StoredObject>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl StorageClient for MemoryStorage {
    fn put<'a>(
        &'a self,
        key: &'a str,
        object: StoredObject,
    ) -> BoxFuture<'a, Result<(), StorageError>> {
        self.objects.insert(key.to_string(), object);
        future::ready(Ok(())).boxed()
    }

    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<StoredObject>, StorageError>> {
        let found = self.objects.get(key).map(|entry| entry.value().clone());
        future::ready(Ok(found)).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_then_get() {
        let storage = MemoryStorage::new();
        let object = StoredObject {
            content_type: Some("image/png".into()),
            bytes: Bytes::from_static(b"\x89PNG"),
        };
        storage.put("contributor/1/avatar", object.clone()).await.unwrap();

        assert_eq!(storage.get("contributor/1/avatar").await.unwrap(), Some(object));
        assert_eq!(storage.get("contributor/2/avatar").await.unwrap(), None);
        assert_eq!(storage.len(), 1);
    }
}
