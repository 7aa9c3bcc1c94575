//! In-memory storage backend
//!
//! Used by tests and by hosts that do not need persistence across restarts.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

use crate::backend::{BucketId, StoreBackend};
use crate::error::StoreError;
use crate::key::RequestKey;
use crate::response::StoredResponse;

/// In-memory storage backend
#[derive(Default)]
pub struct MemoryStore {
    buckets: RwLock<HashMap<BucketId, HashMap<RequestKey, StoredResponse>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StoreBackend for MemoryStore {
    async fn create_bucket(&self, bucket: &BucketId) -> Result<(), StoreError> {
        bucket.validate()?;
        let mut buckets = self.buckets.write().await;
        buckets.entry(bucket.clone()).or_default();
        Ok(())
    }

    async fn list_buckets(&self) -> Result<Vec<BucketId>, StoreError> {
        Ok(self.buckets.read().await.keys().cloned().collect())
    }

    async fn delete_bucket(&self, bucket: &BucketId) -> Result<bool, StoreError> {
        let removed = self.buckets.write().await.remove(bucket).is_some();
        if removed {
            debug!("Deleted bucket {}", bucket);
        }
        Ok(removed)
    }

    async fn get(
        &self,
        bucket: &BucketId,
        key: &RequestKey,
    ) -> Result<Option<StoredResponse>, StoreError> {
        let buckets = self.buckets.read().await;
        Ok(buckets.get(bucket).and_then(|b| b.get(key)).cloned())
    }

    async fn put(
        &self,
        bucket: &BucketId,
        key: &RequestKey,
        response: StoredResponse,
    ) -> Result<(), StoreError> {
        let mut buckets = self.buckets.write().await;
        let entries = buckets
            .get_mut(bucket)
            .ok_or_else(|| StoreError::BucketNotFound(bucket.to_string()))?;
        entries.insert(key.clone(), response);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use url::Url;

    fn key(path: &str) -> RequestKey {
        let url = Url::parse(&format!("https://example.com{}", path)).unwrap();
        RequestKey::new("GET", &url, true)
    }

    fn response(body: &str) -> StoredResponse {
        StoredResponse::new(200, vec![], Bytes::from(body.to_string()))
    }

    #[tokio::test]
    async fn test_put_get_round_trip() {
        let store = MemoryStore::new();
        let bucket = BucketId::new("assets", "v1");
        store.create_bucket(&bucket).await.unwrap();

        store.put(&bucket, &key("/a"), response("hello")).await.unwrap();
        let stored = store.get(&bucket, &key("/a")).await.unwrap().unwrap();
        assert_eq!(stored.body, Bytes::from_static(b"hello"));
        assert_eq!(stored.status, 200);
    }

    #[tokio::test]
    async fn test_get_missing_entry_is_none() {
        let store = MemoryStore::new();
        let bucket = BucketId::new("assets", "v1");
        store.create_bucket(&bucket).await.unwrap();
        assert!(store.get(&bucket, &key("/nope")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_overwrites_wholesale() {
        let store = MemoryStore::new();
        let bucket = BucketId::new("assets", "v1");
        store.create_bucket(&bucket).await.unwrap();

        store.put(&bucket, &key("/a"), response("old")).await.unwrap();
        store.put(&bucket, &key("/a"), response("new")).await.unwrap();
        let stored = store.get(&bucket, &key("/a")).await.unwrap().unwrap();
        assert_eq!(stored.body, Bytes::from_static(b"new"));
    }

    #[tokio::test]
    async fn test_put_into_missing_bucket_fails() {
        let store = MemoryStore::new();
        let bucket = BucketId::new("assets", "v1");
        let err = store.put(&bucket, &key("/a"), response("x")).await.unwrap_err();
        assert!(matches!(err, StoreError::BucketNotFound(_)));
    }

    #[tokio::test]
    async fn test_create_bucket_is_idempotent() {
        let store = MemoryStore::new();
        let bucket = BucketId::new("assets", "v1");
        store.create_bucket(&bucket).await.unwrap();
        store.put(&bucket, &key("/a"), response("keep")).await.unwrap();
        store.create_bucket(&bucket).await.unwrap();
        assert!(store.get(&bucket, &key("/a")).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_and_list_buckets() {
        let store = MemoryStore::new();
        let v1 = BucketId::new("assets", "v1");
        let v2 = BucketId::new("assets", "v2");
        store.create_bucket(&v1).await.unwrap();
        store.create_bucket(&v2).await.unwrap();

        let mut names = store.list_buckets().await.unwrap();
        names.sort_by(|a, b| a.version.cmp(&b.version));
        assert_eq!(names, vec![v1.clone(), v2.clone()]);

        assert!(store.delete_bucket(&v1).await.unwrap());
        assert!(!store.delete_bucket(&v1).await.unwrap());
        assert_eq!(store.list_buckets().await.unwrap(), vec![v2]);
    }
}
