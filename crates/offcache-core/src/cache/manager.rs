//! Cache manager implementation

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use offcache_store::{BucketId, RequestKey, StoreBackend, StoredResponse};

use crate::error::CoreError;

/// Cache hit/miss counters
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    pub hit_count: u64,
    pub miss_count: u64,
}

/// Handle to an open bucket
///
/// Obtained from [`CacheManager::open`], which guarantees the underlying
/// bucket exists.
#[derive(Debug, Clone)]
pub struct BucketHandle {
    id: BucketId,
}

impl BucketHandle {
    pub(crate) fn new(id: BucketId) -> Self {
        Self { id }
    }

    pub fn id(&self) -> &BucketId {
        &self.id
    }
}

/// Cache manager owning the durable store
pub struct CacheManager {
    store: Arc<dyn StoreBackend>,
    stats: RwLock<CacheStats>,
}

impl CacheManager {
    /// Create a new cache manager
    pub fn new(store: Arc<dyn StoreBackend>) -> Self {
        info!("Initializing cache manager");

        Self {
            store,
            stats: RwLock::new(CacheStats::default()),
        }
    }

    /// Get cache statistics
    pub async fn stats(&self) -> CacheStats {
        self.stats.read().await.clone()
    }

    /// Open a bucket, creating it if absent (idempotent)
    pub async fn open(&self, name: &str, version: &str) -> Result<BucketHandle, CoreError> {
        let id = BucketId::new(name, version);
        self.store.create_bucket(&id).await?;
        debug!("Opened bucket {}", id);
        Ok(BucketHandle::new(id))
    }

    /// Read an entry from a bucket
    pub async fn get(
        &self,
        bucket: &BucketHandle,
        key: &RequestKey,
    ) -> Result<Option<StoredResponse>, CoreError> {
        match self.store.get(&bucket.id, key).await? {
            Some(stored) => {
                debug!("Cache hit for {}", key);
                self.record_hit().await;
                Ok(Some(stored))
            }
            None => {
                debug!("Cache miss for {}", key);
                self.record_miss().await;
                Ok(None)
            }
        }
    }

    /// Write an entry, overwriting any existing one for the key
    ///
    /// Write failures propagate to the caller's strategy logic, which decides
    /// whether to still serve the live response.
    pub async fn put(
        &self,
        bucket: &BucketHandle,
        key: &RequestKey,
        response: StoredResponse,
    ) -> Result<(), CoreError> {
        debug!(
            "Caching {} in {} ({} bytes)",
            key,
            bucket.id,
            response.body.len()
        );
        self.store.put(&bucket.id, key, response).await?;
        Ok(())
    }

    /// Delete a bucket and all of its entries
    pub async fn delete_bucket(&self, id: &BucketId) -> Result<bool, CoreError> {
        debug!("Deleting bucket {}", id);
        Ok(self.store.delete_bucket(id).await?)
    }

    /// Enumerate all buckets in the store
    pub async fn list_buckets(&self) -> Result<Vec<BucketId>, CoreError> {
        Ok(self.store.list_buckets().await?)
    }

    async fn record_hit(&self) {
        let mut stats = self.stats.write().await;
        stats.hit_count += 1;
    }

    async fn record_miss(&self) {
        let mut stats = self.stats.write().await;
        stats.miss_count += 1;
    }
}
