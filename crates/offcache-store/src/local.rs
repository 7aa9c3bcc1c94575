//! Local disk storage backend

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tracing::{debug, info, warn};

use crate::backend::{BucketId, StoreBackend};
use crate::error::StoreError;
use crate::key::RequestKey;
use crate::response::StoredResponse;

/// Local disk storage backend
///
/// Entries live in a sharded directory structure keyed by the SHA256 of the
/// request key, so keys stay stable across process restarts:
/// `<base_path>/buckets/<name@version>/<first 2 hex chars>/<digest>.entry`.
///
/// Each entry is a single file: a JSON metadata header line followed by the
/// raw body bytes. The whole entry is replaced by one rename, so concurrent
/// writers for the same key stay last-write-wins and a reader can never
/// observe a body paired with another write's metadata.
pub struct LocalStore {
    base_path: PathBuf,
}

/// Metadata header persisted ahead of the body in each entry file
#[derive(Debug, Serialize, Deserialize)]
struct EntryMeta {
    status: u16,
    headers: Vec<(String, String)>,
    stored_at: DateTime<Utc>,
}

/// Monotonic suffix keeping concurrent writers' temp files distinct
static TEMP_SEQ: AtomicU64 = AtomicU64::new(0);

impl LocalStore {
    /// Create a new local storage backend rooted at `base_path`
    pub async fn new(base_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let base_path = base_path.as_ref().to_path_buf();
        fs::create_dir_all(base_path.join("buckets")).await?;

        info!("Initialized local store at {:?}", base_path);

        Ok(Self { base_path })
    }

    fn buckets_root(&self) -> PathBuf {
        self.base_path.join("buckets")
    }

    fn bucket_path(&self, bucket: &BucketId) -> Result<PathBuf, StoreError> {
        bucket.validate()?;
        Ok(self.buckets_root().join(bucket.dir_name()))
    }

    fn entry_path(&self, bucket: &BucketId, key: &RequestKey) -> Result<PathBuf, StoreError> {
        let digest = key.digest();
        Ok(self
            .bucket_path(bucket)?
            .join(&digest[..2])
            .join(format!("{}.entry", digest)))
    }
}

/// Write a file atomically using a uniquely named temp file and rename
async fn write_atomic(path: &Path, data: &[u8]) -> Result<(), StoreError> {
    let seq = TEMP_SEQ.fetch_add(1, Ordering::Relaxed);
    let temp_path = path.with_extension(format!("tmp.{}.{}", std::process::id(), seq));
    fs::write(&temp_path, data).await?;
    fs::rename(&temp_path, path).await?;
    Ok(())
}

#[async_trait]
impl StoreBackend for LocalStore {
    async fn create_bucket(&self, bucket: &BucketId) -> Result<(), StoreError> {
        let path = self.bucket_path(bucket)?;
        fs::create_dir_all(&path).await?;
        debug!("Ensured bucket directory {:?}", path);
        Ok(())
    }

    async fn list_buckets(&self) -> Result<Vec<BucketId>, StoreError> {
        let mut buckets = Vec::new();
        let mut entries = fs::read_dir(self.buckets_root()).await?;

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let dir_name = entry.file_name().to_string_lossy().to_string();
            match BucketId::parse_dir_name(&dir_name) {
                Ok(id) => buckets.push(id),
                Err(_) => warn!("Skipping unrecognized bucket directory: {}", dir_name),
            }
        }

        Ok(buckets)
    }

    async fn delete_bucket(&self, bucket: &BucketId) -> Result<bool, StoreError> {
        let path = self.bucket_path(bucket)?;
        debug!("Deleting bucket at {:?}", path);

        match fs::remove_dir_all(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    async fn get(
        &self,
        bucket: &BucketId,
        key: &RequestKey,
    ) -> Result<Option<StoredResponse>, StoreError> {
        let path = self.entry_path(bucket, key)?;

        let raw = match fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::Io(e)),
        };

        // Header is the first line; serde_json never emits a raw newline
        let split = raw
            .iter()
            .position(|&b| b == b'\n')
            .ok_or_else(|| StoreError::CorruptEntry(format!("{}: missing header", key)))?;

        let meta: EntryMeta = serde_json::from_slice(&raw[..split])
            .map_err(|e| StoreError::CorruptEntry(format!("{}: {}", key, e)))?;
        let body = Bytes::copy_from_slice(&raw[split + 1..]);

        Ok(Some(StoredResponse {
            status: meta.status,
            headers: meta.headers,
            body,
            stored_at: meta.stored_at,
        }))
    }

    async fn put(
        &self,
        bucket: &BucketId,
        key: &RequestKey,
        response: StoredResponse,
    ) -> Result<(), StoreError> {
        let bucket_path = self.bucket_path(bucket)?;
        if !bucket_path.exists() {
            return Err(StoreError::BucketNotFound(bucket.to_string()));
        }

        let path = self.entry_path(bucket, key)?;
        debug!("Writing entry {} to {:?}", key, path);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let meta = EntryMeta {
            status: response.status,
            headers: response.headers,
            stored_at: response.stored_at,
        };
        let mut raw = serde_json::to_vec(&meta)
            .map_err(|e| StoreError::CorruptEntry(format!("{}: {}", key, e)))?;
        raw.push(b'\n');
        raw.extend_from_slice(&response.body);

        write_atomic(&path, &raw).await?;

        Ok(())
    }
}
