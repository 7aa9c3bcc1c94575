//! Storage backend trait

use async_trait::async_trait;
use std::fmt;

use crate::error::StoreError;
use crate::key::RequestKey;
use crate::response::StoredResponse;

/// Identifier of a bucket: a named, versioned collection of cached entries
///
/// At most one bucket per name is current at a time; buckets carrying a stale
/// version for the same name are deleted during activation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BucketId {
    pub name: String,
    pub version: String,
}

impl BucketId {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    /// Validate that the id can be rendered as a durable directory name
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.name.is_empty() || self.version.is_empty() {
            return Err(StoreError::InvalidBucketId(
                "name and version must be non-empty".to_string(),
            ));
        }
        for part in [&self.name, &self.version] {
            if part.contains(['@', '/', '\\', '\0']) {
                return Err(StoreError::InvalidBucketId(format!(
                    "illegal character in '{}'",
                    part
                )));
            }
        }
        Ok(())
    }

    /// Directory name for durable backends: `name@version`
    pub fn dir_name(&self) -> String {
        format!("{}@{}", self.name, self.version)
    }

    /// Parse a directory name back into a bucket id
    pub fn parse_dir_name(dir: &str) -> Result<Self, StoreError> {
        let (name, version) = dir
            .split_once('@')
            .ok_or_else(|| StoreError::InvalidBucketId(dir.to_string()))?;
        let id = Self::new(name, version);
        id.validate()?;
        Ok(id)
    }
}

impl fmt::Display for BucketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

/// Storage backend trait
///
/// Implementations provide bucket-scoped, durable key-value storage for
/// cached responses. Per-key writes are wholesale overwrites with
/// last-write-wins semantics; no read-modify-write sequences exist.
#[async_trait]
pub trait StoreBackend: Send + Sync {
    /// Create a bucket if it does not exist (idempotent)
    async fn create_bucket(&self, bucket: &BucketId) -> Result<(), StoreError>;

    /// Enumerate all buckets
    async fn list_buckets(&self) -> Result<Vec<BucketId>, StoreError>;

    /// Delete a bucket and all of its entries; returns false if absent
    async fn delete_bucket(&self, bucket: &BucketId) -> Result<bool, StoreError>;

    /// Read an entry
    async fn get(
        &self,
        bucket: &BucketId,
        key: &RequestKey,
    ) -> Result<Option<StoredResponse>, StoreError>;

    /// Write an entry, overwriting any existing one for the key
    async fn put(
        &self,
        bucket: &BucketId,
        key: &RequestKey,
        response: StoredResponse,
    ) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dir_name_round_trip() {
        let id = BucketId::new("assets", "v2");
        assert_eq!(id.dir_name(), "assets@v2");
        assert_eq!(BucketId::parse_dir_name("assets@v2").unwrap(), id);
    }

    #[test]
    fn test_parse_rejects_malformed_names() {
        assert!(BucketId::parse_dir_name("no-version").is_err());
        assert!(BucketId::parse_dir_name("@v1").is_err());
        assert!(BucketId::parse_dir_name("assets@").is_err());
    }

    #[test]
    fn test_validate_rejects_path_characters() {
        assert!(BucketId::new("a/b", "v1").validate().is_err());
        assert!(BucketId::new("assets", "v1@old").validate().is_err());
        assert!(BucketId::new("assets", "v1").validate().is_ok());
    }
}
