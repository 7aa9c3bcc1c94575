//! Storage error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Bucket not found: {0}")]
    BucketNotFound(String),

    #[error("Invalid bucket id: {0}")]
    InvalidBucketId(String),

    #[error("Corrupt entry metadata: {0}")]
    CorruptEntry(String),
}
