//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Store error: {0}")]
    Store(#[from] offcache_store::StoreError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] offcache_fetch::FetchError),

    #[error("Install failed: {0}")]
    InstallFailed(String),

    #[error("Resource unavailable: {0}")]
    ResourceUnavailable(String),

    #[error("Network timeout after {0} ms")]
    TimeoutExceeded(u64),

    #[error("Cache write failed: {0}")]
    StoreWriteFailed(String),

    #[error("Invalid lifecycle transition: {0}")]
    InvalidState(String),
}
