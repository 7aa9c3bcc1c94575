//! Offcache Storage Layer
//!
//! This crate provides bucket-scoped durable storage for cached responses,
//! supporting in-memory and local disk backends.

pub mod backend;
pub mod error;
pub mod key;
pub mod local;
pub mod memory;
pub mod response;

pub use backend::{BucketId, StoreBackend};
pub use error::StoreError;
pub use key::RequestKey;
pub use local::LocalStore;
pub use memory::MemoryStore;
pub use response::StoredResponse;
