//! Offcache Core Logic
//!
//! This crate provides the core functionality of the offline resource cache:
//! versioned bucket management, per-request caching strategies, and the
//! install/activate worker lifecycle. It is instantiated and driven entirely
//! by the hosting environment's event dispatch; there are no ambient globals.

pub mod cache;
pub mod config;
pub mod error;
pub mod interceptor;
pub mod lifecycle;
pub mod strategy;
pub mod worker;

pub use cache::{BucketHandle, CacheManager, CacheStats};
pub use config::{RouteConfig, WorkerConfig};
pub use error::CoreError;
pub use interceptor::RequestInterceptor;
pub use lifecycle::{LifecycleController, WorkerState};
pub use strategy::Strategy;
pub use worker::{Worker, WorkerEvent};

pub use offcache_fetch::{Fetcher, Request, Response};
pub use offcache_store::{BucketId, RequestKey, StoreBackend, StoredResponse};

#[cfg(test)]
pub(crate) mod testing;
