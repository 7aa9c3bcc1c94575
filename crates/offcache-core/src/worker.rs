//! Worker facade and event dispatch
//!
//! The hosting environment drives the core exclusively through
//! [`Worker::handle_event`]; the worker owns its configuration, store handle
//! and fetcher, injected at construction.

use std::sync::Arc;

use offcache_fetch::{Fetcher, Request, Response};
use offcache_store::StoreBackend;

use crate::cache::{CacheManager, CacheStats};
use crate::config::WorkerConfig;
use crate::error::CoreError;
use crate::interceptor::RequestInterceptor;
use crate::lifecycle::{LifecycleController, WorkerState};

/// Events dispatched by the hosting environment
#[derive(Debug)]
pub enum WorkerEvent {
    /// Pre-populate the current version's bucket
    Install,
    /// Prune superseded bucket versions and go live
    Activate,
    /// An intercepted outbound request
    Fetch(Request),
}

/// One worker generation: lifecycle plus request interception over a shared
/// cache manager
pub struct Worker {
    lifecycle: LifecycleController,
    interceptor: RequestInterceptor,
    cache: Arc<CacheManager>,
}

impl Worker {
    pub fn new(
        config: WorkerConfig,
        store: Arc<dyn StoreBackend>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        let config = Arc::new(config);
        let cache = Arc::new(CacheManager::new(store));

        let lifecycle = LifecycleController::new(
            Arc::clone(&cache),
            Arc::clone(&fetcher),
            Arc::clone(&config),
        );
        let interceptor = RequestInterceptor::new(Arc::clone(&cache), fetcher, config);

        Self {
            lifecycle,
            interceptor,
            cache,
        }
    }

    /// Dispatch a host event
    ///
    /// Only `Fetch` produces a response; lifecycle events yield `None`.
    pub async fn handle_event(&self, event: WorkerEvent) -> Result<Option<Response>, CoreError> {
        match event {
            WorkerEvent::Install => {
                self.lifecycle.install().await?;
                Ok(None)
            }
            WorkerEvent::Activate => {
                self.lifecycle.activate().await?;
                Ok(None)
            }
            WorkerEvent::Fetch(request) => {
                Ok(Some(self.interceptor.handle(&request).await?))
            }
        }
    }

    /// Current lifecycle state
    pub async fn state(&self) -> WorkerState {
        self.lifecycle.state().await
    }

    /// Cache hit/miss counters
    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }
}
