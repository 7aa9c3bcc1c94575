//! Request interception and strategy execution
//!
//! Every intercepted request is answered by one of three strategies selected
//! from the route table. Fetch and store failures during an active request
//! are caught here and converted into a best-effort response or a surfaced
//! failure; they never escape the strategy boundary.

use http::Method;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use offcache_fetch::{Fetcher, Request, Response};
use offcache_store::RequestKey;

use crate::cache::{BucketHandle, CacheManager, response_from_stored, stored_from_response};
use crate::config::{RouteTable, WorkerConfig};
use crate::error::CoreError;
use crate::strategy::Strategy;

/// Intercepts outbound resource requests and applies a caching strategy
pub struct RequestInterceptor {
    cache: Arc<CacheManager>,
    fetcher: Arc<dyn Fetcher>,
    config: Arc<WorkerConfig>,
    routes: RouteTable,
    bucket: BucketHandle,
}

/// Only idempotent read methods are ever served from or written to cache
fn is_cacheable_method(method: &Method) -> bool {
    *method == Method::GET || *method == Method::HEAD
}

impl RequestInterceptor {
    /// Create a new interceptor over the current deployment's bucket
    pub fn new(
        cache: Arc<CacheManager>,
        fetcher: Arc<dyn Fetcher>,
        config: Arc<WorkerConfig>,
    ) -> Self {
        let routes = RouteTable::compile(&config);
        let bucket = BucketHandle::new(config.bucket_id());

        Self {
            cache,
            fetcher,
            config,
            routes,
            bucket,
        }
    }

    /// Handle an intercepted request
    pub async fn handle(&self, request: &Request) -> Result<Response, CoreError> {
        // Explicit check: mutating methods always pass through to the network
        // and are never cached, regardless of the configured strategy
        if !is_cacheable_method(&request.method) {
            debug!("Pass-through for {} {}", request.method, request.url);
            return Ok(self.fetcher.fetch(request).await?);
        }

        let (strategy, timeout) = self.routes.select(&request.url);
        debug!(
            "Handling {} {} with {}",
            request.method,
            request.url,
            strategy.as_str()
        );

        match strategy {
            Strategy::CacheFirst => self.cache_first(request).await,
            Strategy::NetworkFirst => self.network_first(request, timeout).await,
            Strategy::StaleWhileRevalidate => self.stale_while_revalidate(request).await,
        }
    }

    fn request_key(&self, request: &Request) -> RequestKey {
        RequestKey::new(
            request.method.as_str(),
            &request.url,
            self.config.include_query,
        )
    }

    /// Read the cache, demoting store errors to a miss
    async fn cached(&self, key: &RequestKey) -> Option<offcache_store::StoredResponse> {
        match self.cache.get(&self.bucket, key).await {
            Ok(stored) => stored,
            Err(e) => {
                warn!("Cache read failed for {}, treating as miss: {}", key, e);
                None
            }
        }
    }

    /// Write a successful response back into the bucket
    ///
    /// A write failure is logged and demoted; the live response is still
    /// served to the caller.
    async fn write_back(&self, key: &RequestKey, response: &Response) {
        if !response.is_success() {
            debug!(
                "Skipping write-back for {} (status {})",
                key, response.status
            );
            return;
        }

        if let Err(e) = self
            .cache
            .put(&self.bucket, key, stored_from_response(response))
            .await
        {
            warn!("{}", CoreError::StoreWriteFailed(format!("{}: {}", key, e)));
        }
    }

    async fn cache_first(&self, request: &Request) -> Result<Response, CoreError> {
        let key = self.request_key(request);

        if let Some(stored) = self.cached(&key).await {
            return Ok(response_from_stored(stored));
        }

        info!("Cache miss for {}, fetching from network", request.url);
        match self.fetcher.fetch(request).await {
            Ok(response) => {
                self.write_back(&key, &response).await;
                Ok(response)
            }
            Err(e) => Err(CoreError::ResourceUnavailable(format!(
                "{}: {}",
                request.url, e
            ))),
        }
    }

    async fn network_first(
        &self,
        request: &Request,
        timeout: Duration,
    ) -> Result<Response, CoreError> {
        let key = self.request_key(request);

        match tokio::time::timeout(timeout, self.fetcher.fetch(request)).await {
            Ok(Ok(response)) => {
                self.write_back(&key, &response).await;
                Ok(response)
            }
            Ok(Err(e)) => {
                info!(
                    "Network failed for {}, falling back to cache: {}",
                    request.url, e
                );
                match self.cached(&key).await {
                    Some(stored) => Ok(response_from_stored(stored)),
                    None => Err(CoreError::ResourceUnavailable(format!(
                        "{}: {}",
                        request.url, e
                    ))),
                }
            }
            Err(_) => {
                info!(
                    "Network timed out after {} ms for {}, falling back to cache",
                    timeout.as_millis(),
                    request.url
                );
                match self.cached(&key).await {
                    Some(stored) => Ok(response_from_stored(stored)),
                    None => Err(CoreError::TimeoutExceeded(timeout.as_millis() as u64)),
                }
            }
        }
    }

    async fn stale_while_revalidate(&self, request: &Request) -> Result<Response, CoreError> {
        let key = self.request_key(request);

        if let Some(stored) = self.cached(&key).await {
            self.spawn_revalidation(request.clone(), key);
            return Ok(response_from_stored(stored));
        }

        // Nothing stale to serve, degrade to a blocking fetch with write-back
        info!("Cache miss for {}, fetching from network", request.url);
        match self.fetcher.fetch(request).await {
            Ok(response) => {
                self.write_back(&key, &response).await;
                Ok(response)
            }
            Err(e) => Err(CoreError::ResourceUnavailable(format!(
                "{}: {}",
                request.url, e
            ))),
        }
    }

    /// Refresh an entry on a detached task
    ///
    /// The write lands whenever the fetch completes; per-key overwrites are
    /// last-write-wins by arrival order, so no ordering check is needed.
    fn spawn_revalidation(&self, request: Request, key: RequestKey) {
        let fetcher = Arc::clone(&self.fetcher);
        let cache = Arc::clone(&self.cache);
        let bucket = self.bucket.clone();

        tokio::spawn(async move {
            match fetcher.fetch(&request).await {
                Ok(response) if response.is_success() => {
                    match cache
                        .put(&bucket, &key, stored_from_response(&response))
                        .await
                    {
                        Ok(()) => debug!("Revalidated {}", key),
                        Err(e) => warn!("Revalidation write failed for {}: {}", key, e),
                    }
                }
                Ok(response) => debug!(
                    "Skipping revalidation write for {} (status {})",
                    key, response.status
                ),
                Err(e) => warn!("Revalidation fetch failed for {}: {}", key, e),
            }
        });
    }
}
