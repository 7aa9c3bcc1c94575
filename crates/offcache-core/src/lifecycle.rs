//! Worker lifecycle: install and activate transitions
//!
//! Install pre-populates the current version's bucket from the configured
//! precache list; activate prunes buckets superseded by the current version.
//! Failed transitions are terminal for this attempt: the host retries by
//! dispatching the event again, the core never self-retries.

use futures::future;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use offcache_fetch::{Fetcher, Request};
use offcache_store::RequestKey;
use url::Url;

use crate::cache::{BucketHandle, CacheManager, stored_from_response};
use crate::config::WorkerConfig;
use crate::error::CoreError;

/// Lifecycle states of a worker generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    New,
    Installing,
    Installed,
    Activating,
    Active,
}

impl WorkerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerState::New => "new",
            WorkerState::Installing => "installing",
            WorkerState::Installed => "installed",
            WorkerState::Activating => "activating",
            WorkerState::Active => "active",
        }
    }
}

/// Drives the install and activate transitions for one worker generation
pub struct LifecycleController {
    cache: Arc<CacheManager>,
    fetcher: Arc<dyn Fetcher>,
    config: Arc<WorkerConfig>,
    state: RwLock<WorkerState>,
}

impl LifecycleController {
    pub fn new(
        cache: Arc<CacheManager>,
        fetcher: Arc<dyn Fetcher>,
        config: Arc<WorkerConfig>,
    ) -> Self {
        Self {
            cache,
            fetcher,
            config,
            state: RwLock::new(WorkerState::New),
        }
    }

    /// Current lifecycle state
    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    /// Install: open the current bucket and pre-cache the configured list
    ///
    /// Failure of any single item aborts the whole install and reverts the
    /// state to `New` so the host can retry later.
    pub async fn install(&self) -> Result<(), CoreError> {
        self.transition(WorkerState::New, WorkerState::Installing)
            .await?;

        info!(
            "Installing {}@{} ({} precache items)",
            self.config.cache_name,
            self.config.version,
            self.config.precache.len()
        );

        match self.precache_all().await {
            Ok(()) => {
                self.set_state(WorkerState::Installed).await;
                info!("Installed {}@{}", self.config.cache_name, self.config.version);
                Ok(())
            }
            Err(e) => {
                self.set_state(WorkerState::New).await;
                warn!("Install aborted, host may retry: {}", e);
                Err(e)
            }
        }
    }

    async fn precache_all(&self) -> Result<(), CoreError> {
        let bucket = self
            .cache
            .open(&self.config.cache_name, &self.config.version)
            .await
            .map_err(|e| CoreError::InstallFailed(format!("opening bucket: {}", e)))?;

        // All-or-nothing, fetched concurrently
        future::try_join_all(
            self.config
                .precache
                .iter()
                .map(|raw| self.precache_one(&bucket, raw)),
        )
        .await?;

        Ok(())
    }

    async fn precache_one(&self, bucket: &BucketHandle, raw: &str) -> Result<(), CoreError> {
        let url = Url::parse(raw)
            .map_err(|e| CoreError::InstallFailed(format!("invalid precache URL {}: {}", raw, e)))?;
        let request = Request::get(url);

        let response = self
            .fetcher
            .fetch(&request)
            .await
            .map_err(|e| CoreError::InstallFailed(format!("{}: {}", raw, e)))?;

        if !response.is_success() {
            return Err(CoreError::InstallFailed(format!(
                "{} returned status {}",
                raw, response.status
            )));
        }

        let key = RequestKey::new(
            request.method.as_str(),
            &request.url,
            self.config.include_query,
        );
        self.cache
            .put(bucket, &key, stored_from_response(&response))
            .await
            .map_err(|e| CoreError::InstallFailed(format!("storing {}: {}", raw, e)))?;

        debug!("Precached {}", raw);
        Ok(())
    }

    /// Activate: prune buckets of this cache superseded by the current version
    ///
    /// The host guarantees this transition is exclusive of in-flight request
    /// handling for this worker generation, so deletion here cannot race a
    /// reader of a prior version.
    pub async fn activate(&self) -> Result<usize, CoreError> {
        self.transition(WorkerState::Installed, WorkerState::Activating)
            .await?;

        info!(
            "Activating {}@{}",
            self.config.cache_name, self.config.version
        );

        match self.prune_stale().await {
            Ok(pruned) => {
                self.set_state(WorkerState::Active).await;
                info!(
                    "Active at {}@{} ({} stale buckets pruned)",
                    self.config.cache_name, self.config.version, pruned
                );
                Ok(pruned)
            }
            Err(e) => {
                self.set_state(WorkerState::Installed).await;
                warn!("Activate aborted, host may retry: {}", e);
                Err(e)
            }
        }
    }

    async fn prune_stale(&self) -> Result<usize, CoreError> {
        let mut pruned = 0;

        for id in self.cache.list_buckets().await? {
            if id.name == self.config.cache_name && id.version != self.config.version {
                if self.cache.delete_bucket(&id).await? {
                    info!("Pruned stale bucket {}", id);
                    pruned += 1;
                }
            }
        }

        Ok(pruned)
    }

    async fn transition(&self, from: WorkerState, to: WorkerState) -> Result<(), CoreError> {
        let mut state = self.state.write().await;
        if *state != from {
            return Err(CoreError::InvalidState(format!(
                "cannot enter {} from {}",
                to.as_str(),
                state.as_str()
            )));
        }
        *state = to;
        Ok(())
    }

    async fn set_state(&self, to: WorkerState) {
        *self.state.write().await = to;
    }
}
