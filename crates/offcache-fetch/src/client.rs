//! Live fetch client

use async_trait::async_trait;
use tracing::debug;

use crate::error::FetchError;
use crate::model::{Request, Response};

/// Trait for performing live fetches
///
/// The strategies in the core depend on this trait, so hosts and tests can
/// substitute their own network implementation.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Perform a live fetch, buffering the body fully
    async fn fetch(&self, request: &Request) -> Result<Response, FetchError>;
}

/// Configuration for the HTTP fetch client
#[derive(Clone, Debug, Default)]
pub struct HttpFetcherConfig {
    /// User-Agent header sent with every fetch
    pub user_agent: Option<String>,
    /// Skip TLS certificate verification
    pub skip_tls_verify: bool,
}

/// HTTP fetch client backed by reqwest
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Create a new HTTP fetcher
    pub fn new(config: HttpFetcherConfig) -> Result<Self, FetchError> {
        let mut builder = reqwest::Client::builder();

        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }

        if config.skip_tls_verify {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder.build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response, FetchError> {
        debug!("Fetching {} {}", request.method, request.url);

        let mut builder = self
            .client
            .request(request.method.clone(), request.url.clone());

        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }

        let response = builder.send().await?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        let body = response.bytes().await?;

        Ok(Response::new(status, headers, body))
    }
}
