//! Shared test fixtures

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use offcache_fetch::{FetchError, Fetcher, Request, Response};

#[derive(Debug, Clone)]
enum MockOutcome {
    Respond { status: u16, body: String },
    Fail,
    Hang,
}

/// Scripted fetcher with per-URL outcomes and a call counter
#[derive(Default)]
pub struct MockFetcher {
    outcomes: Mutex<HashMap<String, MockOutcome>>,
    calls: AtomicUsize,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, url: &str, status: u16, body: &str) {
        self.outcomes.lock().unwrap().insert(
            url.to_string(),
            MockOutcome::Respond {
                status,
                body: body.to_string(),
            },
        );
    }

    pub fn fail(&self, url: &str) {
        self.outcomes
            .lock()
            .unwrap()
            .insert(url.to_string(), MockOutcome::Fail);
    }

    pub fn hang(&self, url: &str) {
        self.outcomes
            .lock()
            .unwrap()
            .insert(url.to_string(), MockOutcome::Hang);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let outcome = self
            .outcomes
            .lock()
            .unwrap()
            .get(request.url.as_str())
            .cloned();

        match outcome {
            Some(MockOutcome::Respond { status, body }) => Ok(Response::new(
                status,
                vec![("content-type".to_string(), "text/plain".to_string())],
                Bytes::from(body),
            )),
            Some(MockOutcome::Fail) | None => {
                Err(FetchError::Unreachable(request.url.to_string()))
            }
            Some(MockOutcome::Hang) => futures::future::pending().await,
        }
    }
}
