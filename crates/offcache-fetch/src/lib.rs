//! Offcache Network Boundary
//!
//! This crate provides the generic request/response model used at the
//! interception boundary and the client for performing live fetches.

pub mod client;
pub mod error;
pub mod model;

pub use client::{Fetcher, HttpFetcher, HttpFetcherConfig};
pub use error::FetchError;
pub use model::{Request, Response};
