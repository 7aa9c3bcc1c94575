//! Cache management module

mod manager;

pub use manager::{BucketHandle, CacheManager, CacheStats};

use offcache_fetch::Response;
use offcache_store::StoredResponse;

/// Capture a live response for storage
pub fn stored_from_response(response: &Response) -> StoredResponse {
    StoredResponse::new(
        response.status,
        response.headers.clone(),
        response.body.clone(),
    )
}

/// Rehydrate a stored entry into a servable response
pub fn response_from_stored(stored: StoredResponse) -> Response {
    Response::new(stored.status, stored.headers, stored.body)
}
