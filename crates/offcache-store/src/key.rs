//! Request key derivation
//!
//! A request key identifies a cached entry within a bucket. It is derived
//! deterministically from the request method and normalized URL so that the
//! same request maps to the same entry across process restarts.

use sha2::{Digest, Sha256};
use std::fmt;
use url::Url;

/// Deterministic cache key for a request
///
/// The key is `METHOD <url>` with the fragment stripped and, when query
/// inclusion is disabled, the query string stripped as well.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestKey(String);

impl RequestKey {
    /// Derive a key from a method and absolute URL
    pub fn new(method: &str, url: &Url, include_query: bool) -> Self {
        let mut normalized = url.clone();
        normalized.set_fragment(None);
        if !include_query {
            normalized.set_query(None);
        }
        Self(format!("{} {}", method.to_ascii_uppercase(), normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// SHA256 hex of the key string, used by durable backends to derive
    /// filesystem-safe entry paths
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.0.as_bytes());
        hex::encode(hasher.finalize())
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_key_is_deterministic() {
        let url = parse("https://example.com/static/app.css");
        let a = RequestKey::new("GET", &url, true);
        let b = RequestKey::new("GET", &url, true);
        assert_eq!(a, b);
        assert_eq!(a.digest(), b.digest());
    }

    #[test]
    fn test_method_is_normalized() {
        let url = parse("https://example.com/");
        assert_eq!(
            RequestKey::new("get", &url, true),
            RequestKey::new("GET", &url, true)
        );
    }

    #[test]
    fn test_query_included_by_default() {
        let with_query = parse("https://example.com/search?q=1");
        let without = parse("https://example.com/search");
        assert_ne!(
            RequestKey::new("GET", &with_query, true),
            RequestKey::new("GET", &without, true)
        );
    }

    #[test]
    fn test_query_stripped_when_disabled() {
        let with_query = parse("https://example.com/search?q=1");
        let without = parse("https://example.com/search");
        assert_eq!(
            RequestKey::new("GET", &with_query, false),
            RequestKey::new("GET", &without, false)
        );
    }

    #[test]
    fn test_fragment_never_part_of_key() {
        let with_fragment = parse("https://example.com/page#section");
        let without = parse("https://example.com/page");
        assert_eq!(
            RequestKey::new("GET", &with_fragment, true),
            RequestKey::new("GET", &without, true)
        );
    }

    #[test]
    fn test_different_methods_distinct() {
        let url = parse("https://example.com/resource");
        assert_ne!(
            RequestKey::new("GET", &url, true),
            RequestKey::new("HEAD", &url, true)
        );
    }
}
