//! Generic request and response model
//!
//! The core receives a `Request` from the hosting environment's dispatch and
//! must produce a `Response` or propagate an error; it never depends on a
//! particular HTTP implementation beyond this boundary.

use bytes::Bytes;
use http::Method;
use url::Url;

/// An intercepted outbound resource request
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(String, String)>,
}

impl Request {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: Vec::new(),
        }
    }

    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// A response produced for an intercepted request
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl Response {
    pub fn new(status: u16, headers: Vec<(String, String)>, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_success_bounds() {
        assert!(Response::new(200, vec![], Bytes::new()).is_success());
        assert!(Response::new(204, vec![], Bytes::new()).is_success());
        assert!(!Response::new(199, vec![], Bytes::new()).is_success());
        assert!(!Response::new(304, vec![], Bytes::new()).is_success());
        assert!(!Response::new(500, vec![], Bytes::new()).is_success());
    }
}
