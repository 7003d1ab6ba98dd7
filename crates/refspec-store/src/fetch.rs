//! The injected fetch capability.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::StoreResult;

/// A GET request: URL plus headers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
}

impl FetchRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
        }
    }

    /// Set a header, replacing any existing header of the same name
    /// (case-insensitive).
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
        self
    }

    /// Look up a header by name (case-insensitive).
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Status code and body of a completed request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: Bytes,
}

impl FetchResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// `200 OK` or `206 Partial Content`.
    pub fn is_success(&self) -> bool {
        matches!(self.status, 200 | 206)
    }
}

/// HTTP GET capability used by the store.
///
/// Implementations return `Ok` for any response the server produced, whatever
/// its status; the store interprets the status. `Err` is reserved for
/// failures that produced no response (connection refused, TLS, timeouts).
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, request: FetchRequest) -> StoreResult<FetchResponse>;
}
