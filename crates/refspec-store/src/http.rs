//! [`Fetch`] over a `reqwest` client.

use async_trait::async_trait;
use tracing::trace;

use crate::error::{StoreError, StoreResult};
use crate::fetch::{Fetch, FetchRequest, FetchResponse};

/// HTTP(S) transport backed by [`reqwest::Client`].
#[derive(Clone, Debug, Default)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a preconfigured client (timeouts, proxies, TLS roots).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetch for ReqwestFetcher {
    async fn fetch(&self, request: FetchRequest) -> StoreResult<FetchResponse> {
        let mut builder = self.client.get(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        let response = builder.send().await.map_err(transport)?;
        let status = response.status().as_u16();
        trace!(url = %request.url, status, "response received");
        let body = response.bytes().await.map_err(transport)?;
        Ok(FetchResponse::new(status, body))
    }
}

fn transport(err: reqwest::Error) -> StoreError {
    StoreError::Transport(err.to_string())
}
