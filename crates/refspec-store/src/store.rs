//! The read-only reference store.

use std::sync::Arc;

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;
use bytes::Bytes;
use refspec_parse::SpecParser;
use refspec_types::{ByteRange, Reference, ReferenceMap, SpecDocument};
use tracing::{debug, warn};

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::fetch::{Fetch, FetchRequest};
use crate::resolve::resolve_url;

/// Standard alphabet, padding optional.
const INLINE_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Per-read request options.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GetOptions {
    /// Extra headers for this read, applied over the store-wide headers.
    pub headers: Vec<(String, String)>,
}

impl GetOptions {
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Read-only, key-addressed byte access over a [`ReferenceMap`].
///
/// Cloning is cheap; clones share the map, configuration, and fetcher.
#[derive(Clone)]
pub struct ReferenceStore {
    refs: Arc<ReferenceMap>,
    config: Arc<StoreConfig>,
    fetcher: Arc<dyn Fetch>,
}

impl ReferenceStore {
    /// Wrap a parsed map with the default configuration.
    pub fn new(refs: ReferenceMap, fetcher: Arc<dyn Fetch>) -> Self {
        Self {
            refs: Arc::new(refs),
            config: Arc::new(StoreConfig::default()),
            fetcher,
        }
    }

    pub fn with_config(mut self, config: StoreConfig) -> Self {
        self.config = Arc::new(config);
        self
    }

    /// Set the default target used by entries without a URL.
    pub fn with_target(self, target: impl Into<String>) -> Self {
        let config = StoreConfig::clone(&self.config).with_target(target);
        self.with_config(config)
    }

    /// Parse a decoded spec and wrap the result.
    pub fn from_spec(spec: &SpecDocument, fetcher: Arc<dyn Fetch>) -> StoreResult<Self> {
        let refs = SpecParser::new().parse(spec)?;
        Ok(Self::new(refs, fetcher))
    }

    /// Parse JSON text (legacy or versioned form) and wrap the result.
    pub fn from_json(text: &str, fetcher: Arc<dyn Fetch>) -> StoreResult<Self> {
        let refs = SpecParser::new().parse_json(text)?;
        Ok(Self::new(refs, fetcher))
    }

    /// Fetch a spec document through `fetcher`, parse it, and wrap the result.
    pub async fn from_url(
        url: &str,
        fetcher: Arc<dyn Fetch>,
        config: StoreConfig,
    ) -> StoreResult<Self> {
        let resolved = resolve_url(url, &config.object_storage)?;
        let mut request = FetchRequest::new(resolved.clone());
        for (name, value) in &config.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        let response = fetcher.fetch(request).await?;
        if !response.is_success() {
            warn!(url = %resolved, status = response.status, "spec request failed");
            return Err(StoreError::RequestFailed {
                url: resolved,
                status: response.status,
            });
        }
        let spec = SpecDocument::from_slice(&response.body)
            .map_err(|e| StoreError::Parse(e.into()))?;
        debug!(url = %resolved, "loaded reference spec");
        Ok(Self::from_spec(&spec, fetcher)?.with_config(config))
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// The store-wide default target, if configured.
    pub fn target(&self) -> Option<&str> {
        self.config.target.as_deref()
    }

    pub fn references(&self) -> &ReferenceMap {
        &self.refs
    }

    /// The reference behind `key`, without reading any bytes.
    pub fn reference(&self, key: &str) -> Option<&Reference> {
        self.refs.get(key)
    }

    pub fn has(&self, key: &str) -> bool {
        self.refs.contains_key(key)
    }

    /// Logical keys in map order.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.refs.keys()
    }

    pub fn len(&self) -> usize {
        self.refs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    /// Read the bytes behind `key`.
    pub async fn get(&self, key: &str) -> StoreResult<Bytes> {
        self.get_with(key, &GetOptions::default()).await
    }

    /// Read the bytes behind `key` with extra request options.
    pub async fn get_with(&self, key: &str, options: &GetOptions) -> StoreResult<Bytes> {
        let reference = self.refs.get(key).ok_or_else(|| StoreError::NotFound {
            key: key.to_string(),
        })?;
        match reference {
            Reference::InlineLiteral(text) => Ok(Bytes::copy_from_slice(text.as_bytes())),
            Reference::InlineBase64(payload) => INLINE_BASE64
                .decode(payload)
                .map(Bytes::from)
                .map_err(|e| StoreError::InvalidBase64 {
                    key: key.to_string(),
                    reason: e.to_string(),
                }),
            Reference::UrlOnly { url } => self.read_remote(key, url.as_deref(), None, options).await,
            Reference::UrlRange {
                url,
                offset,
                length,
            } => {
                let range = ByteRange::new(*offset, *length);
                self.read_remote(key, url.as_deref(), Some(range), options)
                    .await
            }
        }
    }

    /// Always fails: the store is read-only.
    pub fn set(&self, _key: &str, _value: Bytes) -> StoreResult<()> {
        Err(StoreError::ReadOnly)
    }

    /// Always fails: the store is read-only.
    pub fn delete(&self, _key: &str) -> StoreResult<()> {
        Err(StoreError::ReadOnly)
    }

    async fn read_remote(
        &self,
        key: &str,
        url: Option<&str>,
        range: Option<ByteRange>,
        options: &GetOptions,
    ) -> StoreResult<Bytes> {
        let target = url
            .or(self.config.target.as_deref())
            .ok_or_else(|| StoreError::MissingTarget {
                key: key.to_string(),
            })?;
        let resolved = resolve_url(target, &self.config.object_storage)?;

        let mut request = FetchRequest::new(resolved);
        for (name, value) in &self.config.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        for (name, value) in &options.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(range) = range {
            match range.header_value() {
                Some(value) => request = request.header("Range", value),
                None if range.is_empty() => {
                    debug!(key, "zero-length range, skipping request");
                    return Ok(Bytes::new());
                }
                None => {
                    return Err(StoreError::InvalidUrl {
                        url: request.url,
                        reason: format!("byte range {range} overflows"),
                    })
                }
            }
        }

        debug!(key, url = %request.url, range = ?range, "fetching reference");
        let url = request.url.clone();
        let response = self.fetcher.fetch(request).await?;
        if response.is_success() {
            Ok(response.body)
        } else {
            warn!(key, url = %url, status = response.status, "reference request failed");
            Err(StoreError::RequestFailed {
                url,
                status: response.status,
            })
        }
    }
}

impl std::fmt::Debug for ReferenceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReferenceStore")
            .field("refs", &self.refs.len())
            .field("target", &self.config.target)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FetchResponse;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Records every request and answers from a canned table (404 otherwise).
    #[derive(Default)]
    struct RecordingFetcher {
        responses: HashMap<String, FetchResponse>,
        requests: Mutex<Vec<FetchRequest>>,
    }

    impl RecordingFetcher {
        fn respond(mut self, url: &str, status: u16, body: &'static [u8]) -> Self {
            self.responses
                .insert(url.to_string(), FetchResponse::new(status, Bytes::from_static(body)));
            self
        }

        fn requests(&self) -> Vec<FetchRequest> {
            self.requests.lock().expect("lock poisoned").clone()
        }
    }

    #[async_trait]
    impl Fetch for RecordingFetcher {
        async fn fetch(&self, request: FetchRequest) -> StoreResult<FetchResponse> {
            let response = self
                .responses
                .get(&request.url)
                .cloned()
                .unwrap_or_else(|| FetchResponse::new(404, Bytes::new()));
            self.requests.lock().expect("lock poisoned").push(request);
            Ok(response)
        }
    }

    struct FailingFetcher;

    #[async_trait]
    impl Fetch for FailingFetcher {
        async fn fetch(&self, _request: FetchRequest) -> StoreResult<FetchResponse> {
            Err(StoreError::Transport("connection refused".into()))
        }
    }

    fn sample_map() -> ReferenceMap {
        vec![
            ("key0", Reference::from_inline("data")),
            ("key1", Reference::from_inline("base64:aGVsbG8sIHdvcmxk")),
            ("key2", Reference::url_range(None, 1000, 100)),
            ("hello", Reference::from_inline("base64:aGVsbG8=")),
            ("range", Reference::url_range(Some("http://host/obj".into()), 1000, 100)),
            ("whole", Reference::url_only(Some("https://host/obj".into()))),
            ("s3", Reference::url_range(Some("s3://bucket/obj".into()), 0, 10)),
        ]
        .into_iter()
        .collect()
    }

    fn store_with(fetcher: Arc<RecordingFetcher>) -> ReferenceStore {
        ReferenceStore::new(sample_map(), fetcher)
    }

    #[tokio::test]
    async fn inline_literal() {
        let store = store_with(Arc::new(RecordingFetcher::default()));
        assert_eq!(store.get("key0").await.unwrap(), Bytes::from_static(b"data"));
    }

    #[tokio::test]
    async fn inline_base64() {
        let store = store_with(Arc::new(RecordingFetcher::default()));
        assert_eq!(store.get("key1").await.unwrap(), Bytes::from_static(b"hello, world"));
        assert_eq!(store.get("hello").await.unwrap(), Bytes::from_static(b"hello"));
    }

    #[tokio::test]
    async fn unpadded_base64() {
        let refs: ReferenceMap = vec![("k", Reference::from_inline("base64:aGVsbG8"))]
            .into_iter()
            .collect();
        let store = ReferenceStore::new(refs, Arc::new(RecordingFetcher::default()));
        assert_eq!(store.get("k").await.unwrap(), Bytes::from_static(b"hello"));
    }

    #[tokio::test]
    async fn invalid_base64() {
        let refs: ReferenceMap = vec![("k", Reference::from_inline("base64:@@@"))]
            .into_iter()
            .collect();
        let store = ReferenceStore::new(refs, Arc::new(RecordingFetcher::default()));
        assert!(matches!(
            store.get("k").await,
            Err(StoreError::InvalidBase64 { .. })
        ));
    }

    #[tokio::test]
    async fn missing_key() {
        let store = store_with(Arc::new(RecordingFetcher::default()));
        let err = store.get("nope").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn range_request_returns_partial_body() {
        let fetcher = Arc::new(RecordingFetcher::default().respond("http://host/obj", 206, b"chunk"));
        let store = store_with(fetcher.clone());
        assert_eq!(store.get("range").await.unwrap(), Bytes::from_static(b"chunk"));

        let requests = fetcher.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url, "http://host/obj");
        assert_eq!(requests[0].get_header("Range"), Some("bytes=1000-1099"));
    }

    #[tokio::test]
    async fn whole_object_has_no_range_header() {
        let fetcher = Arc::new(RecordingFetcher::default().respond("https://host/obj", 200, b"all"));
        let store = store_with(fetcher.clone());
        assert_eq!(store.get("whole").await.unwrap(), Bytes::from_static(b"all"));
        assert_eq!(fetcher.requests()[0].get_header("Range"), None);
    }

    #[tokio::test]
    async fn error_status_is_request_failed() {
        let store = store_with(Arc::new(RecordingFetcher::default()));
        let err = store.get("range").await.unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert!(matches!(err, StoreError::RequestFailed { status: 404, .. }));
    }

    #[tokio::test]
    async fn missing_target_without_default() {
        let fetcher = Arc::new(RecordingFetcher::default());
        let store = store_with(fetcher.clone());
        assert!(matches!(
            store.get("key2").await,
            Err(StoreError::MissingTarget { .. })
        ));
        assert!(fetcher.requests().is_empty());
    }

    #[tokio::test]
    async fn default_target_fills_null_url() {
        let fetcher = Arc::new(RecordingFetcher::default().respond("http://target/file", 206, b"x"));
        let store = store_with(fetcher.clone()).with_target("http://target/file");
        assert_eq!(store.target(), Some("http://target/file"));
        assert_eq!(store.get("key2").await.unwrap(), Bytes::from_static(b"x"));
        assert_eq!(fetcher.requests()[0].get_header("range"), Some("bytes=1000-1099"));
    }

    #[tokio::test]
    async fn object_storage_urls_are_rewritten() {
        let fetcher = Arc::new(
            RecordingFetcher::default().respond("https://bucket.s3.amazonaws.com/obj", 206, b"s3"),
        );
        let store = store_with(fetcher.clone());
        assert_eq!(store.get("s3").await.unwrap(), Bytes::from_static(b"s3"));
        assert_eq!(fetcher.requests()[0].get_header("Range"), Some("bytes=0-9"));
    }

    #[tokio::test]
    async fn unsupported_protocol() {
        let refs: ReferenceMap = vec![("k", Reference::url_only(Some("file:///etc/hosts".into())))]
            .into_iter()
            .collect();
        let fetcher = Arc::new(RecordingFetcher::default());
        let store = ReferenceStore::new(refs, fetcher.clone());
        assert!(matches!(
            store.get("k").await,
            Err(StoreError::ProtocolUnsupported { .. })
        ));
        assert!(fetcher.requests().is_empty());
    }

    #[tokio::test]
    async fn headers_are_merged() {
        let fetcher = Arc::new(RecordingFetcher::default().respond("http://host/obj", 206, b""));
        let config = StoreConfig::default().with_header("Authorization", "Bearer t");
        let store = store_with(fetcher.clone()).with_config(config);
        let options = GetOptions::default().header("X-Trace", "1");
        store.get_with("range", &options).await.unwrap();

        let req = &fetcher.requests()[0];
        assert_eq!(req.get_header("authorization"), Some("Bearer t"));
        assert_eq!(req.get_header("x-trace"), Some("1"));
        assert_eq!(req.get_header("range"), Some("bytes=1000-1099"));
    }

    #[tokio::test]
    async fn zero_length_range_skips_request() {
        let refs: ReferenceMap = vec![("k", Reference::url_range(Some("http://h/o".into()), 10, 0))]
            .into_iter()
            .collect();
        let fetcher = Arc::new(RecordingFetcher::default());
        let store = ReferenceStore::new(refs, fetcher.clone());
        assert!(store.get("k").await.unwrap().is_empty());
        assert!(fetcher.requests().is_empty());
    }

    #[tokio::test]
    async fn overflowing_range_is_rejected() {
        let refs: ReferenceMap = vec![("k", Reference::url_range(Some("http://h/o".into()), u64::MAX, 2))]
            .into_iter()
            .collect();
        let fetcher = Arc::new(RecordingFetcher::default());
        let store = ReferenceStore::new(refs, fetcher.clone());
        match store.get("k").await {
            Err(StoreError::InvalidUrl { url, .. }) => assert_eq!(url, "http://h/o"),
            other => panic!("expected InvalidUrl, got {other:?}"),
        }
        assert!(fetcher.requests().is_empty());
    }

    #[tokio::test]
    async fn object_storage_port_is_rejected() {
        let refs: ReferenceMap = vec![("k", Reference::url_only(Some("s3://bucket:9000/key".into())))]
            .into_iter()
            .collect();
        let fetcher = Arc::new(RecordingFetcher::default());
        let store = ReferenceStore::new(refs, fetcher.clone());
        assert!(matches!(store.get("k").await, Err(StoreError::InvalidUrl { .. })));
        assert!(fetcher.requests().is_empty());
    }

    #[tokio::test]
    async fn every_read_issues_a_request() {
        let fetcher = Arc::new(RecordingFetcher::default().respond("http://host/obj", 206, b"c"));
        let store = store_with(fetcher.clone());
        store.get("range").await.unwrap();
        store.get("range").await.unwrap();
        assert_eq!(fetcher.requests().len(), 2);
    }

    #[tokio::test]
    async fn transport_errors_propagate() {
        let store = ReferenceStore::new(sample_map(), Arc::new(FailingFetcher));
        assert!(matches!(store.get("range").await, Err(StoreError::Transport(_))));
        assert_eq!(store.get("key0").await.unwrap(), Bytes::from_static(b"data"));
    }

    #[tokio::test]
    async fn concurrent_reads() {
        let fetcher = Arc::new(
            RecordingFetcher::default()
                .respond("http://host/obj", 206, b"r")
                .respond("https://host/obj", 200, b"w"),
        );
        let store = store_with(fetcher.clone());
        let handles: Vec<_> = ["range", "whole", "key0", "range"]
            .into_iter()
            .map(|key| {
                let store = store.clone();
                tokio::spawn(async move { store.get(key).await })
            })
            .collect();
        let mut bodies = Vec::new();
        for handle in handles {
            bodies.push(handle.await.unwrap().unwrap());
        }
        assert_eq!(bodies, vec![
            Bytes::from_static(b"r"),
            Bytes::from_static(b"w"),
            Bytes::from_static(b"data"),
            Bytes::from_static(b"r"),
        ]);
        assert_eq!(fetcher.requests().len(), 3);
    }

    #[test]
    fn membership_and_order() {
        let store = store_with(Arc::new(RecordingFetcher::default()));
        assert!(store.has("key0"));
        assert!(!store.has("missing"));
        assert_eq!(
            store.keys().collect::<Vec<_>>(),
            vec!["key0", "key1", "key2", "hello", "range", "whole", "s3"]
        );
        assert_eq!(store.len(), 7);
        assert_eq!(
            store.reference("key2"),
            Some(&Reference::url_range(None, 1000, 100))
        );
    }

    #[test]
    fn writes_are_rejected() {
        let store = store_with(Arc::new(RecordingFetcher::default()));
        assert!(matches!(store.set("key0", Bytes::new()), Err(StoreError::ReadOnly)));
        assert!(matches!(store.delete("key0"), Err(StoreError::ReadOnly)));
        assert!(store.has("key0"));
    }

    #[tokio::test]
    async fn from_json_generated_range() {
        let spec = r#"{
          "version": 1,
          "templates": {"u": "server.domain/path"},
          "gen": [{
            "key": "gen_key{{i}}",
            "url": "http://{{u}}_{{i}}",
            "offset": "{{ (i + 1) * 1000 }}",
            "length": "1000",
            "dimensions": {"i": {"stop": 5}}
          }]
        }"#;
        let fetcher = Arc::new(
            RecordingFetcher::default().respond("http://server.domain/path_3", 206, b"g3"),
        );
        let store = ReferenceStore::from_json(spec, fetcher.clone()).unwrap();
        assert_eq!(store.len(), 5);
        assert_eq!(store.get("gen_key3").await.unwrap(), Bytes::from_static(b"g3"));
        assert_eq!(fetcher.requests()[0].get_header("Range"), Some("bytes=4000-4999"));
    }

    #[test]
    fn from_json_legacy_form() {
        let text = r#"{"key0":"data","key1":"base64:aGVsbG8sIHdvcmxk","key2":[null,1000,100]}"#;
        let store = ReferenceStore::from_json(text, Arc::new(RecordingFetcher::default())).unwrap();
        let expected: ReferenceMap = vec![
            ("key0", Reference::from_inline("data")),
            ("key1", Reference::from_inline("base64:aGVsbG8sIHdvcmxk")),
            ("key2", Reference::url_range(None, 1000, 100)),
        ]
        .into_iter()
        .collect();
        assert_eq!(store.references(), &expected);
    }

    #[test]
    fn from_json_malformed_spec() {
        let err = ReferenceStore::from_json(
            r#"{"version": 1, "refs": {"k": ["http://{{nope}}"]}}"#,
            Arc::new(RecordingFetcher::default()),
        )
        .unwrap_err();
        assert!(matches!(err, StoreError::Parse(_)));
    }

    #[tokio::test]
    async fn from_url_loads_spec() {
        let fetcher = Arc::new(
            RecordingFetcher::default()
                .respond("https://bucket.s3.amazonaws.com/refs.json", 200, br#"{"a": "inline"}"#),
        );
        let config = StoreConfig::default().with_target("http://fallback");
        let store = ReferenceStore::from_url("s3://bucket/refs.json", fetcher.clone(), config)
            .await
            .unwrap();
        assert_eq!(store.get("a").await.unwrap(), Bytes::from_static(b"inline"));
        assert_eq!(store.target(), Some("http://fallback"));
    }

    #[tokio::test]
    async fn from_url_failed_status() {
        let fetcher = Arc::new(RecordingFetcher::default());
        let err = ReferenceStore::from_url("http://missing/refs.json", fetcher, StoreConfig::default())
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(404));
    }
}
