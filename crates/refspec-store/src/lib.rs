//! Read-only reference store.
//!
//! [`ReferenceStore`] wraps an immutable [`ReferenceMap`](refspec_types::ReferenceMap)
//! and serves bytes per logical key:
//!
//! - inline literals are returned as their UTF-8 bytes,
//! - `base64:` inline entries are decoded,
//! - remote entries become a fetch of the resolved URL, restricted by a
//!   `Range: bytes=<first>-<last>` header when the entry has an offset and
//!   length.
//!
//! # Design Rules
//!
//! 1. The map never changes after construction; `set`/`delete` always fail.
//! 2. Reads share no mutable state, so any number may run concurrently.
//! 3. No caching and no retries: every remote read issues exactly one request
//!    and every failure reaches the caller.
//! 4. The HTTP transport is injected through the [`Fetch`] trait. The
//!    `reqwest` feature provides [`ReqwestFetcher`].
//!
//! # Modules
//!
//! - [`error`]: [`StoreError`] and [`StoreResult`]
//! - [`config`]: [`StoreConfig`] (default target, headers, object-storage endpoints)
//! - [`fetch`]: the [`Fetch`] capability and its request/response types
//! - [`resolve`]: scheme handling and object-storage URL rewriting
//! - [`store`]: [`ReferenceStore`]

pub mod config;
pub mod error;
pub mod fetch;
#[cfg(feature = "reqwest")]
pub mod http;
pub mod resolve;
pub mod store;

pub use config::{ObjectStorageConfig, StoreConfig};
pub use error::{StoreError, StoreResult};
pub use fetch::{Fetch, FetchRequest, FetchResponse};
#[cfg(feature = "reqwest")]
pub use http::ReqwestFetcher;
pub use resolve::resolve_url;
pub use store::{GetOptions, ReferenceStore};
