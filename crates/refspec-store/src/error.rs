//! Error types for store reads.

use refspec_parse::ParseError;
use thiserror::Error;

/// Errors from reference store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The key is not in the reference map.
    #[error("key not found: {key}")]
    NotFound { key: String },

    /// The entry has no URL and the store has no default target.
    #[error("no target url for key {key}: entry has no url and no default target is configured")]
    MissingTarget { key: String },

    /// The URL scheme is not HTTP(S) or a recognized object-storage scheme.
    #[error("protocol not supported: {scheme:?}")]
    ProtocolUnsupported { scheme: String },

    /// A recognized scheme with an unusable location (e.g. no bucket).
    #[error("invalid url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The remote answered with a status other than 200 or 206.
    #[error("request for {url} failed with status {status}")]
    RequestFailed { url: String, status: u16 },

    /// An inline `base64:` entry could not be decoded.
    #[error("invalid base64 payload for key {key}: {reason}")]
    InvalidBase64 { key: String, reason: String },

    /// The store is read-only.
    #[error("store is read-only")]
    ReadOnly,

    /// The fetch capability failed before producing a response.
    #[error("transport error: {0}")]
    Transport(String),

    #[error("spec error: {0}")]
    Parse(#[from] ParseError),

    #[error("configuration error: {0}")]
    Config(String),
}

impl StoreError {
    /// HTTP status carried by [`StoreError::RequestFailed`].
    pub fn status(&self) -> Option<u16> {
        match self {
            StoreError::RequestFailed { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
