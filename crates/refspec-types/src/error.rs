use thiserror::Error;

/// Errors produced while decoding a spec document.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid spec JSON: {0}")]
    Json(String),

    #[error("unsupported spec version: {0}")]
    UnsupportedVersion(u64),
}

pub type TypeResult<T> = Result<T, TypeError>;
