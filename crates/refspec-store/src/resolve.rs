//! URL scheme handling.
//!
//! `http` and `https` pass through unchanged. Short-hand object-storage
//! schemes are rewritten to HTTPS:
//!
//! | Input | Output (default endpoints) |
//! |---|---|
//! | `s3://bucket/key` | `https://bucket.s3.amazonaws.com/key` |
//! | `gs://bucket/key`, `gcs://bucket/key` | `https://storage.googleapis.com/bucket/key` |
//! | `az://account/container/key` | `https://account.blob.core.windows.net/container/key` |
//!
//! Query and fragment carry over to the rewritten URL. Object-storage URLs
//! with userinfo or a port are rejected. Every other scheme is rejected.

use url::Url;

use crate::config::ObjectStorageConfig;
use crate::error::{StoreError, StoreResult};

/// Resolve `raw` to something fetchable over HTTP(S).
pub fn resolve_url(raw: &str, endpoints: &ObjectStorageConfig) -> StoreResult<String> {
    let url = Url::parse(raw).map_err(|e| match e {
        url::ParseError::RelativeUrlWithoutBase => StoreError::ProtocolUnsupported {
            scheme: String::new(),
        },
        other => invalid(raw, other.to_string()),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(raw.to_string()),
        "s3" => rewrite(raw, &url, &endpoints.s3_endpoint, "{bucket}", "bucket"),
        "gs" | "gcs" => rewrite(raw, &url, &endpoints.gcs_endpoint, "{bucket}", "bucket"),
        "az" => rewrite(raw, &url, &endpoints.azure_endpoint, "{account}", "account"),
        scheme => Err(StoreError::ProtocolUnsupported {
            scheme: scheme.to_string(),
        }),
    }
}

/// Move the path, query and fragment of `url` under `endpoint`, with the
/// host of `url` (bucket or account) substituted for `placeholder` or
/// appended path-style.
fn rewrite(
    raw: &str,
    url: &Url,
    endpoint: &str,
    placeholder: &str,
    what: &str,
) -> StoreResult<String> {
    let root = match url.host_str() {
        Some(root) if !root.is_empty() => root,
        _ => return Err(invalid(raw, format!("missing {what}"))),
    };
    if !url.username().is_empty() || url.password().is_some() {
        return Err(invalid(raw, "userinfo is not allowed".to_string()));
    }
    if url.port().is_some() {
        return Err(invalid(raw, format!("port is not allowed after the {what}")));
    }

    let base = if endpoint.contains(placeholder) {
        endpoint.replace(placeholder, root)
    } else {
        format!("{}/{}", endpoint.trim_end_matches('/'), root)
    };
    let mut out = Url::parse(&base).map_err(|e| invalid(raw, format!("endpoint {base:?}: {e}")))?;
    let path = format!("{}{}", out.path().trim_end_matches('/'), url.path());
    out.set_path(&path);
    out.set_query(url.query());
    out.set_fragment(url.fragment());
    Ok(out.into())
}

fn invalid(raw: &str, reason: String) -> StoreError {
    StoreError::InvalidUrl {
        url: raw.to_string(),
        reason,
    }
}
