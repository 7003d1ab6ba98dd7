//! Store configuration: default target, headers, object-storage endpoints.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Configuration for a [`ReferenceStore`](crate::ReferenceStore).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Default target URL for entries whose url is `null`.
    pub target: Option<String>,
    /// Headers sent with every remote read.
    pub headers: BTreeMap<String, String>,
    /// Endpoints used to rewrite object-storage URLs.
    pub object_storage: ObjectStorageConfig,
}

impl StoreConfig {
    /// Load a configuration from TOML.
    ///
    /// ```
    /// use refspec_store::StoreConfig;
    ///
    /// let config = StoreConfig::from_toml_str(r#"
    ///     target = "https://data.example.org/archive.bin"
    ///
    ///     [headers]
    ///     Authorization = "Bearer token"
    /// "#).unwrap();
    /// assert_eq!(config.target.as_deref(), Some("https://data.example.org/archive.bin"));
    /// ```
    pub fn from_toml_str(text: &str) -> StoreResult<Self> {
        toml::from_str(text).map_err(|e| StoreError::Config(e.to_string()))
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// Object-storage endpoints. `{bucket}` / `{account}` placeholders are
/// substituted; an endpoint without a placeholder is used path-style.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectStorageConfig {
    /// Endpoint for `s3://bucket/key`.
    pub s3_endpoint: String,
    /// Endpoint for `gs://bucket/key` and `gcs://bucket/key`.
    pub gcs_endpoint: String,
    /// Endpoint for `az://account/container/key`.
    pub azure_endpoint: String,
}

impl Default for ObjectStorageConfig {
    fn default() -> Self {
        Self {
            s3_endpoint: "https://{bucket}.s3.amazonaws.com".to_string(),
            gcs_endpoint: "https://storage.googleapis.com".to_string(),
            azure_endpoint: "https://{account}.blob.core.windows.net".to_string(),
        }
    }
}
