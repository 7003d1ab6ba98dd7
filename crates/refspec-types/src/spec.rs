//! The reference specification input model.
//!
//! Two shapes are accepted:
//!
//! - **Legacy flat form**: a JSON object mapping keys directly to raw refs
//!   (`"text"`, `[url]`, or `[url, offset, length]`).
//! - **Versioned form**: `{"version": 1, "templates": {..}, "gen": [..], "refs": {..}}`.
//!
//! Object order is preserved throughout ([`OrderedMap`]) because dimension
//! declaration order defines iteration order, and ref order defines key order.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{TypeError, TypeResult};
use crate::ordered::OrderedMap;

/// A decoded reference specification.
#[derive(Clone, Debug, PartialEq)]
pub enum SpecDocument {
    /// Flat `key -> raw ref` mapping, no templating.
    Legacy(OrderedMap<RawRef>),
    /// Versioned spec with templates and generators.
    V1(SpecV1),
}

#[derive(Deserialize)]
struct VersionProbe {
    version: Option<serde_json::Value>,
}

impl SpecDocument {
    /// Decode a spec from JSON text, detecting the shape by the presence of a
    /// top-level `"version"` field.
    pub fn from_json_str(text: &str) -> TypeResult<Self> {
        Self::from_slice(text.as_bytes())
    }

    /// Decode a spec from JSON bytes.
    pub fn from_slice(bytes: &[u8]) -> TypeResult<Self> {
        let probe: VersionProbe =
            serde_json::from_slice(bytes).map_err(|e| TypeError::Json(e.to_string()))?;
        match probe.version {
            None => {
                let refs = serde_json::from_slice(bytes).map_err(|e| TypeError::Json(e.to_string()))?;
                Ok(SpecDocument::Legacy(refs))
            }
            Some(version) => {
                let version = version
                    .as_u64()
                    .ok_or_else(|| TypeError::Json(format!("version must be an integer, got {version}")))?;
                if version != 1 {
                    return Err(TypeError::UnsupportedVersion(version));
                }
                let spec = serde_json::from_slice(bytes).map_err(|e| TypeError::Json(e.to_string()))?;
                Ok(SpecDocument::V1(spec))
            }
        }
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self, SpecDocument::Legacy(_))
    }
}

/// Versioned (`"version": 1`) spec.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpecV1 {
    pub version: u64,
    /// Named templates; values containing `{{` are template functions, the
    /// rest plain strings.
    #[serde(default)]
    pub templates: OrderedMap<String>,
    /// Generators, expanded after the explicit refs.
    #[serde(default)]
    pub gen: Vec<Generator>,
    /// Explicit refs.
    #[serde(default)]
    pub refs: OrderedMap<RawRef>,
}

/// A ref as written in a spec document, before classification.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawRef {
    /// Inline literal text, or `base64:`-prefixed binary.
    Inline(String),
    /// `[url]` or `[url, offset, length]`; `url` may be `null`.
    Array(Vec<serde_json::Value>),
}

/// Programmatic producer of many refs over a Cartesian product of dimensions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Generator {
    /// Key template.
    pub key: String,
    /// URL template.
    pub url: String,
    #[serde(default, deserialize_with = "template_text")]
    pub offset: Option<String>,
    #[serde(default, deserialize_with = "template_text")]
    pub length: Option<String>,
    /// Named axes, first-declared outermost.
    #[serde(default)]
    pub dimensions: OrderedMap<Dimension>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TemplateText {
    Text(String),
    Integer(u64),
}

/// Offset/length templates are strings, but plain integers are accepted too.
fn template_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(
        Option::<TemplateText>::deserialize(deserializer)?.map(|t| match t {
            TemplateText::Text(s) => s,
            TemplateText::Integer(n) => n.to_string(),
        }),
    )
}

/// One generator axis.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Dimension {
    /// Explicit ordered values.
    Values(Vec<i64>),
    /// Arithmetic progression.
    Range(Range),
}

/// Half-open arithmetic progression `start, start+step, ...` up to `stop`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    #[serde(default)]
    pub start: i64,
    pub stop: i64,
    #[serde(default = "default_step")]
    pub step: i64,
}

fn default_step() -> i64 {
    1
}

impl Range {
    /// `0..stop` by 1.
    pub fn to(stop: i64) -> Self {
        Self {
            start: 0,
            stop,
            step: 1,
        }
    }
}
