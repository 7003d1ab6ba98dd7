//! Resolved references and the reference map.
//!
//! A [`Reference`] is what a logical key resolves to after parsing. The shape
//! of each entry is decided once, at parse time, so the store never has to
//! inspect raw JSON to know how to read bytes.

use std::fmt;

use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};

use crate::ordered::OrderedMap;

/// Prefix marking an inline string as base64-encoded binary content.
pub const BASE64_PREFIX: &str = "base64:";

/// A named pointer to bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reference {
    /// Inline text, served as its UTF-8 encoding.
    InlineLiteral(String),
    /// Inline binary content. Holds the encoded payload (without the
    /// `base64:` prefix); decoding happens at read time.
    InlineBase64(String),
    /// A whole remote object. `None` means "use the store's default target".
    UrlOnly { url: Option<String> },
    /// A byte range of a remote object. `None` means "use the store's default
    /// target".
    UrlRange {
        url: Option<String>,
        offset: u64,
        length: u64,
    },
}

impl Reference {
    /// Classify an inline string: `base64:`-prefixed text becomes
    /// [`Reference::InlineBase64`], anything else an inline literal.
    pub fn from_inline(text: impl Into<String>) -> Self {
        let text = text.into();
        match text.strip_prefix(BASE64_PREFIX) {
            Some(payload) => Reference::InlineBase64(payload.to_string()),
            None => Reference::InlineLiteral(text),
        }
    }

    pub fn url_only(url: Option<String>) -> Self {
        Reference::UrlOnly { url }
    }

    pub fn url_range(url: Option<String>, offset: u64, length: u64) -> Self {
        Reference::UrlRange {
            url,
            offset,
            length,
        }
    }

    /// Returns `true` if the bytes are held inline in the map.
    pub fn is_inline(&self) -> bool {
        matches!(
            self,
            Reference::InlineLiteral(_) | Reference::InlineBase64(_)
        )
    }

    /// The URL slot of a remote reference. `None` for inline references and
    /// for remote references deferring to the default target.
    pub fn url(&self) -> Option<&str> {
        match self {
            Reference::UrlOnly { url } | Reference::UrlRange { url, .. } => url.as_deref(),
            _ => None,
        }
    }

    /// The byte range of a [`Reference::UrlRange`].
    pub fn byte_range(&self) -> Option<ByteRange> {
        match self {
            Reference::UrlRange { offset, length, .. } => Some(ByteRange::new(*offset, *length)),
            _ => None,
        }
    }
}

/// Serializes to the JSON ref shape: `"text"`, `"base64:..."`, `[url]`
/// or `[url, offset, length]`.
impl Serialize for Reference {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Reference::InlineLiteral(text) => serializer.serialize_str(text),
            Reference::InlineBase64(payload) => {
                serializer.serialize_str(&format!("{BASE64_PREFIX}{payload}"))
            }
            Reference::UrlOnly { url } => {
                let mut seq = serializer.serialize_seq(Some(1))?;
                seq.serialize_element(url)?;
                seq.end()
            }
            Reference::UrlRange {
                url,
                offset,
                length,
            } => {
                let mut seq = serializer.serialize_seq(Some(3))?;
                seq.serialize_element(url)?;
                seq.serialize_element(offset)?;
                seq.serialize_element(length)?;
                seq.end()
            }
        }
    }
}

/// A contiguous byte range within a remote object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ByteRange {
    pub offset: u64,
    pub length: u64,
}

impl ByteRange {
    pub fn new(offset: u64, length: u64) -> Self {
        Self { offset, length }
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Inclusive index of the last byte, or `None` for an empty range.
    pub fn last_byte(&self) -> Option<u64> {
        if self.length == 0 {
            return None;
        }
        self.offset.checked_add(self.length - 1)
    }

    /// Value of the HTTP `Range` header selecting this range
    /// (`bytes=<first>-<last>`), or `None` if no such header can be formed.
    pub fn header_value(&self) -> Option<String> {
        self.last_byte()
            .map(|last| format!("bytes={}-{}", self.offset, last))
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+{}", self.offset, self.length)
    }
}

/// Logical key to [`Reference`] mapping.
///
/// Keys are unique; inserting an existing key replaces its reference and
/// keeps its position. Built once by the parser and read-only afterwards.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ReferenceMap {
    entries: OrderedMap<Reference>,
}

impl ReferenceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a reference, returning the one it replaced (last write wins).
    pub fn insert(&mut self, key: impl Into<String>, reference: Reference) -> Option<Reference> {
        self.entries.insert(key, reference)
    }

    pub fn get(&self, key: &str) -> Option<&Reference> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Logical keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Reference)> + '_ {
        self.entries.iter()
    }
}

impl<K: Into<String>> FromIterator<(K, Reference)> for ReferenceMap {
    fn from_iter<I: IntoIterator<Item = (K, Reference)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
