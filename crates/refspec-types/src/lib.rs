//! Foundation types for refspec.
//!
//! A reference specification describes a virtual collection of named byte
//! ranges. Each logical key points at inline content or at a byte range of a
//! remote object. This crate holds the model shared by
//! the spec parser and the read-only reference store.
//!
//! # Key Types
//!
//! - [`Reference`]: Resolved pointer to bytes (inline literal, inline base64,
//!   whole remote object, or remote byte range)
//! - [`ReferenceMap`]: Insertion-ordered, key-unique map of references
//! - [`ByteRange`]: `offset`/`length` pair and its HTTP `Range` header form
//! - [`SpecDocument`]: Input spec, either legacy flat or versioned
//! - [`Generator`] / [`Dimension`] / [`Range`]: Parametric reference generation
//! - [`OrderedMap`]: Declaration-order map used wherever JSON object order matters

pub mod error;
pub mod ordered;
pub mod reference;
pub mod spec;

pub use error::{TypeError, TypeResult};
pub use ordered::OrderedMap;
pub use reference::{ByteRange, Reference, ReferenceMap, BASE64_PREFIX};
pub use spec::{Dimension, Generator, Range, RawRef, SpecDocument, SpecV1};
