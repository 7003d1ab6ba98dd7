//! Reference specification parser.
//!
//! Turns a [`SpecDocument`](refspec_types::SpecDocument) into an immutable
//! [`ReferenceMap`](refspec_types::ReferenceMap):
//!
//! 1. Declared templates become the base render context (plain strings or
//!    template functions, decided once).
//! 2. Explicit refs are classified; URLs containing `{{` are rendered.
//! 3. Each generator is expanded over the Cartesian product of its
//!    dimensions ([`DimensionProduct`]), rendering key, URL, and optional
//!    offset/length per coordinate.
//! 4. Generated entries are merged over the explicit ones, last write wins.
//!
//! Parsing is all-or-nothing: any error aborts and no partial map escapes.

pub mod dims;
pub mod error;
pub mod parser;

pub use dims::{Axis, Coordinate, Coordinates, DimensionProduct, MAX_COORDINATE};
pub use error::{GeneratorError, ParseError, ParseResult};
pub use parser::{parse, parse_json, SpecParser};
