//! Template renderer for reference specifications.
//!
//! Templates are plain text with `{{ ... }}` interpolations. Each
//! interpolation resolves, in order, as:
//!
//! 1. a direct context lookup (`{{ name }}`),
//! 2. a keyword-argument call of a template function (`{{ f(c='text', n=2) }}`),
//! 3. an arithmetic expression over numeric context values
//!    (`{{ (i + 1) * 1000 }}`).
//!
//! Anything else is an error; missing names never render as empty strings.
//!
//! The engine sits behind the [`Renderer`] trait so the spec parser can be
//! driven by an alternate implementation. [`BuiltinRenderer`] is the default.
//!
//! # Modules
//!
//! - [`context`]: [`RenderContext`] and [`ContextValue`]
//! - [`segment`]: single-pass `{{`/`}}` delimiter scan
//! - [`call`]: template-function call syntax
//! - [`expr`]: arithmetic evaluator (recursive descent, no dynamic eval)
//! - [`renderer`]: the [`Renderer`] trait and [`BuiltinRenderer`]

pub mod call;
pub mod context;
pub mod error;
pub mod expr;
pub mod renderer;
pub mod segment;

pub use context::{format_number, ContextValue, RenderContext};
pub use error::{RenderError, RenderResult};
pub use renderer::{render, BuiltinRenderer, Renderer, MAX_TEMPLATE_DEPTH};
pub use segment::{is_template, segments, Segment};
