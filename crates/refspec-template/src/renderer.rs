//! The [`Renderer`] trait and the built-in engine.

use tracing::trace;

use crate::call::parse_call;
use crate::context::{format_number, ContextValue, RenderContext};
use crate::error::{RenderError, RenderResult};
use crate::expr::evaluate;
use crate::segment::{is_template, segments, Segment};

/// Maximum depth of template functions rendering other template functions.
pub const MAX_TEMPLATE_DEPTH: usize = 64;

/// A template engine.
///
/// Implementations must be deterministic: the same template and context
/// always render to the same string. The spec parser only talks to this
/// trait, so an alternate engine can be swapped in.
pub trait Renderer: Send + Sync {
    /// Render `template` against `context`.
    fn render(&self, template: &str, context: &RenderContext<'_>) -> RenderResult<String>;
}

/// The built-in engine: direct lookup, then template call, then arithmetic.
#[derive(Clone, Copy, Debug, Default)]
pub struct BuiltinRenderer;

impl BuiltinRenderer {
    pub fn new() -> Self {
        Self
    }

    fn render_at(&self, template: &str, context: &RenderContext<'_>, depth: usize) -> RenderResult<String> {
        if depth > MAX_TEMPLATE_DEPTH {
            return Err(RenderError::RecursionLimit {
                limit: MAX_TEMPLATE_DEPTH,
            });
        }
        if !is_template(template) {
            return Ok(template.to_string());
        }
        let mut out = String::with_capacity(template.len());
        for segment in segments(template) {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Interpolation(inner) => {
                    out.push_str(&self.resolve(inner.trim(), context, depth)?);
                }
            }
        }
        Ok(out)
    }

    fn resolve(&self, inner: &str, context: &RenderContext<'_>, depth: usize) -> RenderResult<String> {
        if let Some(value) = context.get(inner) {
            return match value {
                ContextValue::Literal(s) => Ok(s.clone()),
                ContextValue::Number(n) => Ok(format_number(*n)),
                ContextValue::Template(t) => self.render_at(t, context, depth + 1),
            };
        }

        if let Some(call) = parse_call(inner) {
            let call = call?;
            trace!(function = call.name, args = call.kwargs.len(), "template call");
            return match context.get(call.name) {
                Some(ContextValue::Template(t)) => self.render_at(t, &call.context(), depth + 1),
                _ => Err(RenderError::UnknownFunction {
                    name: call.name.to_string(),
                }),
            };
        }

        if let Some(value) = evaluate(inner, context) {
            let value = value?;
            trace!(expr = inner, value, "arithmetic interpolation");
            return Ok(format_number(value));
        }

        Err(RenderError::Unresolved {
            expr: inner.to_string(),
        })
    }
}

impl Renderer for BuiltinRenderer {
    fn render(&self, template: &str, context: &RenderContext<'_>) -> RenderResult<String> {
        self.render_at(template, context, 0)
    }
}

/// Render with the [`BuiltinRenderer`].
pub fn render(template: &str, context: &RenderContext<'_>) -> RenderResult<String> {
    BuiltinRenderer.render(template, context)
}
