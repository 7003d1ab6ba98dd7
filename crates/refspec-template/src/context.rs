//! Render context: the names an interpolation can see.

use std::collections::HashMap;

use crate::segment::is_template;

/// A value bound to a name in a [`RenderContext`].
#[derive(Clone, Debug, PartialEq)]
pub enum ContextValue {
    /// Plain text, substituted verbatim.
    Literal(String),
    /// A number. Usable in arithmetic; substituted via [`format_number`].
    Number(f64),
    /// A template function: the original template text, rendered on
    /// invocation against the context the caller supplies.
    Template(String),
}

impl ContextValue {
    /// Classify a declared template once: text containing `{{` becomes a
    /// [`ContextValue::Template`], anything else a literal.
    pub fn from_declaration(text: impl Into<String>) -> Self {
        let text = text.into();
        if is_template(&text) {
            ContextValue::Template(text)
        } else {
            ContextValue::Literal(text)
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            ContextValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<&str> for ContextValue {
    fn from(s: &str) -> Self {
        ContextValue::Literal(s.to_string())
    }
}

impl From<String> for ContextValue {
    fn from(s: String) -> Self {
        ContextValue::Literal(s)
    }
}

impl From<f64> for ContextValue {
    fn from(n: f64) -> Self {
        ContextValue::Number(n)
    }
}

/// Exact for magnitudes up to 2^53.
impl From<i64> for ContextValue {
    fn from(n: i64) -> Self {
        ContextValue::Number(n as f64)
    }
}

/// Render a number the way it appears in keys and URLs: integral values have
/// no fractional part (`10`, not `10.0`).
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// Name to [`ContextValue`] bindings, optionally layered over a parent.
///
/// Lookups check this layer first, then the parent chain. Generators use a
/// child layer per coordinate tuple so the spec-level context is shared
/// rather than copied.
#[derive(Clone, Debug, Default)]
pub struct RenderContext<'p> {
    values: HashMap<String, ContextValue>,
    parent: Option<&'p RenderContext<'p>>,
}

impl<'p> RenderContext<'p> {
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
            parent: None,
        }
    }

    /// An empty layer whose lookups fall through to `self`.
    pub fn child(&self) -> RenderContext<'_> {
        RenderContext {
            values: HashMap::new(),
            parent: Some(self),
        }
    }

    /// Bind `name` in this layer, shadowing any parent binding.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ContextValue>) {
        self.values.insert(name.into(), value.into());
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ContextValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ContextValue> {
        match self.values.get(name) {
            Some(v) => Some(v),
            None => self.parent.and_then(|p| p.get(name)),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

impl<K: Into<String>, V: Into<ContextValue>> FromIterator<(K, V)> for RenderContext<'_> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut ctx = RenderContext::new();
        for (k, v) in iter {
            ctx.insert(k, v);
        }
        ctx
    }
}
