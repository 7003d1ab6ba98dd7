//! Spec parser: [`SpecDocument`] to [`ReferenceMap`].

use std::sync::Arc;

use refspec_template::{BuiltinRenderer, ContextValue, RenderContext, Renderer};
use refspec_types::{
    Generator, OrderedMap, RawRef, Reference, ReferenceMap, SpecDocument, SpecV1,
};
use serde_json::Value;
use tracing::debug;

use crate::dims::DimensionProduct;
use crate::error::{ParseError, ParseResult};

/// Parses reference specifications with a pluggable template engine.
#[derive(Clone)]
pub struct SpecParser {
    renderer: Arc<dyn Renderer>,
}

impl SpecParser {
    /// A parser backed by the [`BuiltinRenderer`].
    pub fn new() -> Self {
        Self::with_renderer(Arc::new(BuiltinRenderer))
    }

    /// A parser backed by an alternate template engine.
    pub fn with_renderer(renderer: Arc<dyn Renderer>) -> Self {
        Self { renderer }
    }

    /// Decode JSON text and parse it.
    pub fn parse_json(&self, text: &str) -> ParseResult<ReferenceMap> {
        let spec = SpecDocument::from_json_str(text)?;
        self.parse(&spec)
    }

    /// Parse a decoded spec. Any failure aborts the whole parse.
    pub fn parse(&self, spec: &SpecDocument) -> ParseResult<ReferenceMap> {
        match spec {
            SpecDocument::Legacy(refs) => self.parse_legacy(refs),
            SpecDocument::V1(spec) => self.parse_v1(spec),
        }
    }

    /// Legacy entries are classified as-is; nothing is rendered.
    fn parse_legacy(&self, refs: &OrderedMap<RawRef>) -> ParseResult<ReferenceMap> {
        let mut map = ReferenceMap::new();
        for (key, raw) in refs.iter() {
            map.insert(key, self.explicit_ref(key, raw, None)?);
        }
        debug!(refs = map.len(), "parsed legacy reference spec");
        Ok(map)
    }

    fn parse_v1(&self, spec: &SpecV1) -> ParseResult<ReferenceMap> {
        let context = base_context(&spec.templates);

        let mut map = ReferenceMap::new();
        for (key, raw) in spec.refs.iter() {
            map.insert(key, self.explicit_ref(key, raw, Some(&context))?);
        }
        let explicit = map.len();

        let mut generated = Vec::new();
        for (index, generator) in spec.gen.iter().enumerate() {
            let before = generated.len();
            self.expand_generator(index, generator, &context, &mut generated)?;
            debug!(generator = index, count = generated.len() - before, "expanded generator");
        }
        let generated_count = generated.len();
        let overwritten = merge_generated(&mut map, generated);

        debug!(
            explicit,
            generated = generated_count,
            overwritten,
            total = map.len(),
            "parsed reference spec"
        );
        Ok(map)
    }

    /// Classify one explicit ref. URLs are rendered only when a context is
    /// given and the URL contains an interpolation marker.
    fn explicit_ref(
        &self,
        key: &str,
        raw: &RawRef,
        context: Option<&RenderContext<'_>>,
    ) -> ParseResult<Reference> {
        let items = match raw {
            RawRef::Inline(text) => return Ok(Reference::from_inline(text.as_str())),
            RawRef::Array(items) => items,
        };
        let url = match items.first() {
            Some(Value::Null) => None,
            Some(Value::String(url)) => match context {
                Some(ctx) if refspec_template::is_template(url) => {
                    Some(self.renderer.render(url, ctx)?)
                }
                _ => Some(url.clone()),
            },
            Some(other) => {
                return Err(invalid_ref(key, format!("url must be a string or null, got {other}")))
            }
            None => return Err(invalid_ref(key, "empty ref array".to_string())),
        };
        match items.len() {
            1 => Ok(Reference::url_only(url)),
            3 => {
                let offset = non_negative(key, "offset", &items[1])?;
                let length = non_negative(key, "length", &items[2])?;
                Ok(Reference::url_range(url, offset, length))
            }
            n => Err(invalid_ref(
                key,
                format!("expected [url] or [url, offset, length], got {n} elements"),
            )),
        }
    }

    fn expand_generator(
        &self,
        index: usize,
        generator: &Generator,
        context: &RenderContext<'_>,
        out: &mut Vec<(String, Reference)>,
    ) -> ParseResult<()> {
        let range_templates = match (&generator.offset, &generator.length) {
            (Some(offset), Some(length)) => Some((offset.as_str(), length.as_str())),
            (None, None) => None,
            _ => {
                return Err(ParseError::InvalidGenerator {
                    index,
                    reason: "offset and length must be declared together".to_string(),
                })
            }
        };

        let product = DimensionProduct::new(&generator.dimensions)?;
        for coordinate in &product {
            let mut layer = context.child();
            for (name, value) in coordinate.iter() {
                layer.insert(name, value);
            }

            let key = self.renderer.render(&generator.key, &layer)?;
            let url = self.renderer.render(&generator.url, &layer)?;
            let reference = match range_templates {
                Some((offset, length)) => {
                    let offset = self.renderer.render(offset, &layer)?;
                    let length = self.renderer.render(length, &layer)?;
                    let offset = parse_integer(&key, "offset", offset)?;
                    let length = parse_integer(&key, "length", length)?;
                    Reference::url_range(Some(url), offset, length)
                }
                None => Reference::url_only(Some(url)),
            };
            out.push((key, reference));
        }
        Ok(())
    }
}

impl Default for SpecParser {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SpecParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpecParser").finish_non_exhaustive()
    }
}

/// Parse with the built-in engine.
pub fn parse(spec: &SpecDocument) -> ParseResult<ReferenceMap> {
    SpecParser::new().parse(spec)
}

/// Decode and parse JSON text with the built-in engine.
pub fn parse_json(text: &str) -> ParseResult<ReferenceMap> {
    SpecParser::new().parse_json(text)
}

/// Spec-level context: each template is classified once as a plain string or
/// a template function.
fn base_context(templates: &OrderedMap<String>) -> RenderContext<'static> {
    templates
        .iter()
        .map(|(name, text)| (name, ContextValue::from_declaration(text.as_str())))
        .collect()
}

/// Generated entries are merged after explicit refs: a generated key replaces
/// an explicit ref of the same name. Returns how many keys were replaced.
fn merge_generated(map: &mut ReferenceMap, generated: Vec<(String, Reference)>) -> usize {
    let mut overwritten = 0;
    for (key, reference) in generated {
        if map.insert(key, reference).is_some() {
            overwritten += 1;
        }
    }
    overwritten
}

fn parse_integer(key: &str, field: &'static str, value: String) -> ParseResult<u64> {
    match value.trim().parse::<u64>() {
        Ok(n) => Ok(n),
        Err(_) => Err(ParseError::InvalidInteger {
            key: key.to_string(),
            field,
            value,
        }),
    }
}

fn non_negative(key: &str, field: &str, value: &Value) -> ParseResult<u64> {
    value
        .as_u64()
        .ok_or_else(|| invalid_ref(key, format!("{field} must be a non-negative integer, got {value}")))
}

fn invalid_ref(key: &str, reason: String) -> ParseError {
    ParseError::InvalidRef {
        key: key.to_string(),
        reason,
    }
}
