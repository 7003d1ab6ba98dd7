//! Template-function call syntax: `NAME(key=value, ...)`.
//!
//! Arguments are keyword-only. A value is either a number (`n=199`,
//! `x=1.5`) or a single- or double-quoted string (`c='text'`, `foo="bar"`).
//! Whitespace is allowed around names, `=`, and commas; trailing commas after
//! the closing parenthesis are ignored.

use crate::context::{ContextValue, RenderContext};
use crate::error::{RenderError, RenderResult};

/// A parsed call.
#[derive(Clone, Debug, PartialEq)]
pub struct Call<'a> {
    pub name: &'a str,
    pub kwargs: Vec<(&'a str, ContextValue)>,
}

impl Call<'_> {
    /// The context the called template is rendered against: just the
    /// keyword arguments.
    pub fn context(&self) -> RenderContext<'static> {
        self.kwargs
            .iter()
            .map(|(k, v)| (*k, v.clone()))
            .collect()
    }
}

/// Parse `text` as a call.
///
/// Returns `None` if `text` does not start with `NAME(`, so the caller can
/// try other interpretations. Once the `NAME(` prefix matches, syntax
/// problems are reported as [`RenderError::MalformedCall`].
pub fn parse_call(text: &str) -> Option<RenderResult<Call<'_>>> {
    let mut cur = Cursor::new(text);
    let name = cur.identifier()?;
    if !cur.eat('(') {
        return None;
    }
    Some(parse_arguments(&mut cur).map(|kwargs| Call { name, kwargs }))
}

fn parse_arguments<'a>(cur: &mut Cursor<'a>) -> RenderResult<Vec<(&'a str, ContextValue)>> {
    let mut kwargs = Vec::new();
    loop {
        cur.skip_whitespace();
        if cur.eat(')') {
            break;
        }
        let key = cur
            .word()
            .ok_or_else(|| cur.error("expected argument name"))?;
        cur.skip_whitespace();
        if !cur.eat('=') {
            return Err(cur.error(&format!("expected '=' after argument {key:?}")));
        }
        cur.skip_whitespace();
        let value = cur.value()?;
        kwargs.push((key, value));
        cur.skip_whitespace();
        if cur.eat(',') {
            continue;
        }
        if cur.eat(')') {
            break;
        }
        return Err(match cur.peek() {
            Some(c) => cur.error(&format!("unexpected character {c:?} in argument list")),
            None => cur.error("unclosed argument list"),
        });
    }
    if !cur.remaining().chars().all(|c| c == ',' || c.is_whitespace()) {
        return Err(cur.error("unexpected input after call"));
    }
    Ok(kwargs)
}

struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn remaining(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        let rest = self.remaining();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let rest = self.remaining();
        let len = rest.find(|c: char| !pred(c)).unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    /// `[A-Za-z_][A-Za-z0-9_]*`
    fn identifier(&mut self) -> Option<&'a str> {
        match self.peek() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
            _ => return None,
        }
        Some(self.take_while(|c| c.is_ascii_alphanumeric() || c == '_'))
    }

    /// `[A-Za-z0-9_]+`
    fn word(&mut self) -> Option<&'a str> {
        let w = self.take_while(|c| c.is_ascii_alphanumeric() || c == '_');
        (!w.is_empty()).then_some(w)
    }

    fn value(&mut self) -> RenderResult<ContextValue> {
        match self.peek() {
            Some(quote @ ('\'' | '"')) => {
                self.pos += 1;
                let body = self.take_while(|c| c != quote);
                if !self.eat(quote) {
                    return Err(self.error("unterminated string argument"));
                }
                Ok(ContextValue::Literal(body.to_string()))
            }
            Some(c) if c.is_ascii_digit() || c == '.' => {
                let digits = self.take_while(|c| c.is_ascii_digit() || c == '.');
                digits
                    .parse::<f64>()
                    .map(ContextValue::Number)
                    .map_err(|_| self.error(&format!("invalid number {digits:?}")))
            }
            _ => Err(self.error("expected a number or a quoted string")),
        }
    }

    fn error(&self, reason: &str) -> RenderError {
        RenderError::MalformedCall {
            expr: self.src.to_string(),
            reason: reason.to_string(),
        }
    }
}
