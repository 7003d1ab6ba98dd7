//! Arithmetic over numeric context values.
//!
//! The accepted alphabet is ASCII letters, digits, `(`, `)`, `*`, `/`, `+`,
//! `-` and space. Identifiers (`[A-Za-z][A-Za-z0-9]*`) must name numbers in
//! the context. Evaluation is a recursive-descent parse with the usual
//! precedence (`*` `/` over `+` `-`), left-associative, with unary sign.

use crate::context::{ContextValue, RenderContext};
use crate::error::{RenderError, RenderResult};

/// Returns `true` if every character of `text` is in the expression alphabet.
pub fn is_expression(text: &str) -> bool {
    text.chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '(' | ')' | '*' | '/' | '+' | '-' | ' '))
}

/// Evaluate `text` against `context`.
///
/// Returns `None` if `text` contains characters outside the expression
/// alphabet.
pub fn evaluate(text: &str, context: &RenderContext<'_>) -> Option<RenderResult<f64>> {
    if !is_expression(text) {
        return None;
    }
    Some(tokenize(text, context).and_then(|tokens| {
        let mut parser = Parser {
            tokens: &tokens,
            pos: 0,
            src: text,
        };
        let value = parser.expr()?;
        if parser.pos != tokens.len() {
            return Err(parser.error("unexpected trailing input"));
        }
        Ok(value)
    }))
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Token {
    Num(f64),
    Op(char),
    Open,
    Close,
}

fn tokenize(text: &str, context: &RenderContext<'_>) -> RenderResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();
    while let Some((start, c)) = chars.next() {
        match c {
            ' ' => {}
            '(' => tokens.push(Token::Open),
            ')' => tokens.push(Token::Close),
            '+' | '-' | '*' | '/' => tokens.push(Token::Op(c)),
            c if c.is_ascii_alphabetic() => {
                let mut end = start + 1;
                while let Some(&(i, next)) = chars.peek() {
                    if !next.is_ascii_alphanumeric() {
                        break;
                    }
                    end = i + 1;
                    chars.next();
                }
                tokens.push(Token::Num(lookup(&text[start..end], context)?));
            }
            _ => {
                let mut end = start + 1;
                while let Some(&(i, next)) = chars.peek() {
                    if !next.is_ascii_digit() {
                        break;
                    }
                    end = i + 1;
                    chars.next();
                }
                let literal = &text[start..end];
                let value = literal.parse::<f64>().map_err(|e| RenderError::Expression {
                    expr: text.to_string(),
                    reason: format!("invalid number {literal:?}: {e}"),
                })?;
                tokens.push(Token::Num(value));
            }
        }
    }
    Ok(tokens)
}

fn lookup(name: &str, context: &RenderContext<'_>) -> RenderResult<f64> {
    match context.get(name) {
        None => Err(RenderError::UnknownIdentifier {
            name: name.to_string(),
        }),
        Some(ContextValue::Number(n)) => Ok(*n),
        Some(_) => Err(RenderError::NotANumber {
            name: name.to_string(),
        }),
    }
}

struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
    src: &'t str,
}

impl Parser<'_> {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<Token> {
        let t = self.peek();
        self.pos += 1;
        t
    }

    // expr := term (('+' | '-') term)*
    fn expr(&mut self) -> RenderResult<f64> {
        let mut acc = self.term()?;
        while let Some(Token::Op(op @ ('+' | '-'))) = self.peek() {
            self.pos += 1;
            let rhs = self.term()?;
            acc = if op == '+' { acc + rhs } else { acc - rhs };
        }
        Ok(acc)
    }

    // term := factor (('*' | '/') factor)*
    fn term(&mut self) -> RenderResult<f64> {
        let mut acc = self.factor()?;
        while let Some(Token::Op(op @ ('*' | '/'))) = self.peek() {
            self.pos += 1;
            let rhs = self.factor()?;
            acc = if op == '*' {
                acc * rhs
            } else {
                if rhs == 0.0 {
                    return Err(self.error("division by zero"));
                }
                acc / rhs
            };
        }
        Ok(acc)
    }

    // factor := ('+' | '-') factor | number | '(' expr ')'
    fn factor(&mut self) -> RenderResult<f64> {
        match self.bump() {
            Some(Token::Num(n)) => Ok(n),
            Some(Token::Op('-')) => Ok(-self.factor()?),
            Some(Token::Op('+')) => self.factor(),
            Some(Token::Open) => {
                let value = self.expr()?;
                match self.bump() {
                    Some(Token::Close) => Ok(value),
                    _ => Err(self.error("expected ')'")),
                }
            }
            Some(Token::Close) => Err(self.error("unexpected ')'")),
            Some(Token::Op(op)) => Err(self.error(&format!("unexpected operator {op:?}"))),
            None => Err(self.error("unexpected end of expression")),
        }
    }

    fn error(&self, reason: &str) -> RenderError {
        RenderError::Expression {
            expr: self.src.to_string(),
            reason: reason.to_string(),
        }
    }
}
