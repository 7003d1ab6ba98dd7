//! Delimiter scan splitting a template into text and interpolations.
//!
//! The scan is single-pass and non-nesting: an interpolation runs from `{{`
//! to the first following `}}`. An opening `{{` with no closing `}}` is left
//! as literal text.

pub const OPEN: &str = "{{";
pub const CLOSE: &str = "}}";

/// Returns `true` if `text` contains an interpolation marker.
pub fn is_template(text: &str) -> bool {
    text.contains(OPEN)
}

/// A piece of a template.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Segment<'t> {
    /// Literal text, passed through unchanged.
    Text(&'t str),
    /// Inner text of an interpolation, without delimiters and untrimmed.
    Interpolation(&'t str),
}

/// Iterator over the [`Segment`]s of a template, in order.
#[derive(Clone, Debug)]
pub struct Segments<'t> {
    rest: &'t str,
}

pub fn segments(template: &str) -> Segments<'_> {
    Segments { rest: template }
}

impl<'t> Iterator for Segments<'t> {
    type Item = Segment<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.is_empty() {
            return None;
        }
        let rest = self.rest;
        match rest.find(OPEN) {
            Some(0) => {
                let body = &rest[OPEN.len()..];
                match body.find(CLOSE) {
                    Some(end) => {
                        self.rest = &body[end + CLOSE.len()..];
                        Some(Segment::Interpolation(&body[..end]))
                    }
                    None => {
                        self.rest = "";
                        Some(Segment::Text(rest))
                    }
                }
            }
            Some(start) => {
                self.rest = &rest[start..];
                Some(Segment::Text(&rest[..start]))
            }
            None => {
                self.rest = "";
                Some(Segment::Text(rest))
            }
        }
    }
}
