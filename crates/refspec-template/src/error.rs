//! Error types for template rendering.

use thiserror::Error;

/// Errors raised while rendering a template.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    /// The interpolation is not a known name, a call, or an expression.
    #[error("unable to resolve interpolation: {expr:?}")]
    Unresolved { expr: String },

    /// An expression references a name missing from the context.
    #[error("cannot find number named {name:?} in rendering context")]
    UnknownIdentifier { name: String },

    /// An expression references a name whose value is not numeric.
    #[error("the value for {name:?} must be a number")]
    NotANumber { name: String },

    /// `NAME(...)` call syntax that could not be parsed.
    #[error("malformed template call {expr:?}: {reason}")]
    MalformedCall { expr: String, reason: String },

    /// A call names something that is not a template function.
    #[error("cannot find template function named {name:?} in rendering context")]
    UnknownFunction { name: String },

    /// Arithmetic syntax error or invalid operation.
    #[error("invalid expression {expr:?}: {reason}")]
    Expression { expr: String, reason: String },

    /// Template functions kept invoking each other past the nesting limit.
    #[error("template nesting deeper than {limit} levels")]
    RecursionLimit { limit: usize },
}

/// Convenience type alias for rendering operations.
pub type RenderResult<T> = Result<T, RenderError>;
