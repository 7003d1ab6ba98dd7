//! Error types for spec parsing.

use refspec_template::RenderError;
use refspec_types::TypeError;
use thiserror::Error;

/// Ill-formed generator dimensions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeneratorError {
    /// A range with `step == 0` never advances.
    #[error("dimension {dimension:?}: range step must not be zero")]
    ZeroStep { dimension: String },

    /// The step's sign points away from `stop`.
    #[error("dimension {dimension:?}: range {start}..{stop} is unreachable with step {step}")]
    Unreachable {
        dimension: String,
        start: i64,
        stop: i64,
        step: i64,
    },

    /// A coordinate too large to render exactly.
    #[error("dimension {dimension:?}: value {value} is outside the exact integer range (+/-2^53)")]
    OutOfRange { dimension: String, value: i64 },
}

/// Errors that abort a parse.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("render error: {0}")]
    Render(#[from] RenderError),

    #[error("generator error: {0}")]
    Generator(#[from] GeneratorError),

    /// A rendered offset or length is not a non-negative integer.
    #[error("generated {field} {value:?} for key {key:?} is not a non-negative integer")]
    InvalidInteger {
        key: String,
        field: &'static str,
        value: String,
    },

    /// An explicit ref has an unsupported shape.
    #[error("invalid ref {key:?}: {reason}")]
    InvalidRef { key: String, reason: String },

    /// A generator declares only one of offset/length.
    #[error("invalid generator #{index}: {reason}")]
    InvalidGenerator { index: usize, reason: String },

    #[error("invalid spec JSON: {0}")]
    Json(String),

    #[error("unsupported spec version: {0}")]
    UnsupportedVersion(u64),
}

impl From<TypeError> for ParseError {
    fn from(e: TypeError) -> Self {
        match e {
            TypeError::Json(msg) => ParseError::Json(msg),
            TypeError::UnsupportedVersion(v) => ParseError::UnsupportedVersion(v),
        }
    }
}

/// Convenience type alias for parse operations.
pub type ParseResult<T> = Result<T, ParseError>;
