//! Error types for shell-document parsing, evaluation, and filter compilation.

use thiserror::Error;

/// Structural faults detected by the splitter and the object-entry reader.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StructuralError {
    /// Unbalanced braces/brackets/parens or an unterminated string.
    #[error("unbalanced delimiters near `{0}`")]
    Unbalanced(String),
    /// An object entry without a `key: value` shape.
    #[error("malformed object entry `{0}`")]
    MalformedEntry(String),
}

/// Faults in a single scalar literal.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LiteralError {
    #[error("unrecognized literal `{0}`")]
    Unrecognized(String),
    #[error("invalid number `{0}`")]
    InvalidNumber(String),
}

/// Faults raised while resolving a constructor call to a canonical value.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConstructorError {
    #[error("unknown constructor `{0}`")]
    Unknown(String),
    #[error("{name} takes {expected} argument(s), got {got}")]
    WrongArity {
        name: &'static str,
        expected: &'static str,
        got: usize,
    },
    #[error("invalid argument to {name}: {reason}")]
    InvalidArgument { name: &'static str, reason: String },
    #[error("invalid date `{0}`")]
    InvalidDate(String),
    #[error("invalid number `{0}`")]
    InvalidNumber(String),
}

/// Umbrella error for the parse entry points.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error(transparent)]
    Structural(#[from] StructuralError),
    #[error(transparent)]
    Literal(#[from] LiteralError),
    #[error(transparent)]
    Constructor(#[from] ConstructorError),
    #[error("nesting exceeds the maximum depth of {0}")]
    DepthLimit(usize),
}

impl ParseError {
    /// The source fragment this error refers to, when one was captured.
    /// Fragments are verbatim prefixes of the input, so callers can locate
    /// the offending span (and derive a line number) by searching for them.
    pub fn fragment(&self) -> Option<&str> {
        match self {
            ParseError::Structural(
                StructuralError::Unbalanced(s) | StructuralError::MalformedEntry(s),
            ) => Some(s),
            ParseError::Literal(
                LiteralError::Unrecognized(s) | LiteralError::InvalidNumber(s),
            ) => Some(s),
            _ => None,
        }
    }
}

/// Errors from the filter compiler. Individually malformed filter specs are
/// skipped, not errors; only the raw-query override and the sort literal are
/// hard failures.
#[derive(Error, Debug)]
pub enum FilterError {
    #[error("invalid custom query: {0}")]
    CustomQuery(#[source] ParseError),
    #[error("invalid sort specification: {0}")]
    SortSpec(#[source] ParseError),
}

/// Convenience alias used throughout shelldoc-core.
pub type Result<T> = std::result::Result<T, ParseError>;
