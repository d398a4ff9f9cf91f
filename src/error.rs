use thiserror::Error;

/// Errors raised while evaluating a path against a document.
///
/// Every variant except [`QueryError::UnknownVariable`] is swallowed when the
/// query runs in silent mode.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    /// An operand or base item had the wrong JSON type
    #[error("{0}")]
    Type(String),

    /// Member or element access failed in strict mode
    #[error("{0}")]
    Access(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("could not find jsonpath variable {}", quote(.0))]
    UnknownVariable(String),

    /// `@` or `last` used outside the construct that defines it
    #[error("{0}")]
    Scope(String),

    /// `.datetime()` could not parse its input or template
    #[error("datetime format is not recognized: {}", quote(.0))]
    DateTime(String),

    #[error("\"vars\" argument is not an object")]
    Vars,

    #[error("single boolean result is expected")]
    SingleBoolean,
}

impl QueryError {
    pub fn is_silenceable(&self) -> bool {
        !matches!(self, QueryError::UnknownVariable(_))
    }
}

/// Lexical error with the character offset where it was detected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at position {position}")]
pub struct LexError {
    pub message: String,
    pub position: usize,
}

/// Syntax error with the character offset of the offending token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at position {position}")]
pub struct ParseError {
    pub message: String,
    pub position: usize,
}

/// Rejected by a validating AST constructor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AstError {
    #[error("unknown flag \"{0}\"")]
    UnknownFlag(char),

    #[error("array subscript list must not be empty")]
    EmptySubscript,
}

/// POSIX pattern that cannot be expressed as a Rust regex.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid regular expression: {0}")]
pub struct PosixError(pub String);

/// Top-level error for parsing, compiling and running paths.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("syntax error: {0}")]
    Lex(#[from] LexError),

    #[error("syntax error: {0}")]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Ast(#[from] AstError),

    #[error(transparent)]
    Posix(#[from] PosixError),

    #[error("invalid regular expression: {0}")]
    Regex(#[from] regex::Error),

    #[error("{0}")]
    Unsupported(String),
}

impl Error {
    /// The evaluation error, if this is one.
    pub fn as_query_error(&self) -> Option<&QueryError> {
        match self {
            Error::Query(err) => Some(err),
            _ => None,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// JSON string quoting used in error messages.
pub(crate) fn quote(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}
