use std::fmt;

use crate::ast::{AstError, Expr};

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// Equal (`==`)
    Equal,
    /// Not equal (`!=`, also written `<>`)
    NotEqual,
    /// Less than (`<`)
    LessThan,
    /// Less than or equal (`<=`)
    LessEqual,
    /// Greater than (`>`)
    GreaterThan,
    /// Greater than or equal (`>=`)
    GreaterEqual,
}

impl CompareOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Equal => "==",
            CompareOp::NotEqual => "!=",
            CompareOp::LessThan => "<",
            CompareOp::LessEqual => "<=",
            CompareOp::GreaterThan => ">",
            CompareOp::GreaterEqual => ">=",
        }
    }
}

/// Validated `like_regex` flag string.
///
/// Only `i` (case-insensitive), `m` (`^`/`$` at newlines), `s` (`.` matches
/// newline), `q` (quote the whole pattern) and `x` (expanded syntax) are
/// accepted; anything else is rejected when the node is built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LikeRegexFlags {
    source: String,
    pub ignore_case: bool,
    pub multiline: bool,
    pub dot_all: bool,
    pub quoted: bool,
    pub expanded: bool,
}

impl LikeRegexFlags {
    pub fn parse(flags: &str) -> Result<Self, AstError> {
        let mut parsed = LikeRegexFlags {
            source: flags.to_string(),
            ..Default::default()
        };
        for c in flags.chars() {
            match c {
                'i' => parsed.ignore_case = true,
                'm' => parsed.multiline = true,
                's' => parsed.dot_all = true,
                'q' => parsed.quoted = true,
                'x' => parsed.expanded = true,
                other => return Err(AstError::UnknownFlag(other)),
            }
        }
        Ok(parsed)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }
}

impl fmt::Display for LikeRegexFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Truth-valued node, evaluated with three-valued logic.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `exists (expr)`
    Exists(Box<Expr>),

    /// `left op right`
    Comparison {
        op: CompareOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// `left && right`
    And(Box<Predicate>, Box<Predicate>),

    /// `left || right`
    Or(Box<Predicate>, Box<Predicate>),

    /// `!(predicate)`
    Not(Box<Predicate>),

    /// `(predicate) is unknown`
    IsUnknown(Box<Predicate>),

    /// `expr starts with initial`; `initial` is a string literal or a variable
    StartsWith { expr: Box<Expr>, initial: Box<Expr> },

    /// `expr like_regex "pattern" flag "flags"`
    LikeRegex {
        expr: Box<Expr>,
        pattern: String,
        flags: LikeRegexFlags,
    },
}

impl Predicate {
    pub fn exists(expr: Expr) -> Self {
        Predicate::Exists(Box::new(expr))
    }

    pub fn comparison(op: CompareOp, left: Expr, right: Expr) -> Self {
        Predicate::Comparison {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn and(left: Predicate, right: Predicate) -> Self {
        Predicate::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: Predicate, right: Predicate) -> Self {
        Predicate::Or(Box::new(left), Box::new(right))
    }

    pub fn not(predicate: Predicate) -> Self {
        Predicate::Not(Box::new(predicate))
    }

    pub fn is_unknown(predicate: Predicate) -> Self {
        Predicate::IsUnknown(Box::new(predicate))
    }

    pub fn starts_with(expr: Expr, initial: Expr) -> Self {
        Predicate::StartsWith {
            expr: Box::new(expr),
            initial: Box::new(initial),
        }
    }

    /// Builds a `like_regex` node, rejecting unknown flag letters.
    pub fn like_regex(expr: Expr, pattern: &str, flags: &str) -> Result<Self, AstError> {
        Ok(Predicate::LikeRegex {
            expr: Box::new(expr),
            pattern: pattern.to_string(),
            flags: LikeRegexFlags::parse(flags)?,
        })
    }
}
