use crate::ast::{Expr, Predicate};

/// Body of a path: either a value-producing expression or a predicate.
///
/// A predicate at the top level (`$.a > 1`) yields its truth value as a
/// JSON boolean, or `null` when unknown.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprOrPredicate {
    Expr(Expr),
    Predicate(Predicate),
}

impl From<Expr> for ExprOrPredicate {
    fn from(expr: Expr) -> Self {
        ExprOrPredicate::Expr(expr)
    }
}

impl From<Predicate> for ExprOrPredicate {
    fn from(predicate: Predicate) -> Self {
        ExprOrPredicate::Predicate(predicate)
    }
}

/// A complete parsed path.
///
/// # Example
/// ```text
/// strict $.items[*] ? (@.price > $limit)
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct JsonPath {
    /// `strict` mode prefix; lax is the default
    pub strict: bool,

    pub expr_or_predicate: ExprOrPredicate,
}

impl JsonPath {
    pub fn new(expr_or_predicate: impl Into<ExprOrPredicate>, strict: bool) -> Self {
        JsonPath {
            strict,
            expr_or_predicate: expr_or_predicate.into(),
        }
    }
}
