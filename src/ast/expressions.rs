use crate::{
    ast::{AstError, ExprOrPredicate, Predicate},
    value::{ArithOp, Value},
};

/// Literal scalar written in the path text.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl Literal {
    pub fn to_value(&self) -> Value {
        match self {
            Literal::Null => Value::Null,
            Literal::Boolean(b) => Value::Boolean(*b),
            Literal::Integer(n) => Value::Integer(*n),
            Literal::Float(n) => Value::Float(*n),
            Literal::String(s) => Value::String(s.clone()),
        }
    }
}

/// Item methods (`.abs()`, `.size()`, ...). `.datetime()` has its own node
/// because it carries a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Abs,
    Size,
    Type,
    Floor,
    Double,
    Ceiling,
    KeyValue,
}

impl Method {
    pub fn name(self) -> &'static str {
        match self {
            Method::Abs => "abs",
            Method::Size => "size",
            Method::Type => "type",
            Method::Floor => "floor",
            Method::Double => "double",
            Method::Ceiling => "ceiling",
            Method::KeyValue => "keyvalue",
        }
    }

    /// Looks a method up by its case-insensitive name.
    pub fn from_name(name: &str) -> Option<Self> {
        [
            Method::Abs,
            Method::Size,
            Method::Type,
            Method::Floor,
            Method::Double,
            Method::Ceiling,
            Method::KeyValue,
        ]
        .into_iter()
        .find(|m| m.name().eq_ignore_ascii_case(name))
    }
}

/// One entry of an array subscript list.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexElement {
    /// `[expr]`
    Single(Expr),

    /// `[start to end]`, both ends inclusive
    To { start: Expr, end: Expr },
}

/// Depth bound of a `.**{...}` accessor.
///
/// `Last` in the start position selects only leaves; in the end position
/// it leaves the descent unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Depth {
    Level(u32),
    Last,
}

/// Value-producing node.
///
/// Every accessor keeps its base as an [`ExprOrPredicate`] because a
/// parenthesized predicate may be navigated like any other item, e.g.
/// `($.a == 1).type()`.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    // Primaries
    /// Literal scalar
    ///
    /// # Example
    /// ```text
    /// "abc"
    /// ```
    Literal(Literal),

    /// Named variable supplied by the caller
    ///
    /// # Example
    /// ```text
    /// $min_price
    /// ```
    Variable(String),

    /// Root item (`$`)
    Root,

    /// Current item inside a filter (`@`)
    Current,

    /// Index of the last element, only inside an array subscript (`last`)
    Last,

    // Arithmetic
    /// Unary plus
    Plus(Box<Expr>),

    /// Unary minus
    Minus(Box<Expr>),

    /// Binary arithmetic (`+ - * / %`)
    Binary {
        op: ArithOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    // Accessors
    /// Member accessor; `None` is the wildcard
    ///
    /// # Examples
    /// ```text
    /// $.name
    /// $.*
    /// $."with space"
    /// ```
    Key {
        base: Box<ExprOrPredicate>,
        key: Option<String>,
    },

    /// Array accessor; `None` is the wildcard
    ///
    /// # Examples
    /// ```text
    /// $[0]
    /// $[1, 3 to last]
    /// $[*]
    /// ```
    Index {
        base: Box<ExprOrPredicate>,
        elements: Option<Vec<IndexElement>>,
    },

    /// Recursive wildcard over a depth window
    ///
    /// # Examples
    /// ```text
    /// $.**
    /// $.**{2}
    /// $.**{1 to last}
    /// ```
    AnyPath {
        base: Box<ExprOrPredicate>,
        start: Depth,
        end: Depth,
    },

    /// Item method call
    Method {
        base: Box<ExprOrPredicate>,
        method: Method,
    },

    /// `.datetime()` or `.datetime("template")`
    DateTime {
        base: Box<ExprOrPredicate>,
        template: Option<String>,
    },

    /// Filter expression
    ///
    /// # Example
    /// ```text
    /// $.items ? (@.price > 100)
    /// ```
    Filter {
        base: Box<ExprOrPredicate>,
        predicate: Box<Predicate>,
    },
}

impl Expr {
    pub fn literal(literal: Literal) -> Self {
        Expr::Literal(literal)
    }

    /// Unary plus; a numeric literal operand is returned as is.
    pub fn plus(expr: Expr) -> Self {
        match expr {
            Expr::Literal(Literal::Integer(_) | Literal::Float(_)) => expr,
            other => Expr::Plus(Box::new(other)),
        }
    }

    /// Unary minus; a numeric literal operand is folded into the literal.
    pub fn minus(expr: Expr) -> Self {
        match expr {
            Expr::Literal(Literal::Integer(n)) => match n.checked_neg() {
                Some(neg) => Expr::Literal(Literal::Integer(neg)),
                None => Expr::Literal(Literal::Float(-(n as f64))),
            },
            Expr::Literal(Literal::Float(n)) => Expr::Literal(Literal::Float(-n)),
            other => Expr::Minus(Box::new(other)),
        }
    }

    pub fn binary(op: ArithOp, left: Expr, right: Expr) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn key(base: impl Into<ExprOrPredicate>, key: Option<String>) -> Self {
        Expr::Key {
            base: Box::new(base.into()),
            key,
        }
    }

    /// Array accessor. An explicit element list must not be empty.
    pub fn index(
        base: impl Into<ExprOrPredicate>,
        elements: Option<Vec<IndexElement>>,
    ) -> Result<Self, AstError> {
        if elements.as_ref().is_some_and(|e| e.is_empty()) {
            return Err(AstError::EmptySubscript);
        }
        Ok(Expr::Index {
            base: Box::new(base.into()),
            elements,
        })
    }

    pub fn any_path(base: impl Into<ExprOrPredicate>, start: Depth, end: Depth) -> Self {
        Expr::AnyPath {
            base: Box::new(base.into()),
            start,
            end,
        }
    }

    pub fn method(base: impl Into<ExprOrPredicate>, method: Method) -> Self {
        Expr::Method {
            base: Box::new(base.into()),
            method,
        }
    }

    pub fn datetime(base: impl Into<ExprOrPredicate>, template: Option<String>) -> Self {
        Expr::DateTime {
            base: Box::new(base.into()),
            template,
        }
    }

    pub fn filter(base: impl Into<ExprOrPredicate>, predicate: Predicate) -> Self {
        Expr::Filter {
            base: Box::new(base.into()),
            predicate: Box::new(predicate),
        }
    }
}
