//! Path text serialization.
//!
//! Output reparses to an equal tree. Parentheses are inserted only where
//! operator precedence requires them.

use std::fmt;

use crate::{
    ast::{Depth, Expr, ExprOrPredicate, IndexElement, JsonPath, Literal, Predicate},
    error::quote,
    value::ArithOp,
};

const PRIMARY: u8 = 9;
const UNARY: u8 = 6;
const MULTIPLICATIVE: u8 = 5;
const ADDITIVE: u8 = 4;
const COMPARISON: u8 = 3;
const AND: u8 = 2;
const OR: u8 = 1;
const TOP: u8 = 0;

fn expr_precedence(expr: &Expr) -> u8 {
    match expr {
        Expr::Plus(_) | Expr::Minus(_) => UNARY,
        Expr::Binary { op, .. } => match op {
            ArithOp::Add | ArithOp::Sub => ADDITIVE,
            ArithOp::Mul | ArithOp::Div | ArithOp::Mod => MULTIPLICATIVE,
        },
        _ => PRIMARY,
    }
}

fn predicate_precedence(predicate: &Predicate) -> u8 {
    match predicate {
        Predicate::Comparison { .. } => COMPARISON,
        Predicate::And(..) => AND,
        Predicate::Or(..) => OR,
        _ => PRIMARY,
    }
}

/// Characters that force a member name or variable name into quotes.
fn is_plain_identifier(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && !name.chars().any(|c| "?%$.[]{}()|&!=<>@#,*:-+/\\\" \t\n\r\x0C".contains(c))
}

fn identifier(name: &str) -> String {
    if is_plain_identifier(name) {
        name.to_string()
    } else {
        quote(name)
    }
}

fn literal(lit: &Literal) -> String {
    match lit {
        Literal::String(s) => quote(s),
        other => other.to_value().to_string(),
    }
}

fn wrap(s: String, precedence: u8, outer: u8) -> String {
    if precedence >= outer {
        s
    } else {
        format!("({s})")
    }
}

fn serialize(node: &ExprOrPredicate, outer: u8) -> String {
    match node {
        ExprOrPredicate::Expr(expr) => serialize_expr(expr, outer),
        ExprOrPredicate::Predicate(predicate) => serialize_predicate(predicate, outer),
    }
}

/// Accessor bases: predicates and numeric literals are always parenthesized.
fn serialize_base(base: &ExprOrPredicate) -> String {
    match base {
        ExprOrPredicate::Expr(Expr::Literal(Literal::Integer(_) | Literal::Float(_)))
        | ExprOrPredicate::Predicate(_) => format!("({})", serialize(base, TOP)),
        ExprOrPredicate::Expr(expr) => serialize_expr(expr, PRIMARY),
    }
}

fn serialize_expr(expr: &Expr, outer: u8) -> String {
    let s = match expr {
        Expr::Literal(lit) => literal(lit),
        Expr::Variable(name) => format!("${}", identifier(name)),
        Expr::Root => "$".to_string(),
        Expr::Current => "@".to_string(),
        Expr::Last => "last".to_string(),
        Expr::Plus(inner) => format!("+{}", serialize_expr(inner, UNARY)),
        Expr::Minus(inner) => format!("-{}", serialize_expr(inner, UNARY)),
        Expr::Binary { op, left, right } => {
            let precedence = expr_precedence(expr);
            format!(
                "{} {} {}",
                serialize_expr(left, precedence),
                op.symbol(),
                serialize_expr(right, precedence + 1)
            )
        }
        Expr::Key { base, key } => format!(
            "{}.{}",
            serialize_base(base),
            key.as_deref().map(identifier).unwrap_or_else(|| "*".to_string())
        ),
        Expr::Index { base, elements } => {
            let list = match elements {
                None => "*".to_string(),
                Some(elements) => elements
                    .iter()
                    .map(|element| match element {
                        IndexElement::Single(e) => serialize_expr(e, TOP),
                        IndexElement::To { start, end } => {
                            format!("{} to {}", serialize_expr(start, TOP), serialize_expr(end, TOP))
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(", "),
            };
            format!("{}[{}]", serialize_base(base), list)
        }
        Expr::AnyPath { base, start, end } => {
            let level = |d: &Depth| match d {
                Depth::Level(n) => n.to_string(),
                Depth::Last => "last".to_string(),
            };
            let window = match (start, end) {
                (Depth::Level(0), Depth::Last) => String::new(),
                (s, e) if s == e => format!("{{{}}}", level(s)),
                (s, e) => format!("{{{} to {}}}", level(s), level(e)),
            };
            format!("{}.**{}", serialize_base(base), window)
        }
        Expr::Method { base, method } => format!("{}.{}()", serialize_base(base), method.name()),
        Expr::DateTime { base, template } => format!(
            "{}.datetime({})",
            serialize_base(base),
            template.as_deref().map(quote).unwrap_or_default()
        ),
        Expr::Filter { base, predicate } => format!(
            "{} ? ({})",
            serialize_base(base),
            serialize_predicate(predicate, TOP)
        ),
    };
    wrap(s, expr_precedence(expr), outer)
}

fn serialize_predicate(predicate: &Predicate, outer: u8) -> String {
    let s = match predicate {
        Predicate::Exists(expr) => format!("exists ({})", serialize_expr(expr, TOP)),
        Predicate::Comparison { op, left, right } => format!(
            "{} {} {}",
            serialize_expr(left, COMPARISON),
            op.symbol(),
            serialize_expr(right, COMPARISON)
        ),
        Predicate::And(left, right) => format!(
            "{} && {}",
            serialize_predicate(left, AND),
            serialize_predicate(right, AND + 1)
        ),
        Predicate::Or(left, right) => format!(
            "{} || {}",
            serialize_predicate(left, OR),
            serialize_predicate(right, OR + 1)
        ),
        Predicate::Not(inner) => match inner.as_ref() {
            Predicate::Exists(_) => format!("!{}", serialize_predicate(inner, TOP)),
            other => format!("!({})", serialize_predicate(other, TOP)),
        },
        Predicate::IsUnknown(inner) => {
            format!("({}) is unknown", serialize_predicate(inner, TOP))
        }
        Predicate::StartsWith { expr, initial } => format!(
            "{} starts with {}",
            serialize_expr(expr, COMPARISON),
            serialize_expr(initial, COMPARISON)
        ),
        Predicate::LikeRegex {
            expr,
            pattern,
            flags,
        } => {
            let s = format!("{} like_regex {}", serialize_expr(expr, COMPARISON), quote(pattern));
            if flags.is_empty() {
                s
            } else {
                format!("{} flag {}", s, quote(flags.as_str()))
            }
        }
    };
    wrap(s, predicate_precedence(predicate), outer)
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&serialize_expr(self, TOP))
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&serialize_predicate(self, TOP))
    }
}

impl fmt::Display for ExprOrPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&serialize(self, TOP))
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.strict {
            f.write_str("strict ")?;
        }
        write!(f, "{}", self.expr_or_predicate)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&literal(self))
    }
}
