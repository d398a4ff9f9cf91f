//! # Path evaluator
//!
//! A [`JsonPath`](crate::ast::JsonPath) is compiled once into a tree of
//! closures. Expression closures map a [`Context`] to a lazy [`Seq`] of
//! [`Item`]s; predicate closures map it to a [`Tri`]. Running a compiled
//! query only calls closures, so a consumer that stops pulling results
//! stops the work.
//!
//! ```text
//! Expr       ->  ExprFn       = Fn(&Context) -> Seq
//! Predicate  ->  PredicateFn  = Fn(&Context) -> Result<Tri, QueryError>
//! ```
//!
//! Lax mode unwraps arrays wherever an expression result is consumed as a
//! sequence of scalars ([`Compiler::scalars`]) and turns structural
//! failures into empty results. Strict mode reports them, except inside a
//! predicate, where they become [`Item::Absent`] and from there `Unknown`.

mod accessors;
mod methods;
mod predicates;

use std::rc::Rc;

use crate::{
    ast::{Expr, ExprOrPredicate},
    datetime::{DateTime, Jsonable},
    error::{Error, QueryError},
    query::Options,
    value::{ArithOp, Map, Value, arithmetic, negate},
};

/// One element of an evaluation sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Value(Value),

    /// Result of `.datetime()`
    DateTime(DateTime),

    /// A suppressed failure inside a predicate (SQL NULL); not JSON `null`
    Absent,
}

impl Item {
    pub fn is_absent(&self) -> bool {
        matches!(self, Item::Absent)
    }

    fn number(&self) -> Option<&Value> {
        match self {
            Item::Value(value) if value.is_number() => Some(value),
            _ => None,
        }
    }

    /// String content, with date/time values in their rendered form.
    fn text(&self) -> Option<String> {
        match self {
            Item::Value(Value::String(s)) => Some(s.clone()),
            Item::DateTime(dt) => Some(dt.to_json()),
            _ => None,
        }
    }

    /// Output form: absent becomes `null`, date/time values become strings.
    pub fn into_value(self) -> Value {
        match self {
            Item::Value(value) => value,
            Item::DateTime(dt) => Value::String(dt.to_json()),
            Item::Absent => Value::Null,
        }
    }
}

impl From<Value> for Item {
    fn from(value: Value) -> Self {
        Item::Value(value)
    }
}

/// Kleene three-valued truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tri {
    True,
    False,
    Unknown,
}

impl Tri {
    pub fn and(self, other: Tri) -> Tri {
        match (self, other) {
            (Tri::False, _) | (_, Tri::False) => Tri::False,
            (Tri::True, Tri::True) => Tri::True,
            _ => Tri::Unknown,
        }
    }

    pub fn or(self, other: Tri) -> Tri {
        match (self, other) {
            (Tri::True, _) | (_, Tri::True) => Tri::True,
            (Tri::False, Tri::False) => Tri::False,
            _ => Tri::Unknown,
        }
    }

    pub fn not(self) -> Tri {
        match self {
            Tri::True => Tri::False,
            Tri::False => Tri::True,
            Tri::Unknown => Tri::Unknown,
        }
    }

    /// `true`, `false` or `null` when a predicate is used as a value.
    pub fn into_item(self) -> Item {
        Item::Value(match self {
            Tri::True => Value::Boolean(true),
            Tri::False => Value::Boolean(false),
            Tri::Unknown => Value::Null,
        })
    }

    pub fn to_option(self) -> Option<bool> {
        match self {
            Tri::True => Some(true),
            Tri::False => Some(false),
            Tri::Unknown => None,
        }
    }
}

impl From<bool> for Tri {
    fn from(b: bool) -> Self {
        if b { Tri::True } else { Tri::False }
    }
}

/// Per-invocation state. Filters and subscripts derive a new context.
#[derive(Debug, Clone)]
pub struct Context {
    /// The document (`$`)
    pub root: Value,
    pub vars: Option<Rc<Map>>,
    /// Filter candidate (`@`)
    pub current: Option<Item>,
    /// Index of the last element of the subscripted array (`last`)
    pub last: Option<i64>,
}

impl Context {
    pub fn new(root: Value, vars: Option<Rc<Map>>) -> Self {
        Context {
            root,
            vars,
            current: None,
            last: None,
        }
    }

    fn with_current(&self, current: Item) -> Self {
        Context {
            current: Some(current),
            ..self.clone()
        }
    }

    fn with_last(&self, last: i64) -> Self {
        Context {
            last: Some(last),
            ..self.clone()
        }
    }
}

pub type Seq = Box<dyn Iterator<Item = Result<Item, QueryError>>>;
pub type ExprFn = Rc<dyn Fn(&Context) -> Seq>;
pub type PredicateFn = Rc<dyn Fn(&Context) -> Result<Tri, QueryError>>;

fn empty() -> Seq {
    Box::new(std::iter::empty())
}

fn once(item: impl Into<Item>) -> Seq {
    Box::new(std::iter::once(Ok(item.into())))
}

fn fail(err: QueryError) -> Seq {
    Box::new(std::iter::once(Err(err)))
}

fn expr_fn(f: impl Fn(&Context) -> Seq + 'static) -> ExprFn {
    Rc::new(f)
}

fn predicate_fn(f: impl Fn(&Context) -> Result<Tri, QueryError> + 'static) -> PredicateFn {
    Rc::new(f)
}

/// A single item computed only when pulled.
fn defer(f: impl FnOnce() -> Result<Item, QueryError> + 'static) -> Seq {
    Box::new(std::iter::once_with(f))
}

/// Maps every item of `seq` to a sequence, passing errors through.
fn bind(seq: Seq, f: impl Fn(Item) -> Seq + 'static) -> Seq {
    Box::new(seq.flat_map(move |result| match result {
        Ok(item) => f(item),
        Err(err) => fail(err),
    }))
}

fn elements(array: Rc<Vec<Value>>) -> Seq {
    Box::new((0..array.len()).map(move |i| Ok(Item::Value(array[i].clone()))))
}

fn members(object: Rc<Map>) -> Seq {
    Box::new(
        (0..object.len())
            .filter_map(move |i| object.get_index(i).map(|(_, v)| Ok(Item::Value(v.clone())))),
    )
}

/// Reduces a sequence to its only item; zero or several items give
/// [`Item::Absent`]. Stops pulling after the second item.
fn one(seq: Seq) -> Result<Item, QueryError> {
    let mut first = None;
    for result in seq {
        let item = result?;
        if first.is_some() {
            return Ok(Item::Absent);
        }
        first = Some(item);
    }
    Ok(first.unwrap_or(Item::Absent))
}

/// Compilation switches threaded down the recursion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Flags {
    pub strict: bool,
    /// Failures become absent/unknown instead of errors
    pub in_predicate: bool,
    /// `@` is bound
    pub in_filter: bool,
    /// `last` is bound
    pub in_subscript: bool,
}

impl Flags {
    pub fn new(strict: bool) -> Self {
        Flags {
            strict,
            ..Default::default()
        }
    }
}

pub struct Compiler<'a> {
    options: &'a Options,
}

impl<'a> Compiler<'a> {
    pub fn new(options: &'a Options) -> Self {
        Compiler { options }
    }

    pub fn expr_or_predicate(&self, node: &ExprOrPredicate, flags: Flags) -> Result<ExprFn, Error> {
        match node {
            ExprOrPredicate::Expr(expr) => self.expr(expr, flags),
            ExprOrPredicate::Predicate(predicate) => {
                let predicate = self.predicate(predicate, flags)?;
                Ok(expr_fn(move |ctx| {
                    let (predicate, ctx) = (predicate.clone(), ctx.clone());
                    defer(move || predicate(&ctx).map(Tri::into_item))
                }))
            }
        }
    }

    /// In lax mode, replaces every array in the output of `inner` by its
    /// elements. Strict mode leaves the sequence as is.
    pub fn scalars(&self, inner: ExprFn, flags: Flags) -> ExprFn {
        if flags.strict {
            return inner;
        }
        expr_fn(move |ctx| {
            bind(inner(ctx), |item| match item {
                Item::Value(Value::Array(array)) => elements(array),
                other => once(other),
            })
        })
    }

    fn scalar_expr(&self, expr: &Expr, flags: Flags) -> Result<ExprFn, Error> {
        Ok(self.scalars(self.expr(expr, flags)?, flags))
    }

    fn scalar_base(&self, base: &ExprOrPredicate, flags: Flags) -> Result<ExprFn, Error> {
        Ok(self.scalars(self.expr_or_predicate(base, flags)?, flags))
    }

    pub fn expr(&self, expr: &Expr, flags: Flags) -> Result<ExprFn, Error> {
        match expr {
            Expr::Literal(literal) => {
                let value = literal.to_value();
                Ok(expr_fn(move |_| once(value.clone())))
            }
            Expr::Variable(name) => {
                let name = name.clone();
                Ok(expr_fn(move |ctx| {
                    // Raised even in silent mode
                    match ctx.vars.as_ref().and_then(|vars| vars.get(&name)) {
                        Some(value) => once(value.clone()),
                        None => fail(QueryError::UnknownVariable(name.clone())),
                    }
                }))
            }
            Expr::Root => Ok(expr_fn(|ctx| once(ctx.root.clone()))),
            Expr::Current => {
                if !flags.in_filter {
                    return Err(QueryError::Scope("@ is not allowed in root expressions".to_string()).into());
                }
                Ok(expr_fn(|ctx| once(ctx.current.clone().unwrap_or(Item::Absent))))
            }
            Expr::Last => {
                if !flags.in_subscript {
                    return Err(
                        QueryError::Scope("LAST is allowed only in array subscripts".to_string()).into(),
                    );
                }
                Ok(expr_fn(|ctx| once(ctx.last.map_or(Item::Absent, |n| Item::Value(Value::Integer(n))))))
            }
            Expr::Plus(operand) => self.unary(operand, "+", flags, |value| Some(value.clone())),
            Expr::Minus(operand) => self.unary(operand, "-", flags, negate),
            Expr::Binary { op, left, right } => self.binary(*op, left, right, flags),
            Expr::Key { base, key } => self.key(base, key.as_deref(), flags),
            Expr::Index { base, elements } => self.index(base, elements.as_deref(), flags),
            Expr::AnyPath { base, start, end } => self.any_path(base, *start, *end, flags),
            Expr::Filter { base, predicate } => self.filter(base, predicate, flags),
            Expr::Method { base, method } => self.method(base, *method, flags),
            Expr::DateTime { base, template } => self.datetime(base, template.as_deref(), flags),
        }
    }

    /// Unary operators apply to each scalar of the operand.
    fn unary(
        &self,
        operand: &Expr,
        symbol: &'static str,
        flags: Flags,
        apply: fn(&Value) -> Option<Value>,
    ) -> Result<ExprFn, Error> {
        let inner = self.scalar_expr(operand, flags)?;
        let in_predicate = flags.in_predicate;
        Ok(expr_fn(move |ctx| {
            bind(inner(ctx), move |item| match item.number().and_then(apply) {
                Some(value) => once(value),
                None if in_predicate => once(Item::Absent),
                None => fail(QueryError::Type(format!(
                    "operand of unary jsonpath operator {symbol} is not a numeric value"
                ))),
            })
        }))
    }

    /// Both operands must reduce to exactly one number. The right operand
    /// is evaluated only once the left one is known to be valid.
    fn binary(&self, op: ArithOp, left: &Expr, right: &Expr, flags: Flags) -> Result<ExprFn, Error> {
        let left = self.scalar_expr(left, flags)?;
        let right = self.scalar_expr(right, flags)?;
        let in_predicate = flags.in_predicate;
        let invalid = move |side: &str| {
            if in_predicate {
                Ok(Item::Absent)
            } else {
                Err(QueryError::Type(format!(
                    "{side} operand of jsonpath operator {} is not a single numeric value",
                    op.symbol()
                )))
            }
        };
        Ok(expr_fn(move |ctx| {
            let (left, right, ctx) = (left.clone(), right.clone(), ctx.clone());
            defer(move || {
                let lhs = one(left(&ctx))?;
                let Some(lhs) = lhs.number() else {
                    return invalid("left");
                };
                let rhs = one(right(&ctx))?;
                let Some(rhs) = rhs.number() else {
                    return invalid("right");
                };
                if matches!(op, ArithOp::Div | ArithOp::Mod) && rhs.is_zero() {
                    return if in_predicate {
                        Ok(Item::Absent)
                    } else {
                        Err(QueryError::DivisionByZero)
                    };
                }
                Ok(arithmetic(op, lhs, rhs).map_or(Item::Absent, Item::Value))
            })
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Tri; 3] = [Tri::True, Tri::False, Tri::Unknown];

    #[test]
    fn test_kleene_tables() {
        for a in ALL {
            for b in ALL {
                let and = a.and(b);
                let or = a.or(b);
                assert_eq!(and, b.and(a));
                assert_eq!(or, b.or(a));
                assert_eq!(and == Tri::True, a == Tri::True && b == Tri::True);
                assert_eq!(and == Tri::False, a == Tri::False || b == Tri::False);
                assert_eq!(or == Tri::True, a == Tri::True || b == Tri::True);
                assert_eq!(or == Tri::False, a == Tri::False && b == Tri::False);
            }
            assert_eq!(a.not().not(), a);
        }
        assert_eq!(Tri::Unknown.not(), Tri::Unknown);
    }

    #[test]
    fn test_one_short_circuits() {
        let seq: Seq = Box::new(
            vec![
                Ok(Item::Value(Value::Integer(1))),
                Ok(Item::Value(Value::Integer(2))),
                Err(QueryError::DivisionByZero),
            ]
            .into_iter(),
        );
        assert_eq!(one(seq), Ok(Item::Absent));
        assert_eq!(one(empty()), Ok(Item::Absent));
        assert_eq!(one(once(Value::Null)), Ok(Item::Value(Value::Null)));
    }
}
