use std::cmp::Ordering;

use regex::{Regex, RegexBuilder};

use crate::{
    ast::{CompareOp, Expr, LikeRegexFlags, Predicate},
    error::Error,
    evaluator::{Compiler, Flags, Item, PredicateFn, Tri, one, predicate_fn},
    posix::{self, PosixFlags},
    query::RegexDialect,
    value::Value,
};

/// Order of two scalars of the same kind. `None` means the pair is not
/// comparable (`Unknown`); `Some(None)` is an unordered float pair.
fn order(left: &Item, right: &Item) -> Option<Option<Ordering>> {
    match (left, right) {
        (Item::Value(left), Item::Value(right)) => match (left, right) {
            (Value::Boolean(a), Value::Boolean(b)) => Some(Some(a.cmp(b))),
            (Value::String(a), Value::String(b)) => Some(Some(a.cmp(b))),
            (Value::Integer(a), Value::Integer(b)) => Some(Some(a.cmp(b))),
            (a, b) if a.is_number() && b.is_number() => Some(a.as_f64()?.partial_cmp(&b.as_f64()?)),
            _ => None,
        },
        (Item::DateTime(a), Item::DateTime(b)) => a.compare(b).map(Some),
        _ => None,
    }
}

/// Compares one pair of items.
///
/// `null` only equals `null` and is never less than anything. Every other
/// pair must be two scalars of one kind, or two date/time values of one
/// variant; anything else is `Unknown`.
fn compare(op: CompareOp, left: &Item, right: &Item) -> Tri {
    let (op, left, right) = match op {
        CompareOp::GreaterThan => (CompareOp::LessThan, right, left),
        CompareOp::GreaterEqual => (CompareOp::LessEqual, right, left),
        op => (op, left, right),
    };

    let left_null = matches!(left, Item::Value(Value::Null));
    let right_null = matches!(right, Item::Value(Value::Null));
    if left_null || right_null {
        let both = left_null && right_null;
        return Tri::from(match op {
            CompareOp::NotEqual => !both,
            CompareOp::LessThan => false,
            _ => both,
        });
    }

    let Some(ordering) = order(left, right) else {
        return Tri::Unknown;
    };
    Tri::from(match op {
        CompareOp::Equal => ordering == Some(Ordering::Equal),
        CompareOp::NotEqual => ordering != Some(Ordering::Equal),
        CompareOp::LessThan => ordering == Some(Ordering::Less),
        _ => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
    })
}

impl Compiler<'_> {
    /// Compiles a predicate. Everything below it runs with failures
    /// demoted to absent items.
    pub(crate) fn predicate(&self, predicate: &Predicate, flags: Flags) -> Result<PredicateFn, Error> {
        let flags = Flags {
            in_predicate: true,
            ..flags
        };
        match predicate {
            Predicate::Exists(expr) => self.exists(expr, flags),
            Predicate::Comparison { op, left, right } => self.comparison(*op, left, right, flags),
            Predicate::And(left, right) => {
                let left = self.predicate(left, flags)?;
                let right = self.predicate(right, flags)?;
                Ok(predicate_fn(move |ctx| Ok(left(ctx)?.and(right(ctx)?))))
            }
            Predicate::Or(left, right) => {
                let left = self.predicate(left, flags)?;
                let right = self.predicate(right, flags)?;
                Ok(predicate_fn(move |ctx| Ok(left(ctx)?.or(right(ctx)?))))
            }
            Predicate::Not(inner) => {
                let inner = self.predicate(inner, flags)?;
                Ok(predicate_fn(move |ctx| Ok(inner(ctx)?.not())))
            }
            Predicate::IsUnknown(inner) => {
                let inner = self.predicate(inner, flags)?;
                Ok(predicate_fn(move |ctx| Ok(Tri::from(inner(ctx)? == Tri::Unknown))))
            }
            Predicate::StartsWith { expr, initial } => self.starts_with(expr, initial, flags),
            Predicate::LikeRegex {
                expr,
                pattern,
                flags: regex_flags,
            } => self.like_regex(expr, pattern, regex_flags, flags),
        }
    }

    /// Lax: `True` as soon as any item is present. Strict: `Unknown` as
    /// soon as any item is absent.
    fn exists(&self, expr: &Expr, flags: Flags) -> Result<PredicateFn, Error> {
        let inner = self.expr(expr, flags)?;
        let strict = flags.strict;
        Ok(predicate_fn(move |ctx| {
            let mut result = Tri::False;
            for item in inner(ctx) {
                let absent = item?.is_absent();
                match (strict, absent) {
                    (false, false) => return Ok(Tri::True),
                    (false, true) => result = Tri::Unknown,
                    (true, true) => return Ok(Tri::Unknown),
                    (true, false) => result = Tri::True,
                }
            }
            Ok(result)
        }))
    }

    /// Pairs every left item with every right item. Lax mode stops at the
    /// first `True`, strict mode at the first `Unknown`.
    fn comparison(&self, op: CompareOp, left: &Expr, right: &Expr, flags: Flags) -> Result<PredicateFn, Error> {
        let left = self.scalar_expr(left, flags)?;
        let right = self.scalar_expr(right, flags)?;
        let strict = flags.strict;
        Ok(predicate_fn(move |ctx| {
            let mut result = Tri::False;
            for lhs in left(ctx) {
                let lhs = lhs?;
                for rhs in right(ctx) {
                    match (compare(op, &lhs, &rhs?), strict) {
                        (Tri::True, false) => return Ok(Tri::True),
                        (Tri::Unknown, true) => return Ok(Tri::Unknown),
                        (Tri::False, _) => {}
                        (tri, _) => result = tri,
                    }
                }
            }
            Ok(result)
        }))
    }

    fn starts_with(&self, expr: &Expr, initial: &Expr, flags: Flags) -> Result<PredicateFn, Error> {
        let expr = self.scalar_expr(expr, flags)?;
        let initial = self.scalar_expr(initial, flags)?;
        let strict = flags.strict;
        Ok(predicate_fn(move |ctx| {
            let Item::Value(Value::String(prefix)) = one(initial(ctx))? else {
                return Ok(Tri::Unknown);
            };
            let mut result = Tri::False;
            let mut mismatched = false;
            for item in expr(ctx) {
                match item?.text() {
                    Some(text) if text.starts_with(prefix.as_str()) => {
                        if !strict {
                            return Ok(Tri::True);
                        }
                        if !mismatched {
                            result = Tri::True;
                        }
                    }
                    Some(_) if strict => {
                        mismatched = true;
                        result = Tri::False;
                    }
                    Some(_) => {}
                    None if strict => return Ok(Tri::Unknown),
                    None => result = Tri::Unknown,
                }
            }
            Ok(result)
        }))
    }

    fn regex(&self, pattern: &str, flags: &LikeRegexFlags) -> Result<Regex, Error> {
        match self.options.regex {
            RegexDialect::Posix => posix::compile(pattern, flags),
            RegexDialect::Native => {
                let flags = PosixFlags::from_like_regex(flags)?;
                let pattern = if flags.quoted {
                    regex::escape(pattern)
                } else {
                    pattern.to_string()
                };
                Ok(RegexBuilder::new(&pattern)
                    .case_insensitive(flags.ignore_case)
                    .multi_line(flags.multiline)
                    .dot_matches_new_line(flags.dot_all)
                    .build()?)
            }
        }
    }

    /// `True` as soon as one string item matches, in either mode.
    fn like_regex(
        &self,
        expr: &Expr,
        pattern: &str,
        regex_flags: &LikeRegexFlags,
        flags: Flags,
    ) -> Result<PredicateFn, Error> {
        let regex = self.regex(pattern, regex_flags)?;
        let expr = self.scalar_expr(expr, flags)?;
        Ok(predicate_fn(move |ctx| {
            for item in expr(ctx) {
                if item?.text().is_some_and(|text| regex.is_match(&text)) {
                    return Ok(Tri::True);
                }
            }
            Ok(Tri::False)
        }))
    }
}
