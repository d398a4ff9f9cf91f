use std::rc::Rc;

use crate::{
    ast::{Depth, ExprOrPredicate, IndexElement, Predicate},
    error::{Error, QueryError, quote},
    evaluator::{
        Compiler, Context, ExprFn, Flags, Item, Seq, Tri, bind, elements, empty, expr_fn, fail,
        members, once, one,
    },
    value::Value,
};

/// Subscripts must lie in this window; outside it they are out of
/// integer range rather than out of bounds.
const MIN_SUBSCRIPT: i64 = -(1 << 32);
const MAX_SUBSCRIPT: i64 = (1 << 32) - 1;

/// Result of evaluating one subscript list entry.
enum Subscript {
    /// Bound did not reduce to a single number
    Invalid,
    /// Inclusive range; a single index has `from == to`
    Range(i64, i64),
}

type SubscriptFn = Rc<dyn Fn(&Context) -> Result<Subscript, QueryError>>;

/// What an array accessor indexes into. Lax mode wraps any other item as
/// a one-element array.
enum Elements {
    Array(Rc<Vec<Value>>),
    Single(Item),
}

impl Elements {
    fn len(&self) -> usize {
        match self {
            Elements::Array(array) => array.len(),
            Elements::Single(_) => 1,
        }
    }

    fn get(&self, index: usize) -> Item {
        match self {
            Elements::Array(array) => array.get(index).cloned().map_or(Item::Absent, Item::Value),
            Elements::Single(item) => item.clone(),
        }
    }

    fn into_seq(self) -> Seq {
        match self {
            Elements::Array(array) => elements(array),
            Elements::Single(item) => once(item),
        }
    }
}

fn floor_index(item: &Item) -> Option<i64> {
    match item.number()? {
        Value::Integer(n) => Some(*n),
        Value::Float(n) if !n.is_nan() => Some(n.floor() as i64),
        _ => None,
    }
}

fn not_numeric(flags: Flags) -> Seq {
    if !flags.in_predicate {
        fail(QueryError::Access("jsonpath array subscript is not a single numeric value".to_string()))
    } else if flags.strict {
        once(Item::Absent)
    } else {
        empty()
    }
}

fn out_of_range(flags: Flags) -> Seq {
    if flags.in_predicate {
        once(Item::Absent)
    } else {
        fail(QueryError::Access("jsonpath array subscript is out of integer range".to_string()))
    }
}

fn out_of_bounds(flags: Flags) -> Seq {
    match (flags.strict, flags.in_predicate) {
        (false, _) => empty(),
        (true, true) => once(Item::Absent),
        (true, false) => {
            fail(QueryError::Access("jsonpath array subscript is out of bounds".to_string()))
        }
    }
}

/// Items for indices `from..=to`. Each run of out-of-bounds or
/// out-of-range indices is reported once, so huge ranges stay cheap.
fn select(elements: Rc<Elements>, from: i64, to: i64, flags: Flags) -> Seq {
    let overlaps = |lo: i64, hi: i64| from.max(lo) <= to.min(hi);
    let len = elements.len() as i64;
    let mut runs: Vec<Seq> = Vec::new();
    if overlaps(i64::MIN, MIN_SUBSCRIPT - 1) {
        runs.push(out_of_range(flags));
    }
    if overlaps(MIN_SUBSCRIPT, -1) {
        runs.push(out_of_bounds(flags));
    }
    let (lo, hi) = (from.max(0), to.min(len - 1));
    if lo <= hi {
        runs.push(Box::new((lo..=hi).map(move |i| Ok(elements.get(i as usize)))));
    }
    if overlaps(len, MAX_SUBSCRIPT) {
        runs.push(out_of_bounds(flags));
    }
    if overlaps(MAX_SUBSCRIPT + 1, i64::MAX) {
        runs.push(out_of_range(flags));
    }
    Box::new(runs.into_iter().flatten())
}

/// Pre-order walk for `.**`, depth 0 being the base item.
struct Walk {
    stack: Vec<(Item, u32)>,
    start: Depth,
    end: Depth,
}

impl Iterator for Walk {
    type Item = Result<Item, QueryError>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((item, depth)) = self.stack.pop() {
            let descend = match self.end {
                Depth::Level(end) => depth < end,
                Depth::Last => true,
            };
            let leaf = match &item {
                Item::Value(Value::Array(array)) => {
                    if descend {
                        for value in array.iter().rev() {
                            self.stack.push((Item::Value(value.clone()), depth + 1));
                        }
                    }
                    false
                }
                Item::Value(Value::Object(object)) => {
                    if descend {
                        for value in object.values().rev() {
                            self.stack.push((Item::Value(value.clone()), depth + 1));
                        }
                    }
                    false
                }
                _ => true,
            };
            let after_start = match self.start {
                Depth::Level(start) => depth >= start,
                Depth::Last => leaf,
            };
            let before_end = match self.end {
                Depth::Level(end) => depth <= end,
                Depth::Last => true,
            };
            if after_start && before_end {
                return Some(Ok(item));
            }
        }
        None
    }
}

impl Compiler<'_> {
    pub(crate) fn key(
        &self,
        base: &ExprOrPredicate,
        key: Option<&str>,
        flags: Flags,
    ) -> Result<ExprFn, Error> {
        let base = self.scalar_base(base, flags)?;
        let Flags {
            strict,
            in_predicate,
            ..
        } = flags;

        let Some(key) = key else {
            return Ok(expr_fn(move |ctx| {
                bind(base(ctx), move |item| match item {
                    Item::Value(Value::Object(object)) => members(object),
                    _ if !strict => empty(),
                    _ if in_predicate => once(Item::Absent),
                    _ => fail(QueryError::Access(
                        "jsonpath wildcard member accessor can only be applied to an object"
                            .to_string(),
                    )),
                })
            }));
        };

        let key: Rc<str> = Rc::from(key);
        Ok(expr_fn(move |ctx| {
            let key = key.clone();
            bind(base(ctx), move |item| match item {
                Item::Value(Value::Object(object)) => match object.get(&*key) {
                    Some(value) => once(value.clone()),
                    None if !strict => empty(),
                    None if in_predicate => once(Item::Absent),
                    None => fail(QueryError::Access(format!(
                        "JSON object does not contain key {}",
                        quote(&key)
                    ))),
                },
                _ if !strict => empty(),
                _ if in_predicate => once(Item::Absent),
                _ => fail(QueryError::Access(
                    "jsonpath member accessor can only be applied to an object".to_string(),
                )),
            })
        }))
    }

    fn subscript(&self, element: &IndexElement, flags: Flags) -> Result<SubscriptFn, Error> {
        let flags = Flags {
            in_subscript: true,
            ..flags
        };
        let subscript: SubscriptFn = match element {
            IndexElement::Single(expr) => {
                let index = self.scalar_expr(expr, flags)?;
                Rc::new(move |ctx: &Context| {
                    Ok(match floor_index(&one(index(ctx))?) {
                        Some(i) => Subscript::Range(i, i),
                        None => Subscript::Invalid,
                    })
                })
            }
            IndexElement::To { start, end } => {
                let start = self.scalar_expr(start, flags)?;
                let end = self.scalar_expr(end, flags)?;
                Rc::new(move |ctx: &Context| {
                    let Some(from) = floor_index(&one(start(ctx))?) else {
                        return Ok(Subscript::Invalid);
                    };
                    let Some(to) = floor_index(&one(end(ctx))?) else {
                        return Ok(Subscript::Invalid);
                    };
                    Ok(Subscript::Range(from, to))
                })
            }
        };
        Ok(subscript)
    }

    pub(crate) fn index(
        &self,
        base: &ExprOrPredicate,
        list: Option<&[IndexElement]>,
        flags: Flags,
    ) -> Result<ExprFn, Error> {
        let base = self.expr_or_predicate(base, flags)?;
        let not_array = match list {
            None => "jsonpath wildcard array accessor can only be applied to an array",
            Some(_) => "jsonpath array accessor can only be applied to an array",
        };
        let as_elements = move |item: Item| -> Result<Option<Elements>, QueryError> {
            match item {
                Item::Value(Value::Array(array)) => Ok(Some(Elements::Array(array))),
                other if !flags.strict => Ok(Some(Elements::Single(other))),
                _ if flags.in_predicate => Ok(None),
                _ => Err(QueryError::Access(not_array.to_string())),
            }
        };

        let Some(list) = list else {
            return Ok(expr_fn(move |ctx| {
                bind(base(ctx), move |item| match as_elements(item) {
                    Ok(Some(elements)) => elements.into_seq(),
                    Ok(None) => once(Item::Absent),
                    Err(err) => fail(err),
                })
            }));
        };

        let subscripts = list
            .iter()
            .map(|element| self.subscript(element, flags))
            .collect::<Result<Vec<_>, _>>()?;
        let subscripts = Rc::new(subscripts);
        Ok(expr_fn(move |ctx| {
            let (subscripts, ctx) = (subscripts.clone(), ctx.clone());
            bind(base(&ctx), move |item| {
                let elements = match as_elements(item) {
                    Ok(Some(elements)) => Rc::new(elements),
                    Ok(None) => return once(Item::Absent),
                    Err(err) => return fail(err),
                };
                let ctx = ctx.with_last(elements.len() as i64 - 1);
                let subscripts = subscripts.clone();
                Box::new((0..subscripts.len()).flat_map(move |i| match subscripts[i](&ctx) {
                    Ok(Subscript::Range(from, to)) => select(elements.clone(), from, to, flags),
                    Ok(Subscript::Invalid) => not_numeric(flags),
                    Err(err) => fail(err),
                }))
            })
        }))
    }

    pub(crate) fn any_path(
        &self,
        base: &ExprOrPredicate,
        start: Depth,
        end: Depth,
        flags: Flags,
    ) -> Result<ExprFn, Error> {
        let base = self.expr_or_predicate(base, flags)?;
        Ok(expr_fn(move |ctx| {
            bind(base(ctx), move |item| {
                Box::new(Walk {
                    stack: vec![(item, 0)],
                    start,
                    end,
                })
            })
        }))
    }

    /// Keeps the base items for which the predicate is `True`.
    pub(crate) fn filter(
        &self,
        base: &ExprOrPredicate,
        predicate: &Predicate,
        flags: Flags,
    ) -> Result<ExprFn, Error> {
        let base = self.scalar_base(base, flags)?;
        let predicate = self.predicate(
            predicate,
            Flags {
                in_filter: true,
                ..flags
            },
        )?;
        Ok(expr_fn(move |ctx| {
            let (predicate, ctx) = (predicate.clone(), ctx.clone());
            bind(base(&ctx), move |item| match predicate(&ctx.with_current(item.clone())) {
                Ok(Tri::True) => once(item),
                Ok(_) => empty(),
                Err(err) => fail(err),
            })
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walk(value: serde_json::Value, start: Depth, end: Depth) -> Vec<serde_json::Value> {
        Walk {
            stack: vec![(Item::Value(value.into()), 0)],
            start,
            end,
        }
        .map(|item| serde_json::Value::from(item.unwrap().into_value()))
        .collect()
    }

    #[test]
    fn test_walk_is_pre_order() {
        use serde_json::json;
        let doc = json!({"a": [1, {"b": 2}], "c": 3});
        assert_eq!(
            walk(doc.clone(), Depth::Level(1), Depth::Last),
            vec![json!([1, {"b": 2}]), json!(1), json!({"b": 2}), json!(2), json!(3)]
        );
        assert_eq!(walk(doc, Depth::Last, Depth::Last), vec![json!(1), json!(2), json!(3)]);
    }

    #[test]
    fn test_select_collapses_out_of_bounds_runs() {
        let flags = Flags {
            strict: true,
            in_predicate: true,
            ..Default::default()
        };
        let elements = Rc::new(Elements::Array(Rc::new(vec![Value::Integer(7)])));
        let items: Vec<_> = select(elements, -5, 1_000_000_000, flags)
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(items, vec![Item::Absent, Item::Value(Value::Integer(7)), Item::Absent]);
    }
}
