use std::rc::Rc;

use crate::{
    ast::{ExprOrPredicate, Method},
    datetime::{self, Jsonable, Template},
    error::{Error, QueryError},
    evaluator::{Compiler, ExprFn, Flags, Item, bind, elements, empty, expr_fn, fail, once},
    value::{Map, Value},
};

fn abs(value: &Value) -> Value {
    match value {
        Value::Integer(n) => n
            .checked_abs()
            .map(Value::Integer)
            .unwrap_or_else(|| Value::Float((*n as f64).abs())),
        Value::Float(n) => Value::Float(n.abs()),
        other => other.clone(),
    }
}

fn floor(value: &Value) -> Value {
    match value {
        Value::Float(n) => Value::from_f64(n.floor()),
        other => other.clone(),
    }
}

fn ceiling(value: &Value) -> Value {
    match value {
        Value::Float(n) => Value::from_f64(n.ceil()),
        other => other.clone(),
    }
}

fn double(item: Item) -> Result<Option<Item>, QueryError> {
    match item {
        Item::Value(value) if value.is_number() => match value.as_f64() {
            Some(n) if n.is_finite() => Ok(Some(Item::Value(value))),
            _ => Err(QueryError::Type(
                "numeric argument of jsonpath item method .double() is out of range for type double precision"
                    .to_string(),
            )),
        },
        Item::Value(Value::String(s)) => match s.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => Ok(Some(Item::Value(Value::from_f64(n)))),
            _ => Err(QueryError::Type(
                "string argument of jsonpath item method .double() is not a valid representation of a double precision number"
                    .to_string(),
            )),
        },
        _ => Err(QueryError::Type(
            "jsonpath item method .double() can only be applied to a string or numeric value"
                .to_string(),
        )),
    }
}

impl Compiler<'_> {
    pub(crate) fn method(
        &self,
        base: &ExprOrPredicate,
        method: Method,
        flags: Flags,
    ) -> Result<ExprFn, Error> {
        match method {
            Method::Abs => self.numeric_method(base, method, abs, flags),
            Method::Floor => self.numeric_method(base, method, floor, flags),
            Method::Ceiling => self.numeric_method(base, method, ceiling, flags),
            Method::Double => self.scalar_method(base, flags, double),
            Method::Size => self.size(base, flags),
            Method::Type => self.type_method(base, flags),
            Method::KeyValue => self.keyvalue(base, flags),
        }
    }

    /// Applies `apply` to each scalar of the base. `Ok(None)` drops the
    /// item. Absent items pass through untouched.
    fn scalar_method(
        &self,
        base: &ExprOrPredicate,
        flags: Flags,
        apply: impl Fn(Item) -> Result<Option<Item>, QueryError> + 'static,
    ) -> Result<ExprFn, Error> {
        let base = self.scalar_base(base, flags)?;
        let apply = Rc::new(apply);
        Ok(expr_fn(move |ctx| {
            let apply = apply.clone();
            bind(base(ctx), move |item| match item {
                Item::Absent => once(Item::Absent),
                item => match apply(item) {
                    Ok(Some(result)) => once(result),
                    Ok(None) => empty(),
                    Err(err) => fail(err),
                },
            })
        }))
    }

    fn numeric_method(
        &self,
        base: &ExprOrPredicate,
        method: Method,
        apply: fn(&Value) -> Value,
        flags: Flags,
    ) -> Result<ExprFn, Error> {
        let name = method.name();
        self.scalar_method(base, flags, move |item| match item.number() {
            Some(value) => Ok(Some(Item::Value(apply(value)))),
            None => Err(QueryError::Type(format!(
                "jsonpath item method .{name}() can only be applied to a numeric value"
            ))),
        })
    }

    /// Array length; lax mode counts any other item as size 1.
    fn size(&self, base: &ExprOrPredicate, flags: Flags) -> Result<ExprFn, Error> {
        let base = self.expr_or_predicate(base, flags)?;
        Ok(expr_fn(move |ctx| {
            bind(base(ctx), move |item| match item {
                Item::Value(Value::Array(array)) => once(Value::Integer(array.len() as i64)),
                _ if !flags.strict => once(Value::Integer(1)),
                _ if flags.in_predicate => once(Item::Absent),
                _ => fail(QueryError::Type(
                    "jsonpath item method .size() can only be applied to an array".to_string(),
                )),
            })
        }))
    }

    fn type_method(&self, base: &ExprOrPredicate, flags: Flags) -> Result<ExprFn, Error> {
        let base = self.expr_or_predicate(base, flags)?;
        Ok(expr_fn(move |ctx| {
            bind(base(ctx), |item| match item {
                Item::Value(value) => once(Value::from(value.type_name())),
                Item::DateTime(dt) => once(Value::from(dt.type_name())),
                Item::Absent => once(Item::Absent),
            })
        }))
    }

    /// One `{id?, key, value}` record per object member.
    fn keyvalue(&self, base: &ExprOrPredicate, flags: Flags) -> Result<ExprFn, Error> {
        let base = self.scalar_base(base, flags)?;
        let get_id = self.options.get_id.clone();
        Ok(expr_fn(move |ctx| {
            let get_id = get_id.clone();
            bind(base(ctx), move |item| match item {
                Item::Value(Value::Object(object)) => {
                    let id = get_id.as_ref().and_then(|get_id| get_id(&object));
                    let records = object
                        .iter()
                        .map(|(key, value)| {
                            let mut record = Map::new();
                            if let Some(id) = id {
                                record.insert("id".to_string(), Value::Integer(id));
                            }
                            record.insert("key".to_string(), Value::from(key.as_str()));
                            record.insert("value".to_string(), value.clone());
                            Value::object(record)
                        })
                        .collect();
                    elements(Rc::new(records))
                }
                _ if flags.in_predicate => once(Item::Absent),
                _ => fail(QueryError::Type(
                    "jsonpath item method .keyvalue() can only be applied to an object".to_string(),
                )),
            })
        }))
    }

    /// `.datetime()` with the default grammar, or with a template that is
    /// compiled here once.
    pub(crate) fn datetime(
        &self,
        base: &ExprOrPredicate,
        template: Option<&str>,
        flags: Flags,
    ) -> Result<ExprFn, Error> {
        let template = match template {
            Some(source) => Some(
                Template::compile(source)
                    .ok_or_else(|| QueryError::DateTime(source.to_string()))?,
            ),
            None => None,
        };
        let in_predicate = flags.in_predicate;
        self.scalar_method(base, flags, move |item| {
            let Item::Value(Value::String(text)) = item else {
                return Err(QueryError::Type(
                    "jsonpath item method .datetime() can only be applied to a string".to_string(),
                ));
            };
            match datetime::parse(&text, template.as_ref()) {
                Some(dt) => Ok(Some(Item::DateTime(dt))),
                None if in_predicate => Ok(None),
                None => Err(QueryError::DateTime(text)),
            }
        })
    }
}
