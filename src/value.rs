use std::{fmt, rc::Rc};

use indexmap::IndexMap;
use rust_decimal::{Decimal, prelude::FromPrimitive, prelude::ToPrimitive};

/// Object storage: keys are unique and keep their insertion order.
pub type Map = IndexMap<String, Value>;

/// A JSON value as seen by the path evaluator.
///
/// This type represents all valid JSON types with a distinction between
/// integers and floats. Both are the same JSON "number" for comparisons,
/// `.type()` and arithmetic; the split only keeps whole numbers exact.
///
/// Arrays and objects are reference counted, so cloning a value while a
/// query walks the document never copies a subtree.
///
/// # Examples
///
/// ```
/// use sqljson_path::Value;
/// use serde_json::json;
///
/// let value = Value::from(json!({"a": [1, 2.5, "x"]}));
/// assert_eq!(value.type_name(), "object");
/// assert_eq!(Value::Integer(1), Value::Float(1.0));
/// ```
#[derive(Debug, Clone)]
pub enum Value {
    /// JSON null
    Null,

    /// JSON boolean (true/false)
    Boolean(bool),

    /// Integer number (preserved separately from floats)
    Integer(i64),

    /// Floating-point number
    Float(f64),

    /// UTF-8 string
    String(String),

    /// Array of values
    Array(Rc<Vec<Value>>),

    /// Object with insertion-ordered keys
    Object(Rc<Map>),
}

impl Value {
    pub fn array(values: Vec<Value>) -> Self {
        Value::Array(Rc::new(values))
    }

    pub fn object(map: Map) -> Self {
        Value::Object(Rc::new(map))
    }

    /// Builds a number, keeping it an integer when the float is whole.
    pub fn from_f64(n: f64) -> Self {
        if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
            Value::Integer(n as i64)
        } else {
            Value::Float(n)
        }
    }

    /// JSON type name as reported by `.type()`.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) | Value::Float(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Float(_))
    }

    /// Get as float
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Float(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Rc<Map>> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Rc<Vec<Value>>> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// True for numeric zero of either representation.
    pub fn is_zero(&self) -> bool {
        match self {
            Value::Integer(n) => *n == 0,
            Value::Float(n) => *n == 0.0,
            _ => false,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (a, b) if a.is_number() && b.is_number() => a.as_f64() == b.as_f64(),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", serde_json::Value::from(self.clone()))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(arr) => {
                Value::array(arr.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(obj) => {
                Value::object(obj.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => serde_json::Value::Null,
            Value::Boolean(b) => serde_json::Value::Bool(b),
            Value::Integer(i) => serde_json::Value::Number(i.into()),
            Value::Float(f) => serde_json::Number::from_f64(f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s),
            Value::Array(arr) => serde_json::Value::Array(
                arr.iter().cloned().map(serde_json::Value::from).collect(),
            ),
            Value::Object(obj) => serde_json::Value::Object(
                obj.iter()
                    .map(|(k, v)| (k.clone(), serde_json::Value::from(v.clone())))
                    .collect(),
            ),
        }
    }
}

// ========================================
// Arithmetic
// ========================================

/// Binary arithmetic operators of the path language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl ArithOp {
    pub fn symbol(self) -> &'static str {
        match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "/",
            ArithOp::Mod => "%",
        }
    }
}

/// Applies `op` to two numbers.
///
/// Returns `None` when either side is not a number. Division by zero is
/// the caller's concern; here it follows IEEE rules.
pub fn arithmetic(op: ArithOp, left: &Value, right: &Value) -> Option<Value> {
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => Some(integer_op(op, *a, *b)),
        (Value::Float(a), Value::Float(b)) => Some(Value::from_f64(float_op(op, *a, *b))),
        (Value::Integer(a), Value::Float(b)) => {
            Some(decimal_op(op, Decimal::from_i64(*a), Decimal::from_f64(*b))
                .unwrap_or_else(|| Value::from_f64(float_op(op, *a as f64, *b))))
        }
        (Value::Float(a), Value::Integer(b)) => {
            Some(decimal_op(op, Decimal::from_f64(*a), Decimal::from_i64(*b))
                .unwrap_or_else(|| Value::from_f64(float_op(op, *a, *b as f64))))
        }
        _ => None,
    }
}

fn integer_op(op: ArithOp, a: i64, b: i64) -> Value {
    let exact = match op {
        ArithOp::Add => a.checked_add(b),
        ArithOp::Sub => a.checked_sub(b),
        ArithOp::Mul => a.checked_mul(b),
        // Check if division is exact; if not, fall through to float
        ArithOp::Div => match a.checked_rem(b) {
            Some(0) => a.checked_div(b),
            _ => None,
        },
        ArithOp::Mod => a.checked_rem(b),
    };
    exact
        .map(Value::Integer)
        .unwrap_or_else(|| Value::from_f64(float_op(op, a as f64, b as f64)))
}

fn float_op(op: ArithOp, a: f64, b: f64) -> f64 {
    match op {
        ArithOp::Add => a + b,
        ArithOp::Sub => a - b,
        ArithOp::Mul => a * b,
        ArithOp::Div => a / b,
        ArithOp::Mod => a % b,
    }
}

fn decimal_op(op: ArithOp, a: Option<Decimal>, b: Option<Decimal>) -> Option<Value> {
    let (a, b) = (a?, b?);
    let rd = match op {
        ArithOp::Add => a.checked_add(b),
        ArithOp::Sub => a.checked_sub(b),
        ArithOp::Mul => a.checked_mul(b),
        ArithOp::Div => a.checked_div(b),
        ArithOp::Mod => a.checked_rem(b),
    }?;
    if rd.is_integer()
        && let Some(r) = rd.to_i64()
    {
        return Some(Value::Integer(r));
    }
    rd.to_f64().map(Value::from_f64)
}

/// Unary minus, widening to float when the integer would overflow.
pub fn negate(value: &Value) -> Option<Value> {
    match value {
        Value::Integer(n) => Some(
            n.checked_neg()
                .map(Value::Integer)
                .unwrap_or(Value::Float(-(*n as f64))),
        ),
        Value::Float(n) => Some(Value::Float(-n)),
        _ => None,
    }
}
