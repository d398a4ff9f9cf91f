//! Public entry points: compile a path once, run it against documents.
//!
//! ```
//! use sqljson_path::{Options, Value, query};
//! use serde_json::json;
//!
//! let doc = Value::from(json!({"a": [1, 2, 3]}));
//! let results: Vec<_> = query::query(&doc, "$.a[last]", None, &Options::default())
//!     .unwrap()
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//! assert_eq!(results, vec![Value::Integer(3)]);
//! ```

use std::{fmt, iter::FusedIterator, rc::Rc};

use log::debug;

use crate::{
    ast::JsonPath,
    error::{Error, QueryError},
    evaluator::{Compiler, Context, ExprFn, Flags, Item, Seq},
    parser,
    value::{Map, Value},
};

/// Maps an object to a caller-assigned id for `.keyvalue()` records.
pub type IdLookup = Rc<dyn Fn(&Rc<Map>) -> Option<i64>>;

/// Syntax of `like_regex` patterns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RegexDialect {
    /// The `regex` crate's own syntax
    #[default]
    Native,
    /// POSIX advanced regular expressions, translated first
    Posix,
}

/// Compilation options.
#[derive(Clone, Default)]
pub struct Options {
    /// Overrides the `strict`/`lax` mode written in the path
    pub strict: Option<bool>,
    /// End the result sequence instead of returning evaluation errors
    pub silent: bool,
    pub regex: RegexDialect,
    pub get_id: Option<IdLookup>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = Some(strict);
        self
    }

    pub fn silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    pub fn regex(mut self, dialect: RegexDialect) -> Self {
        self.regex = dialect;
        self
    }

    pub fn get_id(mut self, get_id: impl Fn(&Rc<Map>) -> Option<i64> + 'static) -> Self {
        self.get_id = Some(Rc::new(get_id));
        self
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("strict", &self.strict)
            .field("silent", &self.silent)
            .field("regex", &self.regex)
            .field("get_id", &self.get_id.is_some())
            .finish()
    }
}

/// A path compiled for repeated evaluation. Cloning is cheap.
#[derive(Clone)]
pub struct CompiledQuery {
    expr: ExprFn,
    strict: bool,
    silent: bool,
}

impl CompiledQuery {
    pub fn new(path: &JsonPath, options: &Options) -> Result<Self, Error> {
        let strict = options.strict.unwrap_or(path.strict);
        let expr = Compiler::new(options)
            .expr_or_predicate(&path.expr_or_predicate, Flags::new(strict))?;
        debug!(
            "compiled {} path `{}` (silent: {}, regex: {:?})",
            if strict { "strict" } else { "lax" },
            path.expr_or_predicate,
            options.silent,
            options.regex
        );
        Ok(CompiledQuery {
            expr,
            strict,
            silent: options.silent,
        })
    }

    /// Parses and compiles path text.
    pub fn compile(source: &str, options: &Options) -> Result<Self, Error> {
        Self::new(&parser::parse(source)?, options)
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn is_silent(&self) -> bool {
        self.silent
    }

    /// Evaluation items before output normalization, ignoring silent mode.
    fn items(&self, root: &Value, vars: Option<&Value>) -> Seq {
        let vars = match vars {
            None | Some(Value::Null) => None,
            Some(Value::Object(map)) => Some(map.clone()),
            Some(_) => return Box::new(std::iter::once(Err(QueryError::Vars))),
        };
        (self.expr)(&Context::new(root.clone(), vars))
    }

    /// Runs the query. `vars` must be an object or `null`.
    pub fn run(&self, root: &Value, vars: Option<&Value>) -> QueryResults {
        QueryResults {
            items: Some(self.items(root, vars)),
            silent: self.silent,
        }
    }
}

impl fmt::Debug for CompiledQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledQuery")
            .field("strict", &self.strict)
            .field("silent", &self.silent)
            .finish_non_exhaustive()
    }
}

/// Lazy results of [`CompiledQuery::run`].
///
/// Absent items come out as `null` and date/time values as strings. The
/// iterator ends after the first error; in silent mode that error is
/// dropped unless it is an unknown variable.
pub struct QueryResults {
    items: Option<Seq>,
    silent: bool,
}

impl Iterator for QueryResults {
    type Item = Result<Value, QueryError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.items.as_mut()?.next() {
            Some(Ok(item)) => Some(Ok(item.into_value())),
            Some(Err(err)) => {
                self.items = None;
                if self.silent && err.is_silenceable() {
                    debug!("silent query stopped: {err}");
                    None
                } else {
                    Some(Err(err))
                }
            }
            None => {
                self.items = None;
                None
            }
        }
    }
}

impl FusedIterator for QueryResults {}

/// Anything the entry points accept as a path.
pub trait IntoQuery {
    fn into_query(self, options: &Options) -> Result<CompiledQuery, Error>;
}

impl IntoQuery for &str {
    fn into_query(self, options: &Options) -> Result<CompiledQuery, Error> {
        CompiledQuery::compile(self, options)
    }
}

impl IntoQuery for &JsonPath {
    fn into_query(self, options: &Options) -> Result<CompiledQuery, Error> {
        CompiledQuery::new(self, options)
    }
}

/// An already compiled query keeps its own options.
impl IntoQuery for CompiledQuery {
    fn into_query(self, _options: &Options) -> Result<CompiledQuery, Error> {
        Ok(self)
    }
}

impl IntoQuery for &CompiledQuery {
    fn into_query(self, _options: &Options) -> Result<CompiledQuery, Error> {
        Ok(self.clone())
    }
}

/// All results of `path` over `root`.
pub fn query(
    root: &Value,
    path: impl IntoQuery,
    vars: Option<&Value>,
    options: &Options,
) -> Result<QueryResults, Error> {
    Ok(path.into_query(options)?.run(root, vars))
}

/// The first result. Outside silent mode the remaining results are still
/// evaluated so that a later error is reported.
pub fn query_first(
    root: &Value,
    path: impl IntoQuery,
    vars: Option<&Value>,
    options: &Options,
) -> Result<Option<Value>, Error> {
    let compiled = path.into_query(options)?;
    let mut results = compiled.run(root, vars);
    if compiled.silent {
        return Ok(results.next().transpose()?);
    }
    let mut first = None;
    for result in results {
        let value = result?;
        first.get_or_insert(value);
    }
    Ok(first)
}

/// Whether the path selects anything; `None` when that is unknown.
///
/// Absent items are seen before normalization: lax mode answers `true` on
/// the first present item and unknown when every item is absent, strict
/// mode answers unknown on the first absent item.
pub fn exists(
    root: &Value,
    path: impl IntoQuery,
    vars: Option<&Value>,
    options: &Options,
) -> Result<Option<bool>, Error> {
    let compiled = path.into_query(options)?;
    match exists_in(compiled.items(root, vars), compiled.strict) {
        Err(err) if compiled.silent && err.is_silenceable() => {
            debug!("silent exists check stopped: {err}");
            Ok(None)
        }
        result => Ok(result?),
    }
}

fn exists_in(items: Seq, strict: bool) -> Result<Option<bool>, QueryError> {
    let mut result = Some(false);
    for item in items {
        match (strict, item?) {
            (false, Item::Absent) => result = None,
            (false, _) => return Ok(Some(true)),
            (true, Item::Absent) => return Ok(None),
            (true, _) => result = Some(true),
        }
    }
    Ok(result)
}

/// The single boolean a predicate path produces; `None` for `null`.
///
/// Anything other than exactly one boolean or `null` result is
/// [`QueryError::SingleBoolean`]. Silent mode turns silenceable errors
/// into `None`; an unknown variable still surfaces.
pub fn path_match(
    root: &Value,
    path: impl IntoQuery,
    vars: Option<&Value>,
    options: &Options,
) -> Result<Option<bool>, Error> {
    let compiled = path.into_query(options)?;
    match single_boolean(compiled.run(root, vars)) {
        Err(err) if compiled.silent && err.is_silenceable() => {
            debug!("silent match stopped: {err}");
            Ok(None)
        }
        result => Ok(result?),
    }
}

fn single_boolean(mut results: QueryResults) -> Result<Option<bool>, QueryError> {
    let first = results.next().transpose()?;
    if results.next().transpose()?.is_some() {
        return Err(QueryError::SingleBoolean);
    }
    match first {
        Some(Value::Boolean(b)) => Ok(Some(b)),
        Some(Value::Null) => Ok(None),
        _ => Err(QueryError::SingleBoolean),
    }
}
