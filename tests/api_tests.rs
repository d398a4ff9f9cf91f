// tests/api_tests.rs

use pretty_assertions::assert_eq;
use serde_json::{Value as Json, json};
use sqljson_path::{
    CompiledQuery, Error, Options, QueryError, RegexDialect, Value, exists, parse, path_match,
    query, query_first,
};

fn doc(json: Json) -> Value {
    Value::from(json)
}

fn collect(
    root: &Value,
    path: &str,
    vars: Option<&Value>,
    options: &Options,
) -> Result<Vec<Json>, QueryError> {
    query(root, path, vars, options)
        .unwrap()
        .map(|result| result.map(Json::from))
        .collect()
}

// ============================================================================
// query_first
// ============================================================================

#[test]
fn test_query_first() {
    let options = Options::default();
    assert_eq!(
        query_first(&doc(json!([1, 2])), "$[*]", None, &options).unwrap(),
        Some(Value::Integer(1))
    );
    assert_eq!(query_first(&doc(json!([])), "$[*]", None, &options).unwrap(), None);
}

#[test]
fn test_query_first_reports_later_errors() {
    let root = doc(json!([{"a": 1}, 2]));
    let err = query_first(&root, "strict $[*].a", None, &Options::default()).unwrap_err();
    assert!(matches!(err, Error::Query(QueryError::Access(_))));

    let silent = Options::new().silent(true);
    assert_eq!(
        query_first(&root, "strict $[*].a", None, &silent).unwrap(),
        Some(Value::Integer(1))
    );
}

// ============================================================================
// exists
// ============================================================================

#[test]
fn test_exists() {
    let root = doc(json!({"a": 12}));
    let options = Options::default();
    assert_eq!(exists(&root, "$.a.b", None, &options).unwrap(), Some(false));
    assert_eq!(exists(&root, "$.a", None, &options).unwrap(), Some(true));
    assert_eq!(exists(&root, "$.*", None, &options).unwrap(), Some(true));
}

#[test]
fn test_exists_in_strict_mode() {
    let root = doc(json!({"a": 12}));
    let err = exists(&root, "strict $.b", None, &Options::default()).unwrap_err();
    assert_eq!(err.to_string(), "JSON object does not contain key \"b\"");
    assert_eq!(
        exists(&root, "strict $.b", None, &Options::new().silent(true)).unwrap(),
        None
    );
}

// ============================================================================
// path_match
// ============================================================================

#[test]
fn test_path_match() {
    let options = Options::default();
    assert_eq!(path_match(&doc(json!({"a": 2})), "$.a > 1", None, &options).unwrap(), Some(true));
    assert_eq!(path_match(&doc(json!({"a": 0})), "$.a > 1", None, &options).unwrap(), Some(false));
    assert_eq!(path_match(&doc(json!({"a": "x"})), "$.a > 1", None, &options).unwrap(), None);
    assert_eq!(path_match(&doc(json!({"a": true})), "$.a", None, &options).unwrap(), Some(true));
}

#[test]
fn test_path_match_needs_a_single_boolean() {
    let options = Options::default();
    let err = path_match(&doc(json!({"a": 1})), "$.a", None, &options).unwrap_err();
    assert_eq!(err.to_string(), "single boolean result is expected");

    let err = path_match(&doc(json!([true, false])), "$[*]", None, &options).unwrap_err();
    assert!(matches!(err.as_query_error(), Some(QueryError::SingleBoolean)));

    let silent = Options::new().silent(true);
    assert_eq!(path_match(&doc(json!({"a": 1})), "$.a", None, &silent).unwrap(), None);
}

#[test]
fn test_path_match_does_not_silence_unknown_variables() {
    let silent = Options::new().silent(true);
    let err = path_match(&doc(json!(1)), "$ == $x", None, &silent).unwrap_err();
    assert!(matches!(err, Error::Query(QueryError::UnknownVariable(name)) if name == "x"));
}

// ============================================================================
// Variables
// ============================================================================

#[test]
fn test_variables() {
    let root = doc(json!({"a": [1, 2, 3]}));
    let vars = doc(json!({"min": 1, "name with space": 3}));
    let options = Options::default();
    assert_eq!(
        collect(&root, "$.a[*] ? (@ > $min)", Some(&vars), &options).unwrap(),
        vec![json!(2), json!(3)]
    );
    assert_eq!(
        collect(&root, r#"$.a[*] ? (@ == $"name with space")"#, Some(&vars), &options).unwrap(),
        vec![json!(3)]
    );
    assert_eq!(
        collect(&root, "$.a[0]", Some(&Value::Null), &options).unwrap(),
        vec![json!(1)]
    );
}

#[test]
fn test_vars_must_be_an_object() {
    let root = doc(json!(1));
    let vars = doc(json!([1]));
    let err = collect(&root, "$", Some(&vars), &Options::default()).unwrap_err();
    assert_eq!(err, QueryError::Vars);
    assert_eq!(err.to_string(), "\"vars\" argument is not an object");

    assert_eq!(
        collect(&root, "$", Some(&vars), &Options::new().silent(true)).unwrap(),
        Vec::<Json>::new()
    );
}

#[test]
fn test_unknown_variable_escapes_silent_mode() {
    let root = doc(json!(1));
    let silent = Options::new().silent(true);
    let err = query_first(&root, "$x", None, &silent).unwrap_err();
    assert!(matches!(err, Error::Query(QueryError::UnknownVariable(name)) if name == "x"));

    let vars = doc(json!({"y": 1}));
    let err = collect(&root, "$ ? (@ == $x)", Some(&vars), &silent).unwrap_err();
    assert_eq!(err, QueryError::UnknownVariable("x".to_string()));
}

// ============================================================================
// Options
// ============================================================================

#[test]
fn test_strict_option_overrides_path_mode() {
    let root = doc(json!({"a": 1}));
    let err = collect(&root, "lax $.b", None, &Options::new().strict(true)).unwrap_err();
    assert!(matches!(err, QueryError::Access(_)));
    assert_eq!(
        collect(&root, "strict $.b", None, &Options::new().strict(false)).unwrap(),
        Vec::<Json>::new()
    );

    assert!(CompiledQuery::compile("$", &Options::new().strict(true)).unwrap().is_strict());
    assert!(CompiledQuery::compile("strict $", &Options::default()).unwrap().is_strict());
    assert!(!CompiledQuery::compile("$", &Options::default()).unwrap().is_strict());
}

#[test]
fn test_keyvalue_ids() {
    let root = doc(json!({"a": 1}));
    let plain = collect(&root, "$.keyvalue()", None, &Options::default()).unwrap();
    assert_eq!(plain, vec![json!({"key": "a", "value": 1})]);

    let options = Options::new().get_id(|object| Some(object.len() as i64 * 100));
    let with_ids = collect(&root, "$.keyvalue()", None, &options).unwrap();
    assert_eq!(with_ids, vec![json!({"id": 100, "key": "a", "value": 1})]);

    let options = Options::new().get_id(|_| None);
    let without = collect(&root, "$.keyvalue()", None, &options).unwrap();
    assert_eq!(without, vec![json!({"key": "a", "value": 1})]);
}

#[test]
fn test_regex_dialects() {
    let root = doc(json!("a b"));
    let posix = Options::new().regex(RegexDialect::Posix);
    assert_eq!(
        collect(&root, r#"$ like_regex "a\\y""#, None, &posix).unwrap(),
        vec![json!(true)]
    );
    assert_eq!(
        collect(&root, r#"$ like_regex "^[[:alpha:]] [[:alpha:]]$""#, None, &posix).unwrap(),
        vec![json!(true)]
    );

    // \y is not an escape the native syntax knows
    let err = query(&root, r#"$ like_regex "a\\y""#, None, &Options::default()).err().unwrap();
    assert!(matches!(err, Error::Regex(_)));
}

#[test]
fn test_expanded_regex_flag_is_rejected() {
    let root = doc(json!("a"));
    for options in [Options::default(), Options::new().regex(RegexDialect::Posix)] {
        let err = query(&root, r#"$ like_regex "a" flag "x""#, None, &options).err().unwrap();
        assert!(matches!(err, Error::Unsupported(_)));
    }
}

// ============================================================================
// Compiled queries
// ============================================================================

#[test]
fn test_compiled_query_is_reusable() {
    let compiled = CompiledQuery::compile("$.a * 2", &Options::default()).unwrap();
    let first: Vec<_> = compiled.run(&doc(json!({"a": 1})), None).collect();
    let second: Vec<_> = compiled.run(&doc(json!({"a": 5})), None).collect();
    assert_eq!(first, vec![Ok(Value::Integer(2))]);
    assert_eq!(second, vec![Ok(Value::Integer(10))]);
}

#[test]
fn test_compiled_query_keeps_its_own_options() {
    let compiled = CompiledQuery::compile("1 / $", &Options::new().silent(true)).unwrap();
    assert!(compiled.is_silent());
    let results: Vec<_> = query(&doc(json!(0)), &compiled, None, &Options::default())
        .unwrap()
        .collect();
    assert!(results.is_empty());
}

#[test]
fn test_parsed_path_can_be_queried() {
    let path = parse("$.a[last]").unwrap();
    assert_eq!(
        query_first(&doc(json!({"a": [1, 2]})), &path, None, &Options::default()).unwrap(),
        Some(Value::Integer(2))
    );
}

#[test]
fn test_results_stop_after_an_error() {
    let root = doc(json!([{"a": 1}, 2, {"a": 3}]));
    let mut results = query(&root, "strict $[*].a", None, &Options::default()).unwrap();
    assert_eq!(results.next(), Some(Ok(Value::Integer(1))));
    assert!(matches!(results.next(), Some(Err(QueryError::Access(_)))));
    assert_eq!(results.next(), None);
    assert_eq!(results.next(), None);
}

#[test]
fn test_syntax_errors_are_not_query_errors() {
    let err = query(&doc(json!(1)), "$.", None, &Options::new().silent(true)).err().unwrap();
    assert!(matches!(err, Error::Parse(_)));
    assert!(err.as_query_error().is_none());
}
