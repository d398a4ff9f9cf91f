// tests/parser_tests.rs

use pretty_assertions::assert_eq;
use rstest::rstest;
use sqljson_path::ast::{
    CompareOp, Depth, Expr, ExprOrPredicate, IndexElement, JsonPath, Literal, Method, Predicate,
};
use sqljson_path::value::ArithOp;
use sqljson_path::{Error, parse};

fn expr(source: &str) -> Expr {
    match parse(source).unwrap().expr_or_predicate {
        ExprOrPredicate::Expr(expr) => expr,
        other => panic!("expected an expression, got {other:?}"),
    }
}

fn predicate(source: &str) -> Predicate {
    match parse(source).unwrap().expr_or_predicate {
        ExprOrPredicate::Predicate(predicate) => predicate,
        other => panic!("expected a predicate, got {other:?}"),
    }
}

fn key(base: Expr, name: &str) -> Expr {
    Expr::key(base, Some(name.to_string()))
}

fn int(n: i64) -> Expr {
    Expr::literal(Literal::Integer(n))
}

// ============================================================================
// Accessors
// ============================================================================

#[test]
fn test_member_chain() {
    assert_eq!(expr("$.a.b"), key(key(Expr::Root, "a"), "b"));
}

#[test]
fn test_quoted_member_and_keyword_member() {
    assert_eq!(expr(r#"$."a b""#), key(Expr::Root, "a b"));
    assert_eq!(expr("$.size"), key(Expr::Root, "size"));
    assert_eq!(expr("$.last"), key(Expr::Root, "last"));
}

#[test]
fn test_wildcards() {
    assert_eq!(expr("$.*"), Expr::key(Expr::Root, None));
    assert_eq!(expr("$[*]"), Expr::index(Expr::Root, None).unwrap());
}

#[test]
fn test_subscript_list() {
    let expected = Expr::index(
        Expr::Root,
        Some(vec![
            IndexElement::Single(int(1)),
            IndexElement::To {
                start: int(2),
                end: Expr::Last,
            },
        ]),
    )
    .unwrap();
    assert_eq!(expr("$[1, 2 to last]"), expected);
}

#[test]
fn test_any_path_windows() {
    assert_eq!(expr("$.**"), Expr::any_path(Expr::Root, Depth::Level(0), Depth::Last));
    assert_eq!(expr("$.**{2}"), Expr::any_path(Expr::Root, Depth::Level(2), Depth::Level(2)));
    assert_eq!(
        expr("$.**{1 to last}"),
        Expr::any_path(Expr::Root, Depth::Level(1), Depth::Last)
    );
    assert_eq!(expr("$.**{last}"), Expr::any_path(Expr::Root, Depth::Last, Depth::Last));
}

#[test]
fn test_methods() {
    assert_eq!(expr("$.a.size()"), Expr::method(key(Expr::Root, "a"), Method::Size));
    assert_eq!(expr("$.KeyValue()"), Expr::method(Expr::Root, Method::KeyValue));
    assert_eq!(expr("$.datetime()"), Expr::datetime(Expr::Root, None));
    assert_eq!(
        expr(r#"$.datetime("yyyy")"#),
        Expr::datetime(Expr::Root, Some("yyyy".to_string()))
    );
}

#[test]
fn test_unknown_method() {
    assert!(matches!(parse("$.frobnicate()"), Err(Error::Parse(_))));
}

#[test]
fn test_filter() {
    let expected = Expr::filter(
        key(Expr::Root, "a"),
        Predicate::comparison(CompareOp::GreaterThan, key(Expr::Current, "b"), int(1)),
    );
    assert_eq!(expr("$.a ? (@.b > 1)"), expected);
}

// ============================================================================
// Operators
// ============================================================================

#[test]
fn test_arithmetic_precedence() {
    let expected = Expr::binary(
        ArithOp::Add,
        int(1),
        Expr::binary(ArithOp::Mul, int(2), int(3)),
    );
    assert_eq!(expr("1 + 2 * 3"), expected);

    let expected = Expr::binary(
        ArithOp::Sub,
        Expr::binary(ArithOp::Sub, int(1), int(2)),
        int(3),
    );
    assert_eq!(expr("1 - 2 - 3"), expected);
}

#[test]
fn test_unary_minus_folds_literals() {
    assert_eq!(expr("-1"), int(-1));
    assert_eq!(expr("-$.a"), Expr::minus(key(Expr::Root, "a")));
    assert_eq!(expr("+1.5"), Expr::literal(Literal::Float(1.5)));
}

#[test]
fn test_boolean_precedence() {
    let a = Predicate::exists(key(Expr::Root, "a"));
    let b = Predicate::exists(key(Expr::Root, "b"));
    let c = Predicate::exists(key(Expr::Root, "c"));
    assert_eq!(
        predicate("exists($.a) || exists($.b) && exists($.c)"),
        Predicate::or(a.clone(), Predicate::and(b.clone(), c))
    );
    assert_eq!(
        predicate("!exists($.a) && exists($.b)"),
        Predicate::and(Predicate::not(a), b)
    );
}

#[test]
fn test_is_unknown() {
    assert_eq!(
        predicate("($ == 1) is unknown"),
        Predicate::is_unknown(Predicate::comparison(CompareOp::Equal, Expr::Root, int(1)))
    );
}

#[test]
fn test_starts_with_and_like_regex() {
    assert_eq!(
        predicate(r#"$ starts with "ab""#),
        Predicate::starts_with(Expr::Root, Expr::literal(Literal::String("ab".to_string())))
    );
    assert_eq!(
        predicate("$ starts with $p"),
        Predicate::starts_with(Expr::Root, Expr::Variable("p".to_string()))
    );
    assert_eq!(
        predicate(r#"$ like_regex "^a" flag "is""#),
        Predicate::like_regex(Expr::Root, "^a", "is").unwrap()
    );
}

#[test]
fn test_literal_keywords_are_case_sensitive() {
    assert_eq!(expr("null"), Expr::literal(Literal::Null));
    assert_eq!(expr("true"), Expr::literal(Literal::Boolean(true)));
    assert!(parse("TRUE").is_err());
}

// ============================================================================
// Mode prefix and errors
// ============================================================================

#[test]
fn test_mode_prefix() {
    assert!(parse("strict $").unwrap().strict);
    assert!(parse("STRICT $").unwrap().strict);
    assert!(!parse("lax $").unwrap().strict);
    assert!(!parse("$").unwrap().strict);
}

#[rstest]
#[case("")]
#[case("$.")]
#[case("$ $")]
#[case("$[]")]
#[case("$ ? (@)")]
#[case("!$")]
#[case("$.a like_regex \"x\" flag \"z\"")]
#[case("$.**{-1}")]
fn test_syntax_errors(#[case] source: &str) {
    assert!(parse(source).is_err(), "should reject {source:?}");
}

#[test]
fn test_error_reports_position() {
    let err = parse("$.a )").unwrap_err();
    match err {
        Error::Parse(err) => assert_eq!(err.position, 4),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_unknown_flag_message() {
    let err = parse(r#"$ like_regex "x" flag "z""#).unwrap_err();
    assert_eq!(err.to_string(), "unknown flag \"z\"");
}

// ============================================================================
// Round trips through Display
// ============================================================================

#[rstest]
#[case("$")]
#[case("strict $.a.b")]
#[case("$.*")]
#[case("$[*]")]
#[case("$[0, 2 to last]")]
#[case("$[last - 1]")]
#[case("$.**")]
#[case("$.**{2}")]
#[case("$.**{1 to last}")]
#[case("$.\"a b\"")]
#[case("$.\"a\\fb\"")]
#[case("$var")]
#[case("$\"my var\"")]
#[case("$.a.type()")]
#[case("$.a.datetime(\"dd.mm.yyyy\")")]
#[case("$.a ? (@.b > 1 && @.c == \"x\")")]
#[case("$ ? (!(@ > 1))")]
#[case("!exists ($.a)")]
#[case("($.a == 1) is unknown")]
#[case("$.a > 1 || $.b < 2 && $.c != 3")]
#[case("($.a > 1 || $.b < 2) && $.c != 3")]
#[case("1 + 2 * 3")]
#[case("(1 + 2) * 3")]
#[case("1 - (2 - 3)")]
#[case("-$.a")]
#[case("(-1).abs()")]
#[case("$ like_regex \"^a.c$\" flag \"i\"")]
#[case("$ starts with \"ab\"")]
#[case("null")]
fn test_display_round_trip(#[case] source: &str) {
    let path = parse(source).unwrap();
    assert_eq!(path.to_string(), source);
    assert_eq!(parse(&path.to_string()).unwrap(), path);
}

#[test]
fn test_display_drops_redundant_parentheses() {
    assert_eq!(parse("(($.a))").unwrap().to_string(), "$.a");
    assert_eq!(parse("lax ($.a + (1 * 2))").unwrap().to_string(), "$.a + 1 * 2");
}

#[test]
fn test_hand_built_tree_renders() {
    let path = JsonPath::new(
        Expr::filter(
            key(Expr::Root, "items"),
            Predicate::comparison(CompareOp::LessEqual, key(Expr::Current, "price"), int(10)),
        ),
        true,
    );
    assert_eq!(path.to_string(), "strict $.items ? (@.price <= 10)");
}
