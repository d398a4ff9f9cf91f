// tests/datetime_tests.rs

use std::cmp::Ordering;

use pretty_assertions::assert_eq;
use rstest::rstest;
use sqljson_path::datetime::{self, DateTime, Jsonable, Template};

fn with_template(template: &str, input: &str) -> Option<DateTime> {
    let template = Template::compile(template).unwrap();
    datetime::parse(input, Some(&template))
}

fn rendered(template: &str, input: &str) -> Option<String> {
    with_template(template, input).map(|dt| dt.to_json())
}

// ============================================================================
// Templates
// ============================================================================

#[rstest]
#[case("yyyy-mm-dd", "2011-12-13", "2011-12-13")]
#[case("dd.mm.yyyy", "13.12.2011", "2011-12-13")]
#[case("YYYY/MM/DD", " 2011/12/13 ", "2011-12-13")]
#[case("yyyy-mm-dd HH24:MI:SS", "2011-12-13 14:15:16", "2011-12-13T14:15:16")]
#[case("HH24:MI", "09:05", "09:05:00")]
#[case("HH12:MI AM", "12:30 AM", "00:30:00")]
#[case("HH12:MI PM", "01:30 PM", "13:30:00")]
#[case("HH12:MI p.m.", "11:00 p.m.", "23:00:00")]
#[case("SSSS", "3661", "01:01:01")]
#[case("yyyy-mm-dd HH24:MI TZH:TZM", "2011-12-13 14:15 +03:30", "2011-12-13T14:15:00+03:30")]
#[case("yyyy-mm-dd HH24:MI TZH:TZM", "2011-12-13 14:15 -03:30", "2011-12-13T14:15:00-03:30")]
#[case("HH24:MI TZH", "14:15 -00", "14:15:00+00:00")]
#[case("yyyy-RM-dd", "2011-XII-13", "2011-12-13")]
#[case("yyyy-rm-dd", "2011-iv-13", "2011-04-13")]
#[case("Y,YYY-mm-dd", "2,011-12-13", "2011-12-13")]
#[case("yy-mm-dd", "11-12-13", "2011-12-13")]
#[case("CC", "21", "2001-01-01")]
#[case("yyyy-mm-dd BC", "0044-03-15 BC", "0044-03-15 BC")]
#[case(r#"yyyy"T"mm"#, "2011T12", "2011-12-01")]
#[case("FXyyyy-mm-dd", "2011-12-13", "2011-12-13")]
fn test_template_parsing(#[case] template: &str, #[case] input: &str, #[case] expected: &str) {
    assert_eq!(rendered(template, input).as_deref(), Some(expected));
}

#[rstest]
#[case("yyyy-mm-dd", "2011-13-01")]
#[case("yyyy-mm-dd", "2019-02-29")]
#[case("yyyy-mm-dd", "2011-12-13x")]
#[case("HH24:MI", "24:00")]
#[case("HH12:MI", "13:00")]
#[case("SSSS", "86400")]
#[case("J", "2455000")]
#[case("yyyy-mm-dd HH24:MI TZH:TZM", "2011-12-13 14:15 +03:75")]
fn test_template_rejects(#[case] template: &str, #[case] input: &str) {
    assert_eq!(rendered(template, input), None, "{template} should reject {input:?}");
}

#[test]
fn test_leap_years() {
    assert_eq!(rendered("yyyy-mm-dd", "2020-02-29").as_deref(), Some("2020-02-29"));
    assert_eq!(rendered("yyyy-mm-dd", "2000-02-29").as_deref(), Some("2000-02-29"));
    assert_eq!(rendered("yyyy-mm-dd", "1900-02-29"), None);
}

#[test]
fn test_twelve_without_meridiem_is_midnight() {
    assert_eq!(rendered("HH:MI", "12:15").as_deref(), Some("00:15:00"));
    assert_eq!(rendered("HH12:MI", "11:15").as_deref(), Some("11:15:00"));
}

#[test]
fn test_fractional_seconds_truncate_to_microseconds() {
    let value = datetime::parse("12:34:59.9999999", None).unwrap();
    assert_eq!(value.to_json(), "12:34:59.999999");
    let value = datetime::parse("12:34:56.25", None).unwrap();
    assert_eq!(value.to_json(), "12:34:56.250000");
}

#[test]
fn test_invalid_templates() {
    assert!(Template::compile("yyyy-mm-dd%").is_none());
    assert!(Template::compile(r#"yyyy "unterminated"#).is_none());
    assert_eq!(Template::compile("dd.mm.yyyy").unwrap().as_str(), "dd.mm.yyyy");
}

#[test]
fn test_variant_follows_fields_present() {
    assert_eq!(with_template("yyyy", "2011").unwrap().type_name(), "date");
    assert_eq!(with_template("HH24", "10").unwrap().type_name(), "time without time zone");
    assert_eq!(
        with_template("HH24 TZH", "10 +02").unwrap().type_name(),
        "time with time zone"
    );
    assert_eq!(
        with_template("yyyy HH24", "2011 10").unwrap().type_name(),
        "timestamp without time zone"
    );
    assert_eq!(
        with_template("yyyy HH24 TZH", "2011 10 +02").unwrap().type_name(),
        "timestamp with time zone"
    );
}

// ============================================================================
// Default grammar
// ============================================================================

#[rstest]
#[case("2017-03-10", "2017-03-10", "date")]
#[case("12:34:56", "12:34:56", "time without time zone")]
#[case("12:34:56+03", "12:34:56+03:00", "time with time zone")]
#[case("2017-03-10 12:34:56", "2017-03-10T12:34:56", "timestamp without time zone")]
#[case("2017-03-10T12:34:56-03:30", "2017-03-10T12:34:56-03:30", "timestamp with time zone")]
#[case("2017-03-10 12:34:56+3:10", "2017-03-10T12:34:56+03:10", "timestamp with time zone")]
#[case("  2017-3-1  ", "2017-03-01", "date")]
fn test_default_grammar(#[case] input: &str, #[case] expected: &str, #[case] type_name: &str) {
    let value = datetime::parse(input, None).unwrap();
    assert_eq!(value.to_json(), expected);
    assert_eq!(value.type_name(), type_name);
}

#[rstest]
#[case("garbage")]
#[case("")]
#[case("2017-02-30")]
#[case("25:00:00")]
#[case("2017-03-10 12:34")]
fn test_default_grammar_rejects(#[case] input: &str) {
    assert_eq!(datetime::parse(input, None), None);
}

// ============================================================================
// Comparison
// ============================================================================

#[test]
fn test_compare_uses_offsets() {
    let a = datetime::parse("2017-03-10T12:00:00+01:00", None).unwrap();
    let b = datetime::parse("2017-03-10T11:00:00+00:00", None).unwrap();
    let c = datetime::parse("2017-03-10T11:30:00+00:00", None).unwrap();
    assert_eq!(a.compare(&b), Some(Ordering::Equal));
    assert_eq!(a.compare(&c), Some(Ordering::Less));
}

#[test]
fn test_compare_across_variants_is_undefined() {
    let date = datetime::parse("2017-03-10", None).unwrap();
    let time = datetime::parse("12:00:00", None).unwrap();
    assert_eq!(date.compare(&time), None);
    assert_eq!(date.compare(&date), Some(Ordering::Equal));
}

#[test]
fn test_bc_dates_order_before_ad() {
    let bc = with_template("yyyy-mm-dd BC", "0001-01-01 BC").unwrap();
    let ad = with_template("yyyy-mm-dd", "0001-01-01").unwrap();
    assert_eq!(bc.compare(&ad), Some(Ordering::Less));
}
