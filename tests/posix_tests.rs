// tests/posix_tests.rs

use pretty_assertions::assert_eq;
use rstest::rstest;
use sqljson_path::ast::LikeRegexFlags;
use sqljson_path::posix::{self, PosixFlags, Syntax};
use sqljson_path::Error;

fn translate(pattern: &str) -> Result<String, Error> {
    posix::translate(pattern, &mut PosixFlags::default())
}

fn matches(pattern: &str, flags: &str, input: &str) -> bool {
    let flags = LikeRegexFlags::parse(flags).unwrap();
    posix::compile(pattern, &flags).unwrap().is_match(input)
}

// ============================================================================
// Translation
// ============================================================================

#[rstest]
#[case(r"abc", r"abc")]
#[case(r"\y", r"\b")]
#[case(r"a\Yb", r"a\Bb")]
#[case(r"\mfoo\M", r"\b{start}foo\b{end}")]
#[case(r"[[:<:]]x[[:>:]]", r"\b{start}x\b{end}")]
#[case(r"\Ax\Z", r"\Ax\z")]
#[case(r"[[:alpha:]]", r"[\p{L}\p{Nl}]")]
#[case(r"[^[:digit:]_]", r"[^\p{Nd}_]")]
#[case(r"[]a]", r"[\]a]")]
#[case(r"[a&~b]", r"[a\&\~b]")]
#[case(r"[[.-.]]", r"[\-]")]
#[case(r"\e\B", r"\x1B\\")]
#[case(r"A\x42\U0001F600", r"A\x{42}\x{1F600}")]
#[case(r"\cA\07", r"\x{1}\x{7}")]
#[case(r"\d+\s*\w?", r"\d+\s*\w?")]
#[case(r"a{2,3}?b{4}", r"a{2,3}?b{4}")]
#[case(r"a]b}", r"a\]b\}")]
#[case(r"(?#note)a", r"a")]
#[case(r"(a|b)(?:c)", r"(a|b)(?:c)")]
#[case(r"\.\*", r"\.\*")]
fn test_translate(#[case] pattern: &str, #[case] expected: &str) {
    assert_eq!(translate(pattern).unwrap(), expected);
}

#[rstest]
#[case(r"(?=a)")]
#[case(r"(?<!a)b")]
#[case(r"(a)\1")]
#[case(r"[[=a=]]")]
#[case(r"[[:bogus:]]")]
#[case(r"(a")]
#[case(r"a)")]
#[case(r"[a")]
#[case(r"a{,2}")]
#[case(r"a{2")]
#[case(r"[a[b]")]
#[case(r"\k")]
#[case(r"\")]
#[case(r"(?z)a")]
#[case(r"(?#open")]
fn test_translate_rejects(#[case] pattern: &str) {
    assert!(translate(pattern).is_err(), "should reject {pattern:?}");
}

// ============================================================================
// Directors and embedded options
// ============================================================================

#[test]
fn test_quoting_director() {
    let mut flags = PosixFlags::default();
    assert_eq!(posix::translate("***=a.b", &mut flags).unwrap(), r"a\.b");
    assert!(flags.quoted);
}

#[test]
fn test_advanced_director() {
    let mut flags = PosixFlags::default();
    assert_eq!(posix::translate(r"***\y", &mut flags).unwrap(), r"\b");
    assert_eq!(flags.syntax, Syntax::Advanced);
}

#[test]
fn test_embedded_options() {
    let mut flags = PosixFlags::default();
    assert_eq!(posix::translate("(?i)abc", &mut flags).unwrap(), "abc");
    assert!(flags.ignore_case);

    let mut flags = PosixFlags::default();
    posix::translate("(?n)a", &mut flags).unwrap();
    assert!(flags.multiline && flags.dot_all);
}

#[rstest]
#[case("(?b)a")]
#[case("(?e)a")]
#[case("(?x)a")]
fn test_unsupported_syntaxes(#[case] pattern: &str) {
    assert!(matches!(translate(pattern), Err(Error::Unsupported(_))));
}

#[test]
fn test_expanded_flag_is_unsupported() {
    let flags = LikeRegexFlags::parse("x").unwrap();
    assert!(matches!(posix::compile("a", &flags), Err(Error::Unsupported(_))));
}

// ============================================================================
// Matching
// ============================================================================

#[test]
fn test_character_classes_match() {
    assert!(matches("^[[:upper:]]+$", "", "ÀBC"));
    assert!(!matches("^[[:upper:]]+$", "", "abc"));
    assert!(matches("^[[:xdigit:]]+$", "", "0fA9"));
}

#[test]
fn test_word_constraints_match() {
    assert!(matches(r"\mword\M", "", "a word here"));
    assert!(!matches(r"\mword\M", "", "swordfish"));
    assert!(matches(r"^ab\y", "i", "AB cd"));
}

#[test]
fn test_flags_match() {
    assert!(matches("^a.b$", "s", "a\nb"));
    assert!(!matches("^a.b$", "", "a\nb"));
    assert!(matches("^b", "m", "a\nb"));
    assert!(!matches("^b", "", "a\nb"));
    assert!(matches("a.b", "q", "xa.by"));
    assert!(!matches("a.b", "q", "axb"));
}
