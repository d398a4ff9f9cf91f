// tests/lexer_tests.rs

use sqljson_path::ast::Token;
use sqljson_path::lexer::Lexer;

fn tokens(input: &str) -> Vec<Token> {
    Lexer::new(input).tokenize().unwrap()
}

fn ident(s: &str) -> Token {
    Token::Identifier(s.to_string())
}

// ============================================================================
// Punctuation and operators
// ============================================================================

#[test]
fn test_single_char_tokens() {
    let test_cases = vec![
        ("$", Token::Dollar),
        ("@", Token::At),
        ("?", Token::Question),
        ("!", Token::Exclamation),
        ("+", Token::Plus),
        ("-", Token::Minus),
        ("*", Token::Star),
        ("/", Token::Slash),
        ("%", Token::Percent),
        ("(", Token::LParen),
        (")", Token::RParen),
        ("[", Token::LBracket),
        ("]", Token::RBracket),
        ("{", Token::LBrace),
        ("}", Token::RBrace),
        (",", Token::Comma),
        (".", Token::Dot),
        ("<", Token::Lt),
        (">", Token::Gt),
    ];

    for (input, expected) in test_cases {
        assert_eq!(tokens(input), vec![expected, Token::Eof], "input: {input}");
    }
}

#[test]
fn test_two_char_tokens() {
    let test_cases = vec![
        ("==", Token::EqEq),
        ("!=", Token::NotEq),
        ("<>", Token::NotEq),
        ("<=", Token::LtEq),
        (">=", Token::GtEq),
        ("&&", Token::AndAnd),
        ("||", Token::OrOr),
        ("**", Token::StarStar),
    ];

    for (input, expected) in test_cases {
        assert_eq!(tokens(input), vec![expected, Token::Eof], "input: {input}");
    }
}

#[test]
fn test_single_equals_is_an_error() {
    assert!(Lexer::new("$ = 1").tokenize().is_err());
    assert!(Lexer::new("$ & 1").tokenize().is_err());
    assert!(Lexer::new("$ | 1").tokenize().is_err());
}

// ============================================================================
// Numbers
// ============================================================================

#[test]
fn test_numbers() {
    assert_eq!(tokens("42"), vec![Token::Integer(42), Token::Eof]);
    assert_eq!(tokens("1.5"), vec![Token::Float(1.5), Token::Eof]);
    assert_eq!(tokens("1e3"), vec![Token::Integer(1000), Token::Eof]);
    assert_eq!(tokens("2.5e-1"), vec![Token::Float(0.25), Token::Eof]);
}

#[test]
fn test_leading_zero_ends_the_literal() {
    assert_eq!(tokens("00"), vec![Token::Integer(0), Token::Integer(0), Token::Eof]);
}

#[test]
fn test_dot_after_integer_is_an_accessor() {
    assert_eq!(
        tokens("1.type()"),
        vec![
            Token::Integer(1),
            Token::Dot,
            ident("type"),
            Token::LParen,
            Token::RParen,
            Token::Eof
        ]
    );
}

#[test]
fn test_exponent_without_digits() {
    let err = Lexer::new("1e").tokenize().unwrap_err();
    assert_eq!(err.message, "trailing junk after numeric literal");
    assert_eq!(err.position, 2);
}

// ============================================================================
// Strings, variables and identifiers
// ============================================================================

#[test]
fn test_string_escapes() {
    assert_eq!(
        tokens(r#""a\"b\n\t\x41B\u{43}""#),
        vec![Token::String("a\"b\n\tABC".to_string()), Token::Eof]
    );
}

#[test]
fn test_surrogate_pair_escape() {
    assert_eq!(
        tokens(r#""\uD83D\uDE00""#),
        vec![Token::String("\u{1F600}".to_string()), Token::Eof]
    );
    assert!(Lexer::new(r#""\uD83D""#).tokenize().is_err());
}

#[test]
fn test_unterminated_string() {
    let err = Lexer::new(r#""abc"#).tokenize().unwrap_err();
    assert_eq!(err.message, "unterminated quoted string");
}

#[test]
fn test_variables() {
    assert_eq!(tokens("$min"), vec![Token::Variable("min".to_string()), Token::Eof]);
    assert_eq!(
        tokens(r#"$"with space""#),
        vec![Token::Variable("with space".to_string()), Token::Eof]
    );
    assert_eq!(tokens("$.a"), vec![Token::Dollar, Token::Dot, ident("a"), Token::Eof]);
}

#[test]
fn test_identifiers_stop_at_special_characters() {
    assert_eq!(
        tokens("$.a_b-c"),
        vec![Token::Dollar, Token::Dot, ident("a_b"), Token::Minus, ident("c"), Token::Eof]
    );
}

#[test]
fn test_keywords_are_case_insensitive() {
    let lexed = tokens("Exists LIKE_REGEX last");
    assert!(lexed[0].is_keyword("exists"));
    assert!(lexed[1].is_keyword("like_regex"));
    assert!(lexed[2].is_keyword("last"));
    assert!(!Token::String("last".to_string()).is_keyword("last"));
}

// ============================================================================
// Blanks and comments
// ============================================================================

#[test]
fn test_comments_are_skipped() {
    assert_eq!(
        tokens("$ /* the root */ . a"),
        vec![Token::Dollar, Token::Dot, ident("a"), Token::Eof]
    );
}

#[test]
fn test_unterminated_comment() {
    assert!(Lexer::new("$ /* open").tokenize().is_err());
}

#[test]
fn test_token_start_positions() {
    let mut lexer = Lexer::new("  $.abc");
    lexer.next_token().unwrap();
    assert_eq!(lexer.token_start(), 2);
    lexer.next_token().unwrap();
    assert_eq!(lexer.token_start(), 3);
    lexer.next_token().unwrap();
    assert_eq!(lexer.token_start(), 4);
}
