/// Lexical tokens of the path language.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    /// Integer
    ///
    /// # Examples
    /// ```text
    /// 0
    /// 42
    /// 1e3
    /// ```
    Integer(i64),

    /// Decimal or exponent number
    ///
    /// # Examples
    /// ```text
    /// 3.14
    /// 2.5e-3
    /// ```
    Float(f64),

    /// String literal enclosed in double quotes
    ///
    /// # Examples
    /// ```text
    /// "hello"
    /// "tab\tseparated"
    /// ```
    String(String),

    /// Named variable (`$name` or `$"quoted name"`)
    Variable(String),

    /// Bare word: member names, keywords, `true`/`false`/`null`
    ///
    /// Keywords are not reserved; the parser decides from position whether
    /// `size` is a method, a member name or a syntax error.
    Identifier(String),

    // References
    /// Root item (`$`)
    Dollar,

    /// Current filter item (`@`)
    At,

    // Accessors
    /// Member accessor (`.`)
    Dot,

    /// Wildcard or multiplication (`*`)
    Star,

    /// Recursive wildcard (`**`)
    StarStar,

    /// Filter (`?`)
    Question,

    // Comparison
    /// `==`
    EqEq,

    /// `!=` or `<>`
    NotEq,

    /// `<`
    Lt,

    /// `<=`
    LtEq,

    /// `>`
    Gt,

    /// `>=`
    GtEq,

    // Logical
    /// `&&`
    AndAnd,

    /// `||`
    OrOr,

    /// `!`
    Exclamation,

    // Arithmetic
    /// `+`
    Plus,

    /// `-`
    Minus,

    /// `/`
    Slash,

    /// `%`
    Percent,

    // Delimiters
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,

    /// End of input
    Eof,
}

impl Token {
    /// Case-insensitive keyword test for identifiers.
    pub fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self, Token::Identifier(word) if word.eq_ignore_ascii_case(keyword))
    }
}
