use crate::{ast::Token, error::LexError};

/// Characters that end an unquoted word.
const SPECIAL: &str = "?%$.[]{}()|&!=<>@#,*:-+/\\\"";

fn is_blank(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\n' | '\r' | '\x0C')
}

fn is_word_char(ch: char) -> bool {
    !is_blank(ch) && !SPECIAL.contains(ch)
}

pub struct Lexer {
    input: Vec<char>,
    position: usize,
    token_start: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
            token_start: 0,
        }
    }

    /// Character offset where the most recent token started.
    pub fn token_start(&self) -> usize {
        self.token_start
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn error(&self, message: impl Into<String>) -> LexError {
        LexError {
            message: message.into(),
            position: self.position,
        }
    }

    fn skip_blanks_and_comments(&mut self) -> Result<(), LexError> {
        loop {
            match self.current_char() {
                Some(ch) if is_blank(ch) => self.advance(),
                Some('/') if self.peek_char(1) == Some('*') => {
                    self.position += 2;
                    loop {
                        match self.current_char() {
                            None => return Err(self.error("unterminated /* comment")),
                            Some('*') if self.peek_char(1) == Some('/') => {
                                self.position += 2;
                                break;
                            }
                            Some(_) => self.advance(),
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn read_hex(&mut self, min: usize, max: usize) -> Option<u32> {
        let mut digits = String::new();
        while digits.len() < max {
            match self.current_char() {
                Some(ch) if ch.is_ascii_hexdigit() => {
                    digits.push(ch);
                    self.advance();
                }
                _ => break,
            }
        }
        if digits.len() < min {
            return None;
        }
        u32::from_str_radix(&digits, 16).ok()
    }

    /// Reads the escape sequence after a backslash, which must already be
    /// consumed.
    fn read_escape(&mut self) -> Result<char, LexError> {
        let ch = self
            .current_char()
            .ok_or_else(|| self.error("unexpected end after backslash"))?;
        self.advance();
        let code = match ch {
            'b' => return Ok('\x08'),
            'f' => return Ok('\x0C'),
            'n' => return Ok('\n'),
            'r' => return Ok('\r'),
            't' => return Ok('\t'),
            'v' => return Ok('\x0B'),
            'x' => self
                .read_hex(2, 2)
                .ok_or_else(|| self.error("invalid hexadecimal character sequence"))?,
            'u' if self.current_char() == Some('{') => {
                self.advance();
                let code = self
                    .read_hex(1, 6)
                    .ok_or_else(|| self.error("invalid Unicode escape sequence"))?;
                if self.current_char() != Some('}') {
                    return Err(self.error("invalid Unicode escape sequence"));
                }
                self.advance();
                code
            }
            'u' => {
                let code = self
                    .read_hex(4, 4)
                    .ok_or_else(|| self.error("invalid Unicode escape sequence"))?;
                // High surrogate: a low surrogate escape must follow
                if (0xD800..0xDC00).contains(&code) {
                    if self.current_char() == Some('\\') && self.peek_char(1) == Some('u') {
                        self.position += 2;
                        let low = self
                            .read_hex(4, 4)
                            .filter(|low| (0xDC00..0xE000).contains(low))
                            .ok_or_else(|| self.error("invalid Unicode surrogate pair"))?;
                        0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00)
                    } else {
                        return Err(self.error("invalid Unicode surrogate pair"));
                    }
                } else {
                    code
                }
            }
            other => return Ok(other),
        };
        char::from_u32(code).ok_or_else(|| self.error("invalid Unicode code point"))
    }

    /// Reads a double-quoted string; the opening quote is current.
    fn read_string(&mut self) -> Result<String, LexError> {
        let mut result = String::new();
        self.advance(); // Consume opening quote

        while let Some(ch) = self.current_char() {
            match ch {
                '"' => {
                    self.advance();
                    return Ok(result);
                }
                '\\' => {
                    self.advance();
                    result.push(self.read_escape()?);
                }
                _ => {
                    result.push(ch);
                    self.advance();
                }
            }
        }

        Err(self.error("unterminated quoted string"))
    }

    /// Reads an unquoted word. Escapes are allowed and decoded.
    fn read_word(&mut self) -> Result<String, LexError> {
        let mut result = String::new();
        while let Some(ch) = self.current_char() {
            if ch == '\\' {
                self.advance();
                result.push(self.read_escape()?);
            } else if is_word_char(ch) {
                result.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        Ok(result)
    }

    fn read_digits(&mut self, into: &mut String) {
        while let Some(ch) = self.current_char().filter(char::is_ascii_digit) {
            into.push(ch);
            self.advance();
        }
    }

    /// Integer part is `0` or a digit run without a leading zero; a leading
    /// zero ends the literal so `00` lexes as two numbers.
    fn read_number(&mut self) -> Result<Token, LexError> {
        let mut number = String::new();
        if self.current_char() == Some('0') {
            number.push('0');
            self.advance();
        } else {
            self.read_digits(&mut number);
        }

        let mut is_integer = true;
        if self.current_char() == Some('.') && self.peek_char(1).is_some_and(|c| c.is_ascii_digit())
        {
            is_integer = false;
            number.push('.');
            self.advance();
            self.read_digits(&mut number);
        }

        let mut has_exponent = false;
        if matches!(self.current_char(), Some('e' | 'E')) {
            has_exponent = true;
            number.push('e');
            self.advance();
            if let Some(sign @ ('+' | '-')) = self.current_char() {
                number.push(sign);
                self.advance();
            }
            if !self.current_char().is_some_and(|c| c.is_ascii_digit()) {
                return Err(self.error("trailing junk after numeric literal"));
            }
            self.read_digits(&mut number);
        }

        if is_integer
            && !has_exponent
            && let Ok(n) = number.parse::<i64>()
        {
            return Ok(Token::Integer(n));
        }
        let n: f64 = number
            .parse()
            .map_err(|_| self.error(format!("invalid numeric literal \"{number}\"")))?;
        if is_integer && n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
            Ok(Token::Integer(n as i64))
        } else {
            Ok(Token::Float(n))
        }
    }

    pub fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_blanks_and_comments()?;
        self.token_start = self.position;

        let token = match self.current_char() {
            None => Token::Eof,
            Some('$') => {
                self.advance();
                match self.current_char() {
                    Some('"') => Token::Variable(self.read_string()?),
                    Some(ch) if is_word_char(ch) => {
                        let mut name = String::new();
                        while let Some(ch) = self.current_char().filter(|c| is_word_char(*c)) {
                            name.push(ch);
                            self.advance();
                        }
                        Token::Variable(name)
                    }
                    _ => Token::Dollar,
                }
            }
            Some('@') => self.single(Token::At),
            Some('.') => self.single(Token::Dot),
            Some(',') => self.single(Token::Comma),
            Some('+') => self.single(Token::Plus),
            Some('-') => self.single(Token::Minus),
            Some('/') => self.single(Token::Slash),
            Some('%') => self.single(Token::Percent),
            Some('?') => self.single(Token::Question),
            Some('(') => self.single(Token::LParen),
            Some(')') => self.single(Token::RParen),
            Some('[') => self.single(Token::LBracket),
            Some(']') => self.single(Token::RBracket),
            Some('{') => self.single(Token::LBrace),
            Some('}') => self.single(Token::RBrace),
            Some('*') => match self.peek_char(1) {
                Some('*') => self.double(Token::StarStar),
                _ => self.single(Token::Star),
            },
            Some('=') => match self.peek_char(1) {
                Some('=') => self.double(Token::EqEq),
                _ => return Err(self.error("unexpected '=' (did you mean '=='?)")),
            },
            Some('!') => match self.peek_char(1) {
                Some('=') => self.double(Token::NotEq),
                _ => self.single(Token::Exclamation),
            },
            Some('<') => match self.peek_char(1) {
                Some('=') => self.double(Token::LtEq),
                Some('>') => self.double(Token::NotEq),
                _ => self.single(Token::Lt),
            },
            Some('>') => match self.peek_char(1) {
                Some('=') => self.double(Token::GtEq),
                _ => self.single(Token::Gt),
            },
            Some('&') => match self.peek_char(1) {
                Some('&') => self.double(Token::AndAnd),
                _ => return Err(self.error("unexpected '&' (did you mean '&&'?)")),
            },
            Some('|') => match self.peek_char(1) {
                Some('|') => self.double(Token::OrOr),
                _ => return Err(self.error("unexpected '|' (did you mean '||'?)")),
            },
            Some('"') => Token::String(self.read_string()?),
            Some(ch) if ch.is_ascii_digit() => self.read_number()?,
            Some(ch) if ch == '\\' || is_word_char(ch) => Token::Identifier(self.read_word()?),
            Some(ch) => return Err(self.error(format!("unexpected character '{ch}'"))),
        };
        Ok(token)
    }

    fn single(&mut self, token: Token) -> Token {
        self.advance();
        token
    }

    fn double(&mut self, token: Token) -> Token {
        self.position += 2;
        token
    }

    /// Lexes the whole input, ending with [`Token::Eof`].
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token == Token::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }
}

#[test]
fn test_keywords_are_identifiers() {
    let mut lexer = Lexer::new("like_regex STRICT null");
    assert_eq!(lexer.next_token(), Ok(Token::Identifier("like_regex".to_string())));
    assert_eq!(lexer.next_token(), Ok(Token::Identifier("STRICT".to_string())));
    assert_eq!(lexer.next_token(), Ok(Token::Identifier("null".to_string())));
    assert_eq!(lexer.next_token(), Ok(Token::Eof));
}

#[test]
fn test_filter_tokens() {
    let mut lexer = Lexer::new("$.a ? (@ <> 5)");
    assert_eq!(lexer.next_token(), Ok(Token::Dollar));
    assert_eq!(lexer.next_token(), Ok(Token::Dot));
    assert_eq!(lexer.next_token(), Ok(Token::Identifier("a".to_string())));
    assert_eq!(lexer.next_token(), Ok(Token::Question));
    assert_eq!(lexer.next_token(), Ok(Token::LParen));
    assert_eq!(lexer.next_token(), Ok(Token::At));
    assert_eq!(lexer.next_token(), Ok(Token::NotEq));
    assert_eq!(lexer.next_token(), Ok(Token::Integer(5)));
    assert_eq!(lexer.next_token(), Ok(Token::RParen));
}
