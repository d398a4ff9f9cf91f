use std::mem;

use crate::{
    ast::{
        CompareOp, Depth, Expr, ExprOrPredicate, IndexElement, JsonPath, Literal, Method,
        Predicate, Token,
    },
    error::{Error, ParseError},
    lexer::Lexer,
    value::ArithOp,
};

pub struct Parser {
    lexer: Lexer,
    current_token: Token,
    position: usize,
}

impl Parser {
    pub fn new(mut lexer: Lexer) -> Result<Self, Error> {
        let current_token = lexer.next_token()?;
        let position = lexer.token_start();
        Ok(Parser {
            lexer,
            current_token,
            position,
        })
    }

    fn advance(&mut self) -> Result<(), Error> {
        self.current_token = self.lexer.next_token()?;
        self.position = self.lexer.token_start();
        Ok(())
    }

    /// Moves past the current token and returns it.
    fn take(&mut self) -> Result<Token, Error> {
        let token = mem::replace(&mut self.current_token, Token::Eof);
        self.advance()?;
        Ok(token)
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::Parse(ParseError {
            message: message.into(),
            position: self.position,
        })
    }

    fn unexpected(&self, context: &str) -> Error {
        let found = match &self.current_token {
            Token::Eof => "end of input".to_string(),
            token => format!("{token:?}"),
        };
        self.error(format!("unexpected {found} {context}"))
    }

    fn expect(&mut self, expected: Token) -> Result<(), Error> {
        if self.current_token != expected {
            return Err(self.error(format!(
                "expected {:?}, got {:?}",
                expected, self.current_token
            )));
        }
        self.advance()
    }

    fn check(&self, token: &Token) -> bool {
        &self.current_token == token
    }

    fn check_keyword(&self, keyword: &str) -> bool {
        self.current_token.is_keyword(keyword)
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<(), Error> {
        if !self.check_keyword(keyword) {
            return Err(self.unexpected(&format!("(expected \"{keyword}\")")));
        }
        self.advance()
    }

    fn into_expr(&self, node: ExprOrPredicate) -> Result<Expr, Error> {
        match node {
            ExprOrPredicate::Expr(expr) => Ok(expr),
            ExprOrPredicate::Predicate(_) => {
                Err(self.error("a predicate cannot be used as an operand here"))
            }
        }
    }

    fn into_predicate(&self, node: ExprOrPredicate) -> Result<Predicate, Error> {
        match node {
            ExprOrPredicate::Predicate(predicate) => Ok(predicate),
            ExprOrPredicate::Expr(_) => Err(self.error("a predicate is expected here")),
        }
    }

    /// Parse primary expressions: literals, `$`, `@`, `last`, variables and
    /// parenthesized expressions or predicates.
    fn parse_primary(&mut self) -> Result<ExprOrPredicate, Error> {
        let expr = match &self.current_token {
            // Literals
            Token::Integer(n) => Expr::literal(Literal::Integer(*n)),
            Token::Float(n) => Expr::literal(Literal::Float(*n)),
            Token::String(s) => Expr::literal(Literal::String(s.clone())),
            Token::Identifier(word) if word == "null" => Expr::literal(Literal::Null),
            Token::Identifier(word) if word == "true" => Expr::literal(Literal::Boolean(true)),
            Token::Identifier(word) if word == "false" => Expr::literal(Literal::Boolean(false)),

            // References
            Token::Dollar => Expr::Root,
            Token::At => Expr::Current,
            Token::Variable(name) => Expr::Variable(name.clone()),
            token if token.is_keyword("last") => Expr::Last,

            Token::LParen => {
                self.advance()?;
                let inner = self.parse_or()?;
                self.expect(Token::RParen)?;
                if let ExprOrPredicate::Predicate(predicate) = inner {
                    if self.check_keyword("is") {
                        self.advance()?;
                        self.expect_keyword("unknown")?;
                        return Ok(Predicate::is_unknown(predicate).into());
                    }
                    return Ok(predicate.into());
                }
                return Ok(inner);
            }

            _ => return Err(self.unexpected("in expression")),
        };
        self.advance()?;
        Ok(expr.into())
    }

    /// Parse a primary followed by any chain of accessors.
    fn parse_accessor(&mut self) -> Result<ExprOrPredicate, Error> {
        let mut node = self.parse_primary()?;

        loop {
            node = match self.current_token {
                Token::Dot => {
                    self.advance()?;
                    self.parse_dot_accessor(node)?.into()
                }
                Token::LBracket => {
                    self.advance()?;
                    self.parse_subscript(node)?.into()
                }
                Token::Question => {
                    self.advance()?;
                    self.expect(Token::LParen)?;
                    let predicate = self.parse_or()?;
                    let predicate = self.into_predicate(predicate)?;
                    self.expect(Token::RParen)?;
                    Expr::filter(node, predicate).into()
                }
                _ => return Ok(node),
            };
        }
    }

    /// Everything after a `.`: member names, wildcards and methods.
    fn parse_dot_accessor(&mut self, base: ExprOrPredicate) -> Result<Expr, Error> {
        match mem::replace(&mut self.current_token, Token::Eof) {
            Token::Star => {
                self.advance()?;
                Ok(Expr::key(base, None))
            }
            Token::StarStar => {
                self.advance()?;
                let (start, end) = self.parse_depth_window()?;
                Ok(Expr::any_path(base, start, end))
            }
            Token::String(key) => {
                self.advance()?;
                Ok(Expr::key(base, Some(key)))
            }
            Token::Identifier(word) => {
                self.advance()?;
                if !self.check(&Token::LParen) {
                    return Ok(Expr::key(base, Some(word)));
                }
                self.advance()?;
                if word.eq_ignore_ascii_case("datetime") {
                    let template = match mem::replace(&mut self.current_token, Token::Eof) {
                        Token::String(template) => {
                            self.advance()?;
                            Some(template)
                        }
                        other => {
                            self.current_token = other;
                            None
                        }
                    };
                    self.expect(Token::RParen)?;
                    return Ok(Expr::datetime(base, template));
                }
                let method = Method::from_name(&word)
                    .ok_or_else(|| self.error(format!("unknown method .{word}()")))?;
                self.expect(Token::RParen)?;
                Ok(Expr::method(base, method))
            }
            other => {
                self.current_token = other;
                Err(self.unexpected("after '.'"))
            }
        }
    }

    /// Optional `{level}` or `{start to end}` after `.**`.
    fn parse_depth_window(&mut self) -> Result<(Depth, Depth), Error> {
        if !self.check(&Token::LBrace) {
            return Ok((Depth::Level(0), Depth::Last));
        }
        self.advance()?;
        let start = self.parse_depth()?;
        let end = if self.check_keyword("to") {
            self.advance()?;
            self.parse_depth()?
        } else {
            start
        };
        self.expect(Token::RBrace)?;
        Ok((start, end))
    }

    fn parse_depth(&mut self) -> Result<Depth, Error> {
        let depth = match self.current_token {
            Token::Integer(n) => u32::try_from(n)
                .map(Depth::Level)
                .map_err(|_| self.error(format!("invalid depth level {n}")))?,
            ref token if token.is_keyword("last") => Depth::Last,
            _ => return Err(self.unexpected("in depth level")),
        };
        self.advance()?;
        Ok(depth)
    }

    /// `[*]` or a comma separated list of indexes and `to` ranges.
    fn parse_subscript(&mut self, base: ExprOrPredicate) -> Result<Expr, Error> {
        if self.check(&Token::Star) {
            self.advance()?;
            self.expect(Token::RBracket)?;
            return Ok(Expr::index(base, None)?);
        }

        let mut elements = Vec::new();
        loop {
            let start = self.parse_additive()?;
            let start = self.into_expr(start)?;
            if self.check_keyword("to") {
                self.advance()?;
                let end = self.parse_additive()?;
                let end = self.into_expr(end)?;
                elements.push(IndexElement::To { start, end });
            } else {
                elements.push(IndexElement::Single(start));
            }
            if self.check(&Token::Comma) {
                self.advance()?;
            } else {
                break;
            }
        }
        self.expect(Token::RBracket)?;
        Ok(Expr::index(base, Some(elements))?)
    }

    fn parse_unary(&mut self) -> Result<ExprOrPredicate, Error> {
        match self.current_token {
            Token::Plus => {
                self.advance()?;
                let operand = self.parse_unary()?;
                Ok(Expr::plus(self.into_expr(operand)?).into())
            }
            Token::Minus => {
                self.advance()?;
                let operand = self.parse_unary()?;
                Ok(Expr::minus(self.into_expr(operand)?).into())
            }
            _ => self.parse_accessor(),
        }
    }

    fn parse_multiplicative(&mut self) -> Result<ExprOrPredicate, Error> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match self.current_token {
                Token::Star => ArithOp::Mul,
                Token::Slash => ArithOp::Div,
                Token::Percent => ArithOp::Mod,
                _ => return Ok(left),
            };
            self.advance()?;
            let right = self.parse_unary()?;
            left = Expr::binary(op, self.into_expr(left)?, self.into_expr(right)?).into();
        }
    }

    fn parse_additive(&mut self) -> Result<ExprOrPredicate, Error> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match self.current_token {
                Token::Plus => ArithOp::Add,
                Token::Minus => ArithOp::Sub,
                _ => return Ok(left),
            };
            self.advance()?;
            let right = self.parse_multiplicative()?;
            left = Expr::binary(op, self.into_expr(left)?, self.into_expr(right)?).into();
        }
    }

    fn comparison_op(&self) -> Option<CompareOp> {
        match self.current_token {
            Token::EqEq => Some(CompareOp::Equal),
            Token::NotEq => Some(CompareOp::NotEqual),
            Token::Lt => Some(CompareOp::LessThan),
            Token::LtEq => Some(CompareOp::LessEqual),
            Token::Gt => Some(CompareOp::GreaterThan),
            Token::GtEq => Some(CompareOp::GreaterEqual),
            _ => None,
        }
    }

    /// `exists (...)`, comparisons, `starts with` and `like_regex`.
    fn parse_comparison(&mut self) -> Result<ExprOrPredicate, Error> {
        if self.check_keyword("exists") {
            return Ok(self.parse_exists()?.into());
        }

        let left = self.parse_additive()?;
        let ExprOrPredicate::Expr(left) = left else {
            return Ok(left);
        };

        if let Some(op) = self.comparison_op() {
            self.advance()?;
            let right = self.parse_additive()?;
            let right = self.into_expr(right)?;
            return Ok(Predicate::comparison(op, left, right).into());
        }

        if self.check_keyword("starts") {
            self.advance()?;
            self.expect_keyword("with")?;
            let initial = match self.take()? {
                Token::String(s) => Expr::literal(Literal::String(s)),
                Token::Variable(name) => Expr::Variable(name),
                _ => return Err(self.error("starts with requires a string or a variable")),
            };
            return Ok(Predicate::starts_with(left, initial).into());
        }

        if self.check_keyword("like_regex") {
            self.advance()?;
            let Token::String(pattern) = self.take()? else {
                return Err(self.error("like_regex requires a string pattern"));
            };
            let flags = if self.check_keyword("flag") {
                self.advance()?;
                let Token::String(flags) = self.take()? else {
                    return Err(self.error("flag requires a string"));
                };
                flags
            } else {
                String::new()
            };
            return Ok(Predicate::like_regex(left, &pattern, &flags)?.into());
        }

        Ok(left.into())
    }

    fn parse_exists(&mut self) -> Result<Predicate, Error> {
        self.expect_keyword("exists")?;
        self.expect(Token::LParen)?;
        let expr = self.parse_or()?;
        let expr = self.into_expr(expr)?;
        self.expect(Token::RParen)?;
        Ok(Predicate::exists(expr))
    }

    /// `!` applies only to `exists (...)` or a parenthesized predicate.
    fn parse_not(&mut self) -> Result<ExprOrPredicate, Error> {
        if !self.check(&Token::Exclamation) {
            return self.parse_comparison();
        }
        self.advance()?;
        let operand = if self.check_keyword("exists") {
            self.parse_exists()?
        } else if self.check(&Token::LParen) {
            self.advance()?;
            let inner = self.parse_or()?;
            let inner = self.into_predicate(inner)?;
            self.expect(Token::RParen)?;
            inner
        } else {
            return Err(self.unexpected("after '!'"));
        };
        Ok(Predicate::not(operand).into())
    }

    fn parse_and(&mut self) -> Result<ExprOrPredicate, Error> {
        let mut left = self.parse_not()?;

        while self.check(&Token::AndAnd) {
            self.advance()?;
            let right = self.parse_not()?;
            left = Predicate::and(self.into_predicate(left)?, self.into_predicate(right)?).into();
        }
        Ok(left)
    }

    fn parse_or(&mut self) -> Result<ExprOrPredicate, Error> {
        let mut left = self.parse_and()?;

        while self.check(&Token::OrOr) {
            self.advance()?;
            let right = self.parse_and()?;
            left = Predicate::or(self.into_predicate(left)?, self.into_predicate(right)?).into();
        }
        Ok(left)
    }

    pub fn parse_expression(&mut self) -> Result<ExprOrPredicate, Error> {
        self.parse_or()
    }

    /// Parse a complete path with its optional `lax`/`strict` prefix.
    pub fn parse(&mut self) -> Result<JsonPath, Error> {
        let strict = if self.check_keyword("strict") {
            self.advance()?;
            true
        } else {
            if self.check_keyword("lax") {
                self.advance()?;
            }
            false
        };

        let expr_or_predicate = self.parse_expression()?;
        if !self.check(&Token::Eof) {
            return Err(self.unexpected("after end of path"));
        }
        Ok(JsonPath::new(expr_or_predicate, strict))
    }
}

/// Parses path text.
///
/// # Examples
///
/// ```
/// use sqljson_path::parse;
///
/// let path = parse("strict $.a[0 to last] ? (@ > 1)").unwrap();
/// assert!(path.strict);
/// assert_eq!(path.to_string(), "strict $.a[0 to last] ? (@ > 1)");
/// ```
pub fn parse(source: &str) -> Result<JsonPath, Error> {
    Parser::new(Lexer::new(source))?.parse()
}
