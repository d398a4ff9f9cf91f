//! Translation of POSIX advanced regular expressions (the `like_regex`
//! dialect) into patterns for the `regex` crate.
//!
//! The translator walks the pattern once with a small state stack (top
//! level, inside a group, inside a bracket expression) and rewrites the
//! constructs whose spelling differs:
//!
//! ```text
//! \y  \Y          ->  \b  \B
//! \m  [[:<:]]     ->  \b{start}
//! \M  [[:>:]]     ->  \b{end}
//! \Z              ->  \z
//! [[:alpha:]]     ->  [\p{L}\p{Nl}]
//! \B  \e  \a      ->  \\  \x1B  \x07
//! ```
//!
//! Constructs the host engine cannot express (lookaround, back references,
//! equivalence classes) are rejected with a [`PosixError`].

use log::trace;
use regex::{Regex, RegexBuilder};

use crate::{
    ast::LikeRegexFlags,
    error::{Error, PosixError},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Syntax {
    #[default]
    Advanced,
    Basic,
    Extended,
}

/// Matching options after `like_regex` flags and embedded options are
/// combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PosixFlags {
    pub ignore_case: bool,
    pub dot_all: bool,
    pub multiline: bool,
    pub expanded: bool,
    pub quoted: bool,
    pub syntax: Syntax,
}

impl PosixFlags {
    /// Maps validated `like_regex` flags. The `x` flag has no translation.
    pub fn from_like_regex(flags: &LikeRegexFlags) -> Result<Self, Error> {
        if flags.expanded {
            return Err(Error::Unsupported(
                "XQuery \"x\" flag (expanded regular expressions) is not implemented".to_string(),
            ));
        }
        Ok(PosixFlags {
            ignore_case: flags.ignore_case,
            dot_all: flags.dot_all,
            multiline: flags.multiline,
            quoted: flags.quoted,
            ..Default::default()
        })
    }

    /// Applies one embedded option letter, as in `(?i)`.
    fn apply(&mut self, option: char) -> Result<(), PosixError> {
        match option {
            'b' => self.syntax = Syntax::Basic,
            'c' => self.ignore_case = false,
            'e' => self.syntax = Syntax::Extended,
            'i' => self.ignore_case = true,
            'm' | 'n' => {
                self.dot_all = true;
                self.multiline = true;
            }
            'p' => {
                self.dot_all = true;
                self.multiline = false;
            }
            'q' => self.quoted = true,
            's' => {
                self.dot_all = false;
                self.multiline = false;
            }
            't' => self.expanded = false,
            'w' => {
                self.dot_all = false;
                self.multiline = true;
            }
            'x' => self.expanded = true,
            other => return Err(PosixError(format!("invalid embedded option \"{other}\""))),
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Group,
    /// Bracket expression; `fresh` until its first member is read
    Bracket { fresh: bool },
}

fn err<T>(message: impl Into<String>) -> Result<T, PosixError> {
    Err(PosixError(message.into()))
}

fn class_members(name: &str) -> Option<&'static str> {
    Some(match name {
        "alnum" => r"\p{L}\p{Nl}\p{Nd}",
        "alpha" => r"\p{L}\p{Nl}",
        "ascii" => r"\x00-\x7F",
        "blank" => r"\p{Zs}\t",
        "cntrl" => r"\p{Cc}",
        "digit" => r"\p{Nd}",
        "graph" => r"\x21-\x7E",
        "lower" => r"\p{Ll}",
        "print" => r"\P{C}",
        "punct" => r"\p{P}",
        "space" => r"\p{Z}\t\r\n\v\f",
        "upper" => r"\p{Lu}",
        "word" => r"\p{L}\p{Nl}\p{Nd}\p{Pc}",
        "xdigit" => r"A-Fa-f0-9",
        _ => return None,
    })
}

fn code_point(code: u32) -> Result<String, PosixError> {
    match char::from_u32(code) {
        Some(_) => Ok(format!(r"\x{{{code:X}}}")),
        None => err(format!("invalid code point {code:#X}")),
    }
}

struct Translator<'a> {
    chars: &'a [char],
    pos: usize,
    stack: Vec<State>,
    out: String,
}

impl Translator<'_> {
    fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn rest_starts_with(&self, s: &str) -> bool {
        let mut i = self.pos;
        for c in s.chars() {
            if self.chars.get(i) != Some(&c) {
                return false;
            }
            i += 1;
        }
        true
    }

    /// Reads up to `max` characters matching `pred`.
    fn take_while(&mut self, max: usize, pred: impl Fn(char) -> bool) -> String {
        let mut taken = String::new();
        while taken.len() < max {
            match self.peek(0) {
                Some(c) if pred(c) => {
                    taken.push(c);
                    self.pos += 1;
                }
                _ => break,
            }
        }
        taken
    }

    /// Finds `close` starting at the cursor and returns the text before it.
    fn take_until(&mut self, close: &str) -> Option<String> {
        let start = self.pos;
        while self.pos < self.chars.len() {
            if self.rest_starts_with(close) {
                let body = self.chars[start..self.pos].iter().collect();
                self.pos += close.chars().count();
                return Some(body);
            }
            self.pos += 1;
        }
        self.pos = start;
        None
    }

    /// Escapes valid at every level. The backslash is current.
    fn escape(&mut self) -> Result<String, PosixError> {
        self.pos += 1;
        let Some(c) = self.peek(0) else {
            return err("invalid escape \\ sequence");
        };
        self.pos += 1;
        let translated = match c {
            'd' | 'D' | 's' | 'S' | 'w' | 'W' => format!("\\{c}"),
            'f' | 'n' | 'r' | 't' | 'v' => format!("\\{c}"),
            'a' => r"\x07".to_string(),
            'b' => r"\x08".to_string(),
            'B' => r"\\".to_string(),
            'e' => r"\x1B".to_string(),
            '0' => {
                let digits = self.take_while(2, |d| ('0'..='7').contains(&d));
                let code = if digits.is_empty() {
                    0
                } else {
                    u32::from_str_radix(&digits, 8).map_err(|e| PosixError(e.to_string()))?
                };
                code_point(code)?
            }
            '1'..='9' => return err("back references are not supported"),
            'u' | 'U' | 'x' => {
                let (min, max) = match c {
                    'u' => (4, 4),
                    'U' => (8, 8),
                    _ => (1, 8),
                };
                let digits = self.take_while(max, |d| d.is_ascii_hexdigit());
                if digits.len() < min {
                    return err("invalid escape \\ sequence");
                }
                let code =
                    u32::from_str_radix(&digits, 16).map_err(|e| PosixError(e.to_string()))?;
                code_point(code)?
            }
            'c' => match self.peek(0) {
                Some(x) => {
                    self.pos += 1;
                    code_point(x as u32 & 0x1F)?
                }
                None => return err("invalid escape \\ sequence"),
            },
            c if !c.is_alphanumeric() => regex::escape(&c.to_string()),
            _ => return err("invalid escape \\ sequence"),
        };
        Ok(translated)
    }

    /// One token outside brackets (top level or inside a group).
    fn outer_token(&mut self) -> Result<(), PosixError> {
        if self.rest_starts_with("[[:<:]]") {
            self.pos += 7;
            self.out.push_str(r"\b{start}");
            return Ok(());
        }
        if self.rest_starts_with("[[:>:]]") {
            self.pos += 7;
            self.out.push_str(r"\b{end}");
            return Ok(());
        }

        let Some(c) = self.peek(0) else {
            return Ok(());
        };
        match c {
            '(' => {
                if ["(?=", "(?!", "(?<=", "(?<!"].iter().any(|s| self.rest_starts_with(s)) {
                    return err("lookahead and lookbehind constraints are not supported");
                }
                if self.rest_starts_with("(?#") {
                    self.pos += 3;
                    if self.take_until(")").is_none() {
                        return err("unterminated comment");
                    }
                } else if self.rest_starts_with("(?:") {
                    self.pos += 3;
                    self.stack.push(State::Group);
                    self.out.push_str("(?:");
                } else if self.peek(1) == Some('?') {
                    return err("quantifier operand invalid");
                } else {
                    self.pos += 1;
                    self.stack.push(State::Group);
                    self.out.push('(');
                }
            }
            ')' => {
                if self.stack.last() != Some(&State::Group) {
                    return err("parentheses () not balanced");
                }
                self.stack.pop();
                self.pos += 1;
                self.out.push(')');
            }
            '[' => {
                self.pos += 1;
                self.out.push('[');
                if self.peek(0) == Some('^') {
                    self.pos += 1;
                    self.out.push('^');
                }
                self.stack.push(State::Bracket { fresh: true });
            }
            '\\' => {
                let translated = match self.peek(1) {
                    Some('y') => Some(r"\b"),
                    Some('Y') => Some(r"\B"),
                    Some('m') => Some(r"\b{start}"),
                    Some('M') => Some(r"\b{end}"),
                    Some('A') => Some(r"\A"),
                    Some('Z') => Some(r"\z"),
                    _ => None,
                };
                match translated {
                    Some(t) => {
                        self.pos += 2;
                        self.out.push_str(t);
                    }
                    None => {
                        let t = self.escape()?;
                        self.out.push_str(&t);
                    }
                }
            }
            '*' | '+' | '?' => {
                self.pos += 1;
                self.out.push(c);
                self.lazy_suffix();
            }
            '{' => {
                self.pos += 1;
                let min = self.take_while(usize::MAX, |d| d.is_ascii_digit());
                let mut bound = min.clone();
                if self.peek(0) == Some(',') {
                    self.pos += 1;
                    bound.push(',');
                    bound.push_str(&self.take_while(usize::MAX, |d| d.is_ascii_digit()));
                }
                if min.is_empty() || self.peek(0) != Some('}') {
                    return err("invalid repetition count(s)");
                }
                self.pos += 1;
                self.out.push('{');
                self.out.push_str(&bound);
                self.out.push('}');
                self.lazy_suffix();
            }
            ']' | '}' => {
                self.pos += 1;
                self.out.push('\\');
                self.out.push(c);
            }
            _ => {
                self.pos += 1;
                self.out.push(c);
            }
        }
        Ok(())
    }

    fn lazy_suffix(&mut self) {
        if self.peek(0) == Some('?') {
            self.pos += 1;
            self.out.push('?');
        }
    }

    /// One token inside a bracket expression.
    fn bracket_token(&mut self, fresh: bool) -> Result<(), PosixError> {
        let Some(c) = self.peek(0) else {
            return Ok(());
        };
        if let Some(State::Bracket { fresh }) = self.stack.last_mut() {
            *fresh = false;
        }
        match c {
            ']' if fresh => {
                self.pos += 1;
                self.out.push_str(r"\]");
            }
            ']' => {
                self.pos += 1;
                self.stack.pop();
                self.out.push(']');
            }
            '[' if self.peek(1) == Some(':') => {
                self.pos += 2;
                let Some(name) = self.take_until(":]") else {
                    return err("brackets [] not balanced");
                };
                let members = class_members(&name)
                    .ok_or_else(|| PosixError(format!("invalid character class \"{name}\"")))?;
                self.out.push_str(members);
            }
            '[' if self.peek(1) == Some('.') => {
                self.pos += 2;
                let Some(element) = self.take_until(".]") else {
                    return err("brackets [] not balanced");
                };
                let mut chars = element.chars();
                match (chars.next(), chars.next()) {
                    (Some(single), None) => self.out.push_str(&regex::escape(&single.to_string())),
                    _ => return err(format!("invalid collating element \"{element}\"")),
                }
            }
            '[' if self.peek(1) == Some('=') => {
                return err("equivalence classes are not supported");
            }
            '[' => return err("nested brackets are not supported"),
            '\\' => {
                let t = self.escape()?;
                self.out.push_str(&t);
            }
            '&' | '~' | '^' => {
                self.pos += 1;
                self.out.push('\\');
                self.out.push(c);
            }
            _ => {
                self.pos += 1;
                self.out.push(c);
            }
        }
        Ok(())
    }

    fn run(mut self) -> Result<String, PosixError> {
        while self.pos < self.chars.len() {
            match self.stack.last().copied() {
                Some(State::Bracket { fresh }) => self.bracket_token(fresh)?,
                _ => self.outer_token()?,
            }
        }
        match self.stack.last() {
            None => Ok(self.out),
            Some(State::Group) => err("parentheses () not balanced"),
            Some(State::Bracket { .. }) => err("brackets [] not balanced"),
        }
    }
}

/// Rewrites `pattern` into the `regex` crate's syntax, updating `flags`
/// from any director prefix (`***=`, `***`) or leading `(?options)` group.
pub fn translate(pattern: &str, flags: &mut PosixFlags) -> Result<String, Error> {
    let mut pattern = pattern;
    if let Some(rest) = pattern.strip_prefix("***=") {
        pattern = rest;
        flags.quoted = true;
    } else if let Some(rest) = pattern.strip_prefix("***") {
        pattern = rest;
        flags.syntax = Syntax::Advanced;
    }

    if !flags.quoted
        && let Some(body) = pattern.strip_prefix("(?")
        && let Some(end) = body.find(')')
        && end > 0
        && body[..end].chars().all(|c| c.is_ascii_alphabetic())
    {
        for option in body[..end].chars() {
            flags.apply(option)?;
        }
        pattern = &body[end + 1..];
    }

    if flags.quoted {
        return Ok(regex::escape(pattern));
    }
    if flags.expanded {
        return Err(Error::Unsupported(
            "\"x\" flag (expanded regular expressions) is not implemented".to_string(),
        ));
    }
    match flags.syntax {
        Syntax::Basic => {
            return Err(Error::Unsupported(
                "\"b\" flag (basic regular expressions) is not implemented".to_string(),
            ));
        }
        Syntax::Extended => {
            return Err(Error::Unsupported(
                "\"e\" flag (extended regular expressions) is not implemented".to_string(),
            ));
        }
        Syntax::Advanced => {}
    }

    let chars: Vec<char> = pattern.chars().collect();
    let translated = Translator {
        chars: &chars,
        pos: 0,
        stack: Vec::new(),
        out: String::new(),
    }
    .run()?;
    trace!("posix pattern {pattern:?} translated to {translated:?}");
    Ok(translated)
}

/// Translates and compiles a `like_regex` pattern.
///
/// # Examples
///
/// ```
/// use sqljson_path::{ast::LikeRegexFlags, posix};
///
/// let flags = LikeRegexFlags::parse("i").unwrap();
/// let re = posix::compile(r"^ab\y", &flags).unwrap();
/// assert!(re.is_match("AB cd"));
/// ```
pub fn compile(pattern: &str, flags: &LikeRegexFlags) -> Result<Regex, Error> {
    let mut posix_flags = PosixFlags::from_like_regex(flags)?;
    let translated = translate(pattern, &mut posix_flags)?;
    Ok(RegexBuilder::new(&translated)
        .case_insensitive(posix_flags.ignore_case)
        .dot_matches_new_line(posix_flags.dot_all)
        .multi_line(posix_flags.multiline)
        .build()?)
}
