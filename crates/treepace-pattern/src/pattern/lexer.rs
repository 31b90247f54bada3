//! Tokenizer shared by pattern and template notation.

use std::fmt;
use std::iter::Peekable;
use std::str::CharIndices;

use crate::error::CompileError;

/// A token and the byte offset it starts at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token {
    pub(crate) kind: TokenKind,
    pub(crate) position: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TokenKind {
    Word(String),
    Quoted(String),
    Reference(String),
    Predicate(String),
    Dot,
    Slash,
    DoubleSlash,
    Comma,
    Amp,
    Pipe,
    LParen,
    RParen,
    Question,
    Star,
    Plus,
    Braces { min: u32, max: Option<u32> },
    Colon,
    Dollar,
    Up,
    Arrow,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Word(word) => write!(f, "'{word}'"),
            Self::Quoted(text) => write!(f, "{text:?}"),
            Self::Reference(name) => write!(f, "'${name}'"),
            Self::Predicate(name) => write!(f, "'[{name}]'"),
            Self::Braces { min, max: Some(max) } if min == max => write!(f, "'{{{min}}}'"),
            Self::Braces { min, max: Some(max) } => write!(f, "'{{{min},{max}}}'"),
            Self::Braces { min, max: None } => write!(f, "'{{{min},}}'"),
            other => write!(f, "'{}'", other.symbol()),
        }
    }
}

impl TokenKind {
    const fn symbol(&self) -> &'static str {
        match self {
            Self::Dot => ".",
            Self::Slash => "/",
            Self::DoubleSlash => "//",
            Self::Comma => ",",
            Self::Amp => "&",
            Self::Pipe => "|",
            Self::LParen => "(",
            Self::RParen => ")",
            Self::Question => "?",
            Self::Star => "*",
            Self::Plus => "+",
            Self::Colon => ":",
            Self::Dollar => "$",
            Self::Up => ">",
            Self::Arrow => "->",
            Self::Word(_)
            | Self::Quoted(_)
            | Self::Reference(_)
            | Self::Predicate(_)
            | Self::Braces { .. } => "",
        }
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-')
}

struct Lexer<'a> {
    chars: Peekable<CharIndices<'a>>,
    text: &'a str,
}

/// Splits `text` into tokens.
///
/// # Errors
///
/// Returns [`CompileError::Syntax`] for unknown characters, unterminated
/// quotes or predicate references, and malformed `{m,n}` quantifiers.
pub(crate) fn tokenize(text: &str) -> Result<Vec<Token>, CompileError> {
    let mut lexer = Lexer {
        chars: text.char_indices().peekable(),
        text,
    };
    let mut tokens = Vec::new();
    while let Some((position, ch)) = lexer.chars.next() {
        if ch.is_whitespace() {
            continue;
        }
        let kind = lexer.token(position, ch)?;
        tokens.push(Token { kind, position });
    }
    Ok(tokens)
}

impl Lexer<'_> {
    fn token(&mut self, position: usize, ch: char) -> Result<TokenKind, CompileError> {
        let kind = match ch {
            '.' => TokenKind::Dot,
            '/' if self.eat('/') => TokenKind::DoubleSlash,
            '/' => TokenKind::Slash,
            ',' => TokenKind::Comma,
            '&' => TokenKind::Amp,
            '|' => TokenKind::Pipe,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '?' => TokenKind::Question,
            '*' => TokenKind::Star,
            '+' => TokenKind::Plus,
            ':' => TokenKind::Colon,
            '-' if self.eat('>') => TokenKind::Arrow,
            '$' if self.chars.peek().is_some_and(|&(_, next)| is_word_char(next)) => {
                TokenKind::Reference(self.word(None))
            }
            '$' => TokenKind::Dollar,
            '>' => TokenKind::Up,
            '"' => TokenKind::Quoted(self.quoted(position)?),
            '[' => TokenKind::Predicate(self.predicate(position)?),
            '{' => self.braces(position)?,
            c if is_word_char(c) => TokenKind::Word(self.word(Some(c))),
            other => {
                return Err(CompileError::syntax(
                    position,
                    format!("unexpected character '{other}'"),
                ));
            }
        };
        Ok(kind)
    }

    fn eat(&mut self, expected: char) -> bool {
        self.chars.next_if(|&(_, c)| c == expected).is_some()
    }

    /// Reads a bare word, stopping before an arrow.
    fn word(&mut self, first: Option<char>) -> String {
        let mut word = first.map(String::from).unwrap_or_default();
        while let Some((offset, c)) = self.chars.peek().copied() {
            let arrow = self
                .text
                .get(offset..)
                .is_some_and(|rest| rest.starts_with("->"));
            if !is_word_char(c) || arrow {
                break;
            }
            word.push(c);
            self.chars.next();
        }
        word
    }

    fn quoted(&mut self, position: usize) -> Result<String, CompileError> {
        let mut value = String::new();
        while let Some((_, c)) = self.chars.next() {
            match c {
                '"' => return Ok(value),
                '\\' => {
                    if let Some((_, escaped)) = self.chars.next() {
                        value.push(escaped);
                    }
                }
                other => value.push(other),
            }
        }
        Err(CompileError::syntax(position, "unterminated quoted literal"))
    }

    fn predicate(&mut self, position: usize) -> Result<String, CompileError> {
        let mut name = String::new();
        for (_, c) in self.chars.by_ref() {
            if c == ']' {
                let trimmed = name.trim();
                if trimmed.is_empty() {
                    return Err(CompileError::syntax(position, "empty predicate reference"));
                }
                return Ok(trimmed.to_owned());
            }
            name.push(c);
        }
        Err(CompileError::syntax(position, "unterminated predicate reference"))
    }

    fn number(&mut self, position: usize) -> Result<Option<u32>, CompileError> {
        let mut digits = String::new();
        while let Some((_, c)) = self.chars.peek().copied() {
            if !c.is_ascii_digit() {
                break;
            }
            digits.push(c);
            self.chars.next();
        }
        if digits.is_empty() {
            return Ok(None);
        }
        digits
            .parse()
            .map(Some)
            .map_err(|_| CompileError::quantifier(position, format!("bound {digits} is too large")))
    }

    fn skip_spaces(&mut self) {
        while self.chars.next_if(|&(_, c)| c.is_whitespace()).is_some() {}
    }

    fn braces(&mut self, position: usize) -> Result<TokenKind, CompileError> {
        let malformed = || CompileError::syntax(position, "expected '{m}', '{m,}' or '{m,n}'");
        self.skip_spaces();
        let min = self.number(position)?.ok_or_else(malformed)?;
        self.skip_spaces();
        let max = if self.eat(',') {
            self.skip_spaces();
            let upper = self.number(position)?;
            self.skip_spaces();
            upper
        } else {
            Some(min)
        };
        if !self.eat('}') {
            return Err(malformed());
        }
        Ok(TokenKind::Braces { min, max })
    }
}
