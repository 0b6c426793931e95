//! Tokenizer for the schema DSL.
//!
//! A `Lexer` is a plain value built per call; its line counter never outlives
//! one `tokenize` run, so concurrent compiles share nothing.

use std::fmt;

use indexmap::IndexMap;
use once_cell::sync::Lazy;

use crate::ast::{Method, ScalarType};
use crate::error::LexError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Method(Method),
    /// Primitive type keyword; `string` carries no bound here.
    Type(ScalarType),
    Ellipsis,
    Colon,
    Comma,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Slash,
    Lt,
    Gt,
    Star,
    Integer(i64),
    Str(String),
    Ident(String),
    StaticRoute(String),
    StatusMatcher(String),
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Method(m) => write!(f, "{m}"),
            TokenKind::Type(t) => write!(f, "{t}"),
            TokenKind::Ellipsis => f.write_str("'...'"),
            TokenKind::Colon => f.write_str("':'"),
            TokenKind::Comma => f.write_str("','"),
            TokenKind::LParen => f.write_str("'('"),
            TokenKind::RParen => f.write_str("')'"),
            TokenKind::LBracket => f.write_str("'['"),
            TokenKind::RBracket => f.write_str("']'"),
            TokenKind::LBrace => f.write_str("'{'"),
            TokenKind::RBrace => f.write_str("'}'"),
            TokenKind::Slash => f.write_str("'/'"),
            TokenKind::Lt => f.write_str("'<'"),
            TokenKind::Gt => f.write_str("'>'"),
            TokenKind::Star => f.write_str("'*'"),
            TokenKind::Integer(n) => write!(f, "{n}"),
            TokenKind::Str(s) => write!(f, "{s:?}"),
            TokenKind::Ident(s) => f.write_str(s),
            TokenKind::StaticRoute(s) => write!(f, "'{s}'"),
            TokenKind::StatusMatcher(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
}

static KEYWORDS: Lazy<IndexMap<&'static str, TokenKind>> = Lazy::new(|| {
    let mut table: IndexMap<&'static str, TokenKind> = Method::ALL
        .into_iter()
        .map(|m| (m.as_str(), TokenKind::Method(m)))
        .collect();
    for ty in [
        ScalarType::Bool,
        ScalarType::U8,
        ScalarType::U16,
        ScalarType::U32,
        ScalarType::U64,
        ScalarType::I8,
        ScalarType::I16,
        ScalarType::I32,
        ScalarType::I64,
        ScalarType::Float,
    ] {
        table.insert(keyword_name(ty), TokenKind::Type(ty));
    }
    table.insert("string", TokenKind::Type(ScalarType::String { max_len: None }));
    table
});

fn keyword_name(ty: ScalarType) -> &'static str {
    match ty {
        ScalarType::Bool => "bool",
        ScalarType::U8 => "u8",
        ScalarType::U16 => "u16",
        ScalarType::U32 => "u32",
        ScalarType::U64 => "u64",
        ScalarType::I8 => "i8",
        ScalarType::I16 => "i16",
        ScalarType::I32 => "i32",
        ScalarType::I64 => "i64",
        ScalarType::Float => "float",
        ScalarType::String { .. } => "string",
    }
}

fn is_word(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

pub struct Lexer<'a> {
    src: &'a str,
    pos: usize,   // byte offset
    line: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self { src, pos: 0, line: 1 }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut out = Vec::new();
        while let Some(token) = self.next_token()? {
            out.push(token);
        }
        Ok(out)
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn prev(&self) -> Option<char> {
        self.src[..self.pos].chars().next_back()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.bump();
        }
        &self.src[start..self.pos]
    }

    fn next_token(&mut self) -> Result<Option<Token>, LexError> {
        loop {
            match self.peek() {
                None => return Ok(None),
                Some(' ' | '\t' | '\r') => {
                    self.bump();
                }
                Some('\n') => {
                    self.bump();
                    self.line += 1;
                }
                Some(_) => break,
            }
        }

        let line = self.line;
        let token = |kind: TokenKind| -> Result<Option<Token>, LexError> {
            Ok(Some(Token { kind, line }))
        };

        if self.rest().starts_with("...") {
            self.pos += 3;
            return token(TokenKind::Ellipsis);
        }

        let Some(c) = self.peek() else { return Ok(None) };

        // `/` after a word character separates methods or status codes;
        // anywhere else it opens a route segment.
        if c == '/' && !self.prev().is_some_and(is_word) {
            let seg = self.take_then(|c| !matches!(c, '<' | '{') && !c.is_whitespace());
            return token(TokenKind::StaticRoute(seg.to_string()));
        }

        let simple = match c {
            ':' => Some(TokenKind::Colon),
            ',' => Some(TokenKind::Comma),
            '(' => Some(TokenKind::LParen),
            ')' => Some(TokenKind::RParen),
            '[' => Some(TokenKind::LBracket),
            ']' => Some(TokenKind::RBracket),
            '{' => Some(TokenKind::LBrace),
            '}' => Some(TokenKind::RBrace),
            '/' => Some(TokenKind::Slash),
            '<' => Some(TokenKind::Lt),
            '>' => Some(TokenKind::Gt),
            '*' => Some(TokenKind::Star),
            _ => None,
        };
        if let Some(kind) = simple {
            self.bump();
            return token(kind);
        }

        if c == '"' {
            let s = self.string_literal()?;
            return token(TokenKind::Str(s));
        }

        if c.is_ascii_digit() || ((c == '+' || c == '-') && self.signed_digit_follows()) {
            return self.number(line).map(|kind| Some(Token { kind, line }));
        }

        if c.is_ascii_alphabetic() || c == '_' {
            let word = self.take_while(is_word);
            let kind = KEYWORDS
                .get(word)
                .cloned()
                .unwrap_or_else(|| TokenKind::Ident(word.to_string()));
            return token(kind);
        }

        Err(LexError::IllegalCharacter { ch: c, line })
    }

    /// Consume the current character, then everything matching `pred`.
    fn take_then(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        self.bump();
        while self.peek().is_some_and(&pred) {
            self.bump();
        }
        &self.src[start..self.pos]
    }

    fn signed_digit_follows(&self) -> bool {
        self.rest()[1..].starts_with(|c: char| c.is_ascii_digit())
    }

    fn number(&mut self, line: usize) -> Result<TokenKind, LexError> {
        let start = self.pos;
        let signed = matches!(self.peek(), Some('+' | '-'));
        if signed {
            self.bump();
        }
        self.take_while(|c| c.is_ascii_digit());
        if !signed && self.peek() == Some('X') {
            self.take_while(|c| c == 'X');
            return Ok(TokenKind::StatusMatcher(self.src[start..self.pos].to_string()));
        }
        let literal = &self.src[start..self.pos];
        literal
            .parse::<i64>()
            .map(TokenKind::Integer)
            .map_err(|_| LexError::IntegerOverflow { literal: literal.to_string(), line })
    }

    fn string_literal(&mut self) -> Result<String, LexError> {
        let line = self.line;
        self.bump(); // opening quote
        let mut out = String::new();
        loop {
            match self.bump() {
                None | Some('\n') => return Err(LexError::UnterminatedString { line }),
                Some('"') => return Ok(out),
                Some('\\') => {
                    let escaped = match self.bump() {
                        Some('t') => '\t',
                        Some('r') => '\r',
                        Some('n') => '\n',
                        Some('\\') => '\\',
                        Some('"') => '"',
                        Some(ch) => return Err(LexError::InvalidEscape { ch, line }),
                        None => return Err(LexError::UnterminatedString { line }),
                    };
                    out.push(escaped);
                }
                Some(c) => out.push(c),
            }
        }
    }
}

pub fn tokenize(src: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(src).tokenize()
}
