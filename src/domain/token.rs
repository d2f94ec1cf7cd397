//! Lexical tokens of the rule language.

use crate::domain::error::{Found, Position};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Number,
    String,
    Operator,
    Comma,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Colon,
    Ident,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Number => "number",
            TokenKind::String => "string",
            TokenKind::Operator => "comparison operator",
            TokenKind::Comma => "','",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::Colon => "':'",
            TokenKind::Ident => "identifier",
        };
        f.write_str(name)
    }
}

/// A single token. For `String` tokens `text` holds the contents without the
/// surrounding quotes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            line,
            column,
        }
    }

    pub fn position(&self) -> Position {
        Position {
            line: self.line,
            column: self.column,
        }
    }

    /// The token as it was written in the source.
    pub fn lexeme(&self) -> String {
        match self.kind {
            TokenKind::String => format!("\"{}\"", self.text),
            _ => self.text.clone(),
        }
    }

    /// Case-insensitive keyword test; only identifiers can be keywords.
    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.kind == TokenKind::Ident && self.text.eq_ignore_ascii_case(keyword)
    }

    pub fn found(&self) -> Found {
        Found::Token {
            text: self.lexeme(),
            position: self.position(),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} {:?} {}",
            self.line,
            self.column,
            self.kind,
            self.lexeme()
        )
    }
}
