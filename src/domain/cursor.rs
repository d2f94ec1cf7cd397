//! Forward-only read cursor over a token list with one token of lookahead.
//!
//! The cursor can be confined to a single source line; tokens past that line
//! then look like the end of the stream.

use crate::domain::error::{Found, ParseError};
use crate::domain::token::{Token, TokenKind};

pub struct TokenCursor<'a> {
    tokens: &'a [Token],
    pos: usize,
    line: Option<usize>,
}

impl<'a> TokenCursor<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            pos: 0,
            line: None,
        }
    }

    /// Only expose tokens on `line`; `None` lifts the limit.
    pub fn limit_to_line(&mut self, line: Option<usize>) {
        self.line = line;
    }

    /// Current token, or `None` at end of stream (or of the current line).
    pub fn peek(&self) -> Option<&'a Token> {
        let line = self.line;
        self.tokens
            .get(self.pos)
            .filter(|tok| line.is_none_or(|l| tok.line == l))
    }

    pub fn next(&mut self) -> Option<&'a Token> {
        let tok = self.peek()?;
        self.pos += 1;
        Some(tok)
    }

    pub fn at_end(&self) -> bool {
        self.peek().is_none()
    }

    /// What is under the cursor, for error reporting.
    pub fn found(&self) -> Found {
        match (self.tokens.get(self.pos), self.line) {
            (None, _) => Found::EndOfInput,
            (Some(tok), Some(line)) if tok.line != line => Found::EndOfLine { line },
            (Some(tok), _) => tok.found(),
        }
    }

    /// Consume the current token if it has `kind` and, when given, text equal
    /// to `value` ignoring ASCII case. Otherwise the cursor does not move.
    pub fn match_token(&mut self, kind: TokenKind, value: Option<&str>) -> Option<&'a Token> {
        let tok = self.peek()?;
        if tok.kind != kind {
            return None;
        }
        if let Some(v) = value {
            if !tok.text.eq_ignore_ascii_case(v) {
                return None;
            }
        }
        self.next()
    }

    /// Like [`match_token`](Self::match_token) but a mismatch is an error.
    pub fn expect(&mut self, kind: TokenKind, value: Option<&str>) -> Result<&'a Token, ParseError> {
        match self.match_token(kind, value) {
            Some(tok) => Ok(tok),
            None => Err(ParseError::UnexpectedToken {
                expected: match value {
                    Some(v) => format!("'{}'", v),
                    None => kind.to_string(),
                },
                actual: self.found(),
            }),
        }
    }
}
