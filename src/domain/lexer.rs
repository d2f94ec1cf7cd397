//! Lexer for the rule language.
//!
//! Input is split into physical lines and each line is scanned on its own,
//! so no token ever spans a line break. Everything from `#` to the end of a
//! line is a comment. Columns are 1-based character offsets.
//!
//! Keywords are not recognised here: `ENTRY`, `AND`, `CROSS`, indicator
//! names and the like all come out as [`TokenKind::Ident`] with their case
//! preserved.

use crate::domain::error::LexError;
use crate::domain::token::{Token, TokenKind};

struct LineLexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
}

impl LineLexer {
    fn new(source: &str, line: usize) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn column(&self) -> usize {
        self.pos + 1
    }

    fn error_at(&self, pos: usize) -> LexError {
        LexError {
            line: self.line,
            column: pos + 1,
            character: self.chars[pos],
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn number(&mut self) -> Token {
        let column = self.column();
        let mut text = self.take_while(|c| c.is_ascii_digit());
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
            text.push('.');
            text.push_str(&self.take_while(|c| c.is_ascii_digit()));
        }
        Token::new(TokenKind::Number, text, self.line, column)
    }

    fn string(&mut self) -> Result<Token, LexError> {
        let start = self.pos;
        self.pos += 1;
        let body = self.take_while(|c| c != '"');
        if self.peek() != Some('"') {
            return Err(self.error_at(start));
        }
        self.pos += 1;
        Ok(Token::new(TokenKind::String, body, self.line, start + 1))
    }

    fn ident(&mut self) -> Token {
        let column = self.column();
        let text = self.take_while(|c| c.is_ascii_alphanumeric() || c == '_');
        Token::new(TokenKind::Ident, text, self.line, column)
    }

    fn operator(&mut self) -> Result<Token, LexError> {
        let column = self.column();
        let first = self.chars[self.pos];
        let text = match (first, self.peek_at(1)) {
            ('>', Some('=')) => ">=",
            ('<', Some('=')) => "<=",
            ('=', Some('=')) => "==",
            ('>', _) => ">",
            ('<', _) => "<",
            _ => return Err(self.error_at(self.pos)),
        };
        self.pos += text.len();
        Ok(Token::new(TokenKind::Operator, text, self.line, column))
    }

    fn punct(&mut self, kind: TokenKind) -> Token {
        let column = self.column();
        let text = self.chars[self.pos].to_string();
        self.pos += 1;
        Token::new(kind, text, self.line, column)
    }

    fn run(mut self, out: &mut Vec<Token>) -> Result<(), LexError> {
        while let Some(ch) = self.peek() {
            let token = match ch {
                ' ' | '\t' => {
                    self.pos += 1;
                    continue;
                }
                '0'..='9' => self.number(),
                '"' => self.string()?,
                '>' | '<' | '=' => self.operator()?,
                ',' => self.punct(TokenKind::Comma),
                '(' => self.punct(TokenKind::LParen),
                ')' => self.punct(TokenKind::RParen),
                '[' => self.punct(TokenKind::LBracket),
                ']' => self.punct(TokenKind::RBracket),
                ':' => self.punct(TokenKind::Colon),
                c if c.is_ascii_alphabetic() || c == '_' => self.ident(),
                _ => return Err(self.error_at(self.pos)),
            };
            out.push(token);
        }
        Ok(())
    }
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(idx) => &line[..idx],
        None => line,
    }
}

/// Tokenize a whole DSL document into a flat token list in source order.
pub fn tokenize(text: &str) -> Result<Vec<Token>, LexError> {
    let mut tokens = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        LineLexer::new(strip_comment(line), idx + 1).run(&mut tokens)?;
    }
    log::debug!("lexed {} tokens", tokens.len());
    Ok(tokens)
}
