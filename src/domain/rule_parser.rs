//! Rule DSL parser.
//!
//! Recursive descent over the token stream produced by [`tokenize`]:
//!
//! ```text
//! strategy    ::= entry_block? exit_block?
//! entry_block ::= "ENTRY" ":" rule_list
//! exit_block  ::= "EXIT" ":" rule_list
//! rule_list   ::= expr+                      // one expr per line
//! expr        ::= term ( ("AND" | "OR") term )*
//! term        ::= "(" expr ")" | factor
//! factor      ::= cross_event | comparison | operand
//! comparison  ::= operand comparison_op operand
//! cross_event ::= "CROSS" "(" operand "," STRING "," operand ")"
//! operand     ::= NUMBER | IDENT lookback? | IDENT "(" arg_list ")"
//! lookback    ::= "[" NUMBER "]"
//! arg_list    ::= operand ("," operand)*
//! ```
//!
//! AND and OR share one precedence level and group left to right, so
//! `a OR b AND c` means `(a OR b) AND c`. There is no prefix `NOT`.
//!
//! A rule starts on a new line and ends with it. Each AND/OR join, each
//! parenthesis, CROSS and indicator call adds a nesting level, and the total
//! is capped by [`ParserOptions::max_depth`].

use crate::domain::cursor::TokenCursor;
use crate::domain::error::{CompileError, ParseError, Position};
use crate::domain::lexer::tokenize;
use crate::domain::registry::{self, CompareOp, CrossDirection, IndicatorCheck, LogicalOp};
use crate::domain::rule::{Block, Node, Strategy};
use crate::domain::token::{Token, TokenKind};

pub const DEFAULT_MAX_DEPTH: usize = 64;
/// Ceiling for any configured depth; keeps AST walks within a thread stack.
pub const MAX_DEPTH_LIMIT: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserOptions {
    /// Deepest allowed nesting of joins, parentheses, CROSS and indicator
    /// calls. Values above [`MAX_DEPTH_LIMIT`] are treated as the limit.
    pub max_depth: usize,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

struct Parser<'a> {
    cursor: TokenCursor<'a>,
    depth: usize,
    max_depth: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token], options: ParserOptions) -> Self {
        Self {
            cursor: TokenCursor::new(tokens),
            depth: 0,
            max_depth: options.max_depth.min(MAX_DEPTH_LIMIT),
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        ParseError::UnexpectedToken {
            expected: expected.to_string(),
            actual: self.cursor.found(),
        }
    }

    fn peek_keyword(&self, keyword: &str) -> bool {
        self.cursor.peek().is_some_and(|t| t.is_keyword(keyword))
    }

    fn at_block_start(&self) -> bool {
        self.peek_keyword("ENTRY") || self.peek_keyword("EXIT")
    }

    fn enter(&mut self, position: Position) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(ParseError::NestingTooDeep {
                limit: self.max_depth,
                position,
            });
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn parse_block(&mut self, keyword: &str) -> Result<Option<Block>, ParseError> {
        if self.cursor.match_token(TokenKind::Ident, Some(keyword)).is_none() {
            return Ok(None);
        }
        self.cursor.expect(TokenKind::Colon, None)?;
        let rules = self.parse_rule_list()?;
        Ok(Some(Block::new(rules)))
    }

    fn parse_rule_list(&mut self) -> Result<Vec<Node>, ParseError> {
        let mut rules = vec![self.parse_rule()?];
        while !self.cursor.at_end() && !self.at_block_start() {
            rules.push(self.parse_rule()?);
        }
        Ok(rules)
    }

    /// One expression confined to the line it starts on.
    fn parse_rule(&mut self) -> Result<Node, ParseError> {
        let line = self.cursor.peek().map(|tok| tok.line);
        self.cursor.limit_to_line(line);
        let result = match self.parse_expr() {
            Ok(_) if !self.cursor.at_end() => Err(self.unexpected("end of line")),
            other => other,
        };
        self.cursor.limit_to_line(None);
        result
    }

    fn parse_logical_keyword(&mut self) -> Option<(LogicalOp, &'a Token)> {
        [LogicalOp::And, LogicalOp::Or].into_iter().find_map(|op| {
            self.cursor
                .match_token(TokenKind::Ident, Some(op.keyword()))
                .map(|tok| (op, tok))
        })
    }

    fn parse_expr(&mut self) -> Result<Node, ParseError> {
        let mut left = self.parse_term()?;
        let mut joins = 0;
        while let Some((op, keyword)) = self.parse_logical_keyword() {
            // a left-leaning chain gets one level deeper per join
            self.enter(keyword.position())?;
            joins += 1;
            let right = self.parse_term()?;
            left = Node::Logical {
                op,
                left: Some(Box::new(left)),
                right: Box::new(right),
            };
        }
        self.depth -= joins;
        Ok(left)
    }

    fn parse_term(&mut self) -> Result<Node, ParseError> {
        if let Some(open) = self.cursor.match_token(TokenKind::LParen, None) {
            self.enter(open.position())?;
            let expr = self.parse_expr()?;
            self.cursor.expect(TokenKind::RParen, None)?;
            self.leave();
            return Ok(expr);
        }
        self.parse_factor()
    }

    fn parse_factor(&mut self) -> Result<Node, ParseError> {
        if self.peek_keyword("CROSS") {
            return self.parse_cross();
        }

        let left = self.parse_operand()?;
        let Some(op_token) = self.cursor.match_token(TokenKind::Operator, None) else {
            return Ok(left);
        };
        let op = CompareOp::from_symbol(&op_token.text).ok_or_else(|| {
            ParseError::UnexpectedToken {
                expected: "comparison operator".to_string(),
                actual: op_token.found(),
            }
        })?;
        let right = self.parse_operand()?;
        Ok(Node::compare(left, op, right))
    }

    fn parse_cross(&mut self) -> Result<Node, ParseError> {
        self.cursor.expect(TokenKind::Ident, Some("CROSS"))?;
        let open = self.cursor.expect(TokenKind::LParen, None)?;
        self.enter(open.position())?;

        let left = self.parse_operand()?;
        self.cursor.expect(TokenKind::Comma, None)?;

        let Some(dir_token) = self.cursor.match_token(TokenKind::String, None) else {
            return Err(self.unexpected("direction \"ABOVE\" or \"BELOW\""));
        };
        let direction = CrossDirection::parse(&dir_token.text).ok_or_else(|| {
            ParseError::InvalidCrossDirection {
                value: dir_token.text.clone(),
                position: dir_token.position(),
            }
        })?;

        self.cursor.expect(TokenKind::Comma, None)?;
        let right = self.parse_operand()?;
        self.cursor.expect(TokenKind::RParen, None)?;
        self.leave();

        Ok(Node::cross(left, direction, right))
    }

    fn parse_operand(&mut self) -> Result<Node, ParseError> {
        let Some(tok) = self.cursor.peek() else {
            return Err(self.unexpected("operand"));
        };
        match tok.kind {
            TokenKind::Number => {
                self.cursor.next();
                let value = tok.text.parse::<f64>().map_err(|_| ParseError::UnexpectedToken {
                    expected: "number".to_string(),
                    actual: tok.found(),
                })?;
                Ok(Node::number(value))
            }
            TokenKind::Ident if !registry::is_reserved(&tok.text) => {
                self.cursor.next();
                if self.cursor.match_token(TokenKind::LBracket, None).is_some() {
                    self.parse_lookback(tok)
                } else if let Some(open) = self.cursor.match_token(TokenKind::LParen, None) {
                    self.parse_call(tok, open)
                } else {
                    Ok(Node::ident(tok.text.clone()))
                }
            }
            _ => Err(self.unexpected("operand")),
        }
    }

    fn parse_lookback(&mut self, name: &Token) -> Result<Node, ParseError> {
        let offset = match self.cursor.peek() {
            Some(t) if t.kind == TokenKind::Number => t.text.parse::<usize>().ok(),
            _ => None,
        };
        let Some(offset) = offset else {
            return Err(self.unexpected("integer lookback offset"));
        };
        self.cursor.next();
        self.cursor.expect(TokenKind::RBracket, None)?;
        Ok(Node::lookback(name.text.clone(), offset))
    }

    fn parse_call(&mut self, name: &Token, open: &Token) -> Result<Node, ParseError> {
        if !registry::is_indicator(&name.text) {
            return Err(ParseError::UnknownIndicator {
                name: name.text.clone(),
                position: name.position(),
            });
        }
        self.enter(open.position())?;

        let mut args = vec![self.parse_operand()?];
        while self.cursor.match_token(TokenKind::Comma, None).is_some() {
            args.push(self.parse_operand()?);
        }
        self.cursor.expect(TokenKind::RParen, None)?;
        self.leave();

        let spec = registry::validate(&name.text, args.len()).map_err(|check| match check {
            IndicatorCheck::Unknown { name } => ParseError::UnknownIndicator {
                name,
                position: open.position(),
            },
            IndicatorCheck::Arity {
                indicator,
                expected,
                actual,
            } => ParseError::ArityMismatch {
                indicator: indicator.to_string(),
                expected,
                actual,
            },
        })?;
        Ok(Node::call(spec.name, args))
    }

    fn parse(&mut self) -> Result<Strategy, ParseError> {
        let entry = self.parse_block("ENTRY")?;
        let exit = self.parse_block("EXIT")?;
        if entry.is_none() && exit.is_none() {
            return Err(ParseError::EmptyStrategy);
        }
        if !self.cursor.at_end() {
            return Err(self.unexpected("end of input"));
        }
        log::debug!(
            "parsed strategy: {} entry rules, {} exit rules",
            entry.as_ref().map_or(0, |b| b.rules.len()),
            exit.as_ref().map_or(0, |b| b.rules.len()),
        );
        Ok(Strategy { entry, exit })
    }
}

/// Parse an already tokenized document.
pub fn parse_tokens(tokens: &[Token], options: ParserOptions) -> Result<Strategy, ParseError> {
    Parser::new(tokens, options).parse()
}

pub fn parse_with(input: &str, options: ParserOptions) -> Result<Strategy, CompileError> {
    let tokens = tokenize(input)?;
    Ok(parse_tokens(&tokens, options)?)
}

/// Compile DSL text to a [`Strategy`] with default options.
pub fn parse(input: &str) -> Result<Strategy, CompileError> {
    parse_with(input, ParserOptions::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::Found;

    fn parse_err(input: &str) -> ParseError {
        match parse(input).unwrap_err() {
            CompileError::Parse(e) => e,
            CompileError::Lex(e) => panic!("expected parse error, got lex error {e}"),
        }
    }

    fn entry_rules(input: &str) -> Vec<Node> {
        parse(input).unwrap().entry.unwrap().rules
    }

    fn gt(name: &str, value: f64) -> Node {
        Node::compare(Node::ident(name), CompareOp::Gt, Node::number(value))
    }

    #[test]
    fn parse_simple_comparison() {
        let strategy = parse("ENTRY:\nclose > 3").unwrap();
        assert_eq!(
            strategy,
            Strategy {
                entry: Some(Block::new(vec![gt("close", 3.0)])),
                exit: None,
            }
        );
    }

    #[test]
    fn parse_exit_only() {
        let strategy = parse("EXIT:\nclose < 2").unwrap();
        assert!(strategy.entry.is_none());
        assert_eq!(strategy.exit.unwrap().rules.len(), 1);
    }

    #[test]
    fn parse_both_blocks_multiple_rules() {
        let strategy = parse(
            "ENTRY:\n  close > SMA(close, 20)\n  volume > 1000000\n\nEXIT:\n  RSI(close, 14) < 30\n",
        )
        .unwrap();
        assert_eq!(strategy.entry.unwrap().rules.len(), 2);
        assert_eq!(strategy.exit.unwrap().rules.len(), 1);
    }

    #[test]
    fn keywords_are_case_insensitive() {
        let strategy = parse("entry:\nclose > 1 and volume > 2\nExit:\ncross(close, \"below\", sma(close, 3))")
            .unwrap();
        let exit = strategy.exit.unwrap();
        assert!(matches!(
            &exit.rules[0],
            Node::Cross {
                direction: CrossDirection::Below,
                ..
            }
        ));
    }

    #[test]
    fn parse_all_comparison_operators() {
        for op in CompareOp::ALL {
            let rules = entry_rules(&format!("ENTRY:\nclose {} open", op.symbol()));
            assert_eq!(
                rules[0],
                Node::compare(Node::ident("close"), op, Node::ident("open"))
            );
        }
    }

    #[test]
    fn parse_lookback() {
        let rules = entry_rules("ENTRY:\nhigh[1] > close");
        assert_eq!(
            rules[0],
            Node::compare(Node::lookback("high", 1), CompareOp::Gt, Node::ident("close"))
        );
    }

    #[test]
    fn indicator_names_are_canonicalized() {
        let rules = entry_rules("ENTRY:\nclose > sma(close, 20)");
        assert_eq!(
            rules[0],
            Node::compare(
                Node::ident("close"),
                CompareOp::Gt,
                Node::call("SMA", vec![Node::ident("close"), Node::number(20.0)])
            )
        );
    }

    #[test]
    fn nested_indicator_arguments() {
        let rules = entry_rules("ENTRY:\nRSI(SMA(close[1], 3), 14) > 50");
        match &rules[0] {
            Node::Compare { left, .. } => match left.as_ref() {
                Node::IndicatorCall { name, args } => {
                    assert_eq!(name, "RSI");
                    assert_eq!(
                        args[0],
                        Node::call("SMA", vec![Node::lookback("close", 1), Node::number(3.0)])
                    );
                }
                other => panic!("expected IndicatorCall, got {other:?}"),
            },
            other => panic!("expected Compare, got {other:?}"),
        }
    }

    #[test]
    fn parse_cross_above() {
        let rules = entry_rules("ENTRY:\nCROSS(close, \"ABOVE\", SMA(close, 10))");
        assert_eq!(
            rules[0],
            Node::cross(
                Node::ident("close"),
                CrossDirection::Above,
                Node::call("SMA", vec![Node::ident("close"), Node::number(10.0)])
            )
        );
    }

    #[test]
    fn and_or_group_left_to_right() {
        let rules = entry_rules("ENTRY:\na > 1 OR b > 1 AND c > 1");
        assert_eq!(
            rules[0],
            Node::and(Node::or(gt("a", 1.0), gt("b", 1.0)), gt("c", 1.0))
        );
    }

    #[test]
    fn parentheses_override_grouping() {
        let rules = entry_rules("ENTRY:\na > 1 OR (b > 1 AND c > 1)");
        assert_eq!(
            rules[0],
            Node::or(gt("a", 1.0), Node::and(gt("b", 1.0), gt("c", 1.0)))
        );
    }

    #[test]
    fn each_line_is_one_rule() {
        let rules = entry_rules("ENTRY:\na > 1 AND b > 1\nc > 1");
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0], Node::and(gt("a", 1.0), gt("b", 1.0)));
        assert_eq!(rules[1], gt("c", 1.0));
    }

    #[test]
    fn rule_may_share_the_header_line() {
        let rules = entry_rules("ENTRY: close > 3\nopen > 1");
        assert_eq!(rules, vec![gt("close", 3.0), gt("open", 1.0)]);
    }

    #[test]
    fn error_two_expressions_on_one_line() {
        let err = parse_err("ENTRY:\nclose > 3 close < 2");
        assert_eq!(
            err,
            ParseError::UnexpectedToken {
                expected: "end of line".into(),
                actual: Found::Token {
                    text: "close".into(),
                    position: Position { line: 2, column: 11 },
                },
            }
        );
    }

    #[test]
    fn error_join_on_following_line() {
        let err = parse_err("ENTRY:\nclose > 3\nAND close < 2");
        assert_eq!(
            err,
            ParseError::UnexpectedToken {
                expected: "operand".into(),
                actual: Found::Token {
                    text: "AND".into(),
                    position: Position { line: 3, column: 1 },
                },
            }
        );
    }

    #[test]
    fn error_join_dangling_at_line_end() {
        let err = parse_err("ENTRY:\na > 1 AND\nb > 1");
        assert_eq!(
            err,
            ParseError::UnexpectedToken {
                expected: "operand".into(),
                actual: Found::EndOfLine { line: 2 },
            }
        );
        assert!(!err.is_end_of_input());
    }

    #[test]
    fn error_parenthesis_spanning_lines() {
        let err = parse_err("ENTRY:\n(close > 3\n)");
        assert!(matches!(
            err,
            ParseError::UnexpectedToken { ref expected, actual: Found::EndOfLine { line: 2 } }
                if expected == "')'"
        ));
    }

    #[test]
    fn bare_operand_is_a_rule() {
        let rules = entry_rules("ENTRY:\nsignal_flag");
        assert_eq!(rules[0], Node::ident("signal_flag"));
    }

    #[test]
    fn comments_and_blank_lines_ignored() {
        let strategy = parse("# strategy\n\nENTRY:   # go long\n\n  close > 3 # threshold\n").unwrap();
        assert_eq!(strategy.entry.unwrap().rules, vec![gt("close", 3.0)]);
    }

    #[test]
    fn error_dangling_comparison() {
        let err = parse_err("ENTRY:\nclose >");
        assert!(err.is_end_of_input());
        assert!(matches!(err, ParseError::UnexpectedToken { ref expected, .. } if expected == "operand"));
    }

    #[test]
    fn error_invalid_cross_direction() {
        let err = parse_err("EXIT:\nCROSS(close, \"SIDEWAYS\", sma(close,20))");
        assert_eq!(
            err,
            ParseError::InvalidCrossDirection {
                value: "SIDEWAYS".into(),
                position: Position { line: 2, column: 14 },
            }
        );
    }

    #[test]
    fn error_padded_cross_direction() {
        let err = parse_err("ENTRY:\nCROSS(close, \"  above \", open)");
        assert_eq!(
            err,
            ParseError::InvalidCrossDirection {
                value: "  above ".into(),
                position: Position { line: 2, column: 14 },
            }
        );
    }

    #[test]
    fn error_cross_direction_must_be_string() {
        let err = parse_err("ENTRY:\nCROSS(close, ABOVE, open)");
        assert!(matches!(err, ParseError::UnexpectedToken { .. }));
        assert_eq!(err.position(), Some(Position { line: 2, column: 14 }));
    }

    #[test]
    fn error_unknown_indicator() {
        let err = parse_err("ENTRY:\nclose > EMA(close, 20)");
        assert_eq!(
            err,
            ParseError::UnknownIndicator {
                name: "EMA".into(),
                position: Position { line: 2, column: 9 },
            }
        );
    }

    #[test]
    fn error_arity_mismatch() {
        let err = parse_err("ENTRY:\nSMA(close) > 3");
        assert_eq!(
            err,
            ParseError::ArityMismatch {
                indicator: "SMA".into(),
                expected: 2,
                actual: 1,
            }
        );
        let err = parse_err("ENTRY:\nRSI(close, 14, 3) > 3");
        assert!(matches!(err, ParseError::ArityMismatch { actual: 3, .. }));
    }

    #[test]
    fn error_empty_argument_list() {
        let err = parse_err("ENTRY:\nSMA() > 3");
        assert!(matches!(
            err,
            ParseError::UnexpectedToken { ref expected, .. } if expected == "operand"
        ));
    }

    #[test]
    fn error_empty_strategy() {
        assert_eq!(parse_err(""), ParseError::EmptyStrategy);
        assert_eq!(parse_err("# only a comment\n"), ParseError::EmptyStrategy);
        assert_eq!(parse_err("close > 3"), ParseError::EmptyStrategy);
    }

    #[test]
    fn error_empty_block() {
        let err = parse_err("ENTRY:\nEXIT:\nclose > 3");
        assert_eq!(
            err,
            ParseError::UnexpectedToken {
                expected: "operand".into(),
                actual: Found::Token {
                    text: "EXIT".into(),
                    position: Position { line: 2, column: 1 },
                },
            }
        );
        assert!(parse_err("EXIT:").is_end_of_input());
    }

    #[test]
    fn error_missing_colon() {
        let err = parse_err("ENTRY\nclose > 3");
        assert!(matches!(
            err,
            ParseError::UnexpectedToken { ref expected, .. } if expected == "':'"
        ));
    }

    #[test]
    fn error_exit_before_entry() {
        let err = parse_err("EXIT:\nclose < 1\nENTRY:\nclose > 3");
        assert!(matches!(
            err,
            ParseError::UnexpectedToken { ref expected, .. } if expected == "end of input"
        ));
        assert_eq!(err.position(), Some(Position { line: 3, column: 1 }));
    }

    #[test]
    fn error_duplicate_block() {
        let err = parse_err("ENTRY:\nclose > 1\nENTRY:\nclose > 2");
        assert!(matches!(err, ParseError::UnexpectedToken { .. }));
    }

    #[test]
    fn error_not_is_not_an_operand() {
        let err = parse_err("ENTRY:\nNOT close > 3");
        assert_eq!(
            err,
            ParseError::UnexpectedToken {
                expected: "operand".into(),
                actual: Found::Token {
                    text: "NOT".into(),
                    position: Position { line: 2, column: 1 },
                },
            }
        );
    }

    #[test]
    fn error_string_operand() {
        let err = parse_err("ENTRY:\nclose > \"3\"");
        assert!(matches!(err, ParseError::UnexpectedToken { .. }));
        assert_eq!(err.position(), Some(Position { line: 2, column: 9 }));
    }

    #[test]
    fn error_fractional_lookback() {
        let err = parse_err("ENTRY:\nclose[1.5] > 3");
        assert!(matches!(
            err,
            ParseError::UnexpectedToken { ref expected, .. } if expected == "integer lookback offset"
        ));
    }

    #[test]
    fn error_unclosed_paren() {
        let err = parse_err("ENTRY:\n(close > 3");
        assert!(err.is_end_of_input());
    }

    #[test]
    fn lex_errors_surface_through_parse() {
        let err = parse("ENTRY:\nclose ! 3").unwrap_err();
        assert!(matches!(err, CompileError::Lex(_)));
    }

    #[test]
    fn nesting_limit_is_enforced() {
        let deep = format!("ENTRY:\n{}close > 3{}", "(".repeat(10), ")".repeat(10));
        assert!(parse_with(&deep, ParserOptions { max_depth: 10 }).is_ok());
        let err = parse_with(&deep, ParserOptions { max_depth: 9 }).unwrap_err();
        assert!(matches!(
            err,
            CompileError::Parse(ParseError::NestingTooDeep { limit: 9, .. })
        ));
    }

    #[test]
    fn nesting_limit_counts_indicator_arguments() {
        let deep = "ENTRY:\nSMA(SMA(SMA(close, 2), 2), 2) > 1";
        assert!(parse_with(deep, ParserOptions { max_depth: 3 }).is_ok());
        assert!(parse_with(deep, ParserOptions { max_depth: 2 }).is_err());
    }

    #[test]
    fn adversarial_nesting_does_not_overflow() {
        let deep = format!("ENTRY:\n{}close > 3", "(".repeat(100_000));
        let err = parse(&deep).unwrap_err();
        assert!(matches!(
            err,
            CompileError::Parse(ParseError::NestingTooDeep { limit: DEFAULT_MAX_DEPTH, .. })
        ));
    }

    fn or_chain(terms: usize) -> String {
        format!("ENTRY:\n{}", vec!["close > 1"; terms].join(" OR "))
    }

    #[test]
    fn join_chain_counts_toward_depth() {
        let options = ParserOptions { max_depth: 4 };
        assert!(parse_with(&or_chain(5), options).is_ok());
        let err = parse_with(&or_chain(6), options).unwrap_err();
        assert_eq!(
            err,
            CompileError::Parse(ParseError::NestingTooDeep {
                limit: 4,
                position: Position { line: 2, column: 63 },
            })
        );
    }

    #[test]
    fn joins_and_parentheses_share_the_budget() {
        let options = ParserOptions { max_depth: 3 };
        assert!(parse_with("ENTRY:\na > 1 OR (b > 1 AND c > 1)", options).is_ok());
        assert!(parse_with("ENTRY:\na > 1 OR (b > 1 AND (c > 1 OR d > 1))", options).is_err());
        // separate rules do not accumulate
        let rules = "ENTRY:\na > 1 OR b > 1 OR c > 1\na > 1 OR b > 1 OR c > 1";
        assert!(parse_with(rules, options).is_ok());
    }

    #[test]
    fn long_join_chain_is_rejected_not_overflowed() {
        let err = parse(&or_chain(10_000)).unwrap_err();
        assert!(matches!(
            err,
            CompileError::Parse(ParseError::NestingTooDeep { limit: DEFAULT_MAX_DEPTH, .. })
        ));
        let rules = entry_rules(&or_chain(DEFAULT_MAX_DEPTH + 1));
        assert_eq!(rules.len(), 1);
    }

    #[test]
    fn configured_depth_is_capped() {
        let options = ParserOptions { max_depth: usize::MAX };
        let err = parse_with(&or_chain(10_000), options).unwrap_err();
        assert!(matches!(
            err,
            CompileError::Parse(ParseError::NestingTooDeep { limit: MAX_DEPTH_LIMIT, .. })
        ));
    }

    #[test]
    fn display_round_trips() {
        let source = "entry:\nclose>sma(close,20) or volume > 5 and (high[2] < low OR close == 1.5)\nexit:\ncross(rsi(close,14),\"below\",30)";
        let strategy = parse(source).unwrap();
        let rendered = strategy.to_string();
        assert_eq!(parse(&rendered).unwrap(), strategy);
    }

    #[test]
    fn error_display_with_context() {
        let source = "ENTRY:\nclose > EMA(close, 5)";
        let err = parse(source).unwrap_err();
        let ctx = err.display_with_context(source);
        assert!(ctx.starts_with("close > EMA(close, 5)\n        ^\n"));
        assert!(ctx.contains("unknown indicator 'EMA'"));
    }
}
