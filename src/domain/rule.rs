//! Rule AST.
//!
//! - `Node`: a closed set of expression shapes (operands, comparisons,
//!   logical combinations, crossovers)
//! - `Block`: the ordered rules of an `ENTRY:` or `EXIT:` section, OR-combined
//! - `Strategy`: the root, holding an optional entry and an optional exit block
//!
//! Every type renders back to rule-language text through `Display`. For any
//! tree the parser produces, parsing the rendering gives back an equal tree.

use crate::domain::registry::{CompareOp, CrossDirection, LogicalOp};
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Identifier {
        name: String,
    },
    NumberLiteral {
        value: f64,
    },
    Lookback {
        name: String,
        offset: usize,
    },
    IndicatorCall {
        name: String,
        args: Vec<Node>,
    },
    Compare {
        left: Box<Node>,
        op: CompareOp,
        right: Box<Node>,
    },
    /// `left` is `None` only for `NOT`.
    Logical {
        op: LogicalOp,
        left: Option<Box<Node>>,
        right: Box<Node>,
    },
    Cross {
        left: Box<Node>,
        direction: CrossDirection,
        right: Box<Node>,
    },
}

impl Node {
    pub fn ident(name: impl Into<String>) -> Self {
        Node::Identifier { name: name.into() }
    }

    pub fn number(value: f64) -> Self {
        Node::NumberLiteral { value }
    }

    pub fn lookback(name: impl Into<String>, offset: usize) -> Self {
        Node::Lookback {
            name: name.into(),
            offset,
        }
    }

    pub fn call(name: impl Into<String>, args: Vec<Node>) -> Self {
        Node::IndicatorCall {
            name: name.into(),
            args,
        }
    }

    pub fn compare(left: Node, op: CompareOp, right: Node) -> Self {
        Node::Compare {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    pub fn and(left: Node, right: Node) -> Self {
        Node::Logical {
            op: LogicalOp::And,
            left: Some(Box::new(left)),
            right: Box::new(right),
        }
    }

    pub fn or(left: Node, right: Node) -> Self {
        Node::Logical {
            op: LogicalOp::Or,
            left: Some(Box::new(left)),
            right: Box::new(right),
        }
    }

    pub fn not(operand: Node) -> Self {
        Node::Logical {
            op: LogicalOp::Not,
            left: None,
            right: Box::new(operand),
        }
    }

    pub fn cross(left: Node, direction: CrossDirection, right: Node) -> Self {
        Node::Cross {
            left: Box::new(left),
            direction,
            right: Box::new(right),
        }
    }

    fn collect(&self, columns: &mut BTreeSet<String>, indicators: &mut BTreeSet<String>) {
        match self {
            Node::Identifier { name } | Node::Lookback { name, .. } => {
                columns.insert(name.to_ascii_lowercase());
            }
            Node::NumberLiteral { .. } => {}
            Node::IndicatorCall { name, args } => {
                indicators.insert(name.clone());
                for arg in args {
                    arg.collect(columns, indicators);
                }
            }
            Node::Compare { left, right, .. } | Node::Cross { left, right, .. } => {
                left.collect(columns, indicators);
                right.collect(columns, indicators);
            }
            Node::Logical { left, right, .. } => {
                if let Some(left) = left {
                    left.collect(columns, indicators);
                }
                right.collect(columns, indicators);
            }
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Identifier { name } => write!(f, "{}", name),
            Node::NumberLiteral { value } => write!(f, "{}", value),
            Node::Lookback { name, offset } => write!(f, "{}[{}]", name, offset),
            Node::IndicatorCall { name, args } => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            Node::Compare { left, op, right } => write!(f, "{} {} {}", left, op, right),
            Node::Logical {
                op,
                left: Some(left),
                right,
            } => {
                // Combination is left-associative, so only a compound right
                // operand needs grouping.
                if matches!(**right, Node::Logical { .. }) {
                    write!(f, "{} {} ({})", left, op, right)
                } else {
                    write!(f, "{} {} {}", left, op, right)
                }
            }
            Node::Logical {
                op,
                left: None,
                right,
            } => write!(f, "{} ({})", op, right),
            Node::Cross {
                left,
                direction,
                right,
            } => write!(f, "CROSS({}, \"{}\", {})", left, direction, right),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub rules: Vec<Node>,
}

impl Block {
    pub fn new(rules: Vec<Node>) -> Self {
        Self { rules }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Strategy {
    pub entry: Option<Block>,
    pub exit: Option<Block>,
}

impl Strategy {
    /// Lowercased names of every column the strategy reads.
    pub fn referenced_columns(&self) -> BTreeSet<String> {
        let (columns, _) = self.references();
        columns
    }

    /// Canonical names of every indicator the strategy calls.
    pub fn indicator_names(&self) -> BTreeSet<String> {
        let (_, indicators) = self.references();
        indicators
    }

    fn references(&self) -> (BTreeSet<String>, BTreeSet<String>) {
        let mut columns = BTreeSet::new();
        let mut indicators = BTreeSet::new();
        for block in [&self.entry, &self.exit].into_iter().flatten() {
            for rule in &block.rules {
                rule.collect(&mut columns, &mut indicators);
            }
        }
        (columns, indicators)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (keyword, block) in [("ENTRY", &self.entry), ("EXIT", &self.exit)] {
            let Some(block) = block else { continue };
            if !first {
                writeln!(f)?;
            }
            first = false;
            writeln!(f, "{}:", keyword)?;
            for rule in &block.rules {
                writeln!(f, "{}", rule)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sma(period: f64) -> Node {
        Node::call("SMA", vec![Node::ident("close"), Node::number(period)])
    }

    #[test]
    fn structural_equality() {
        let a = Node::compare(Node::ident("close"), CompareOp::Gt, Node::number(3.0));
        let b = Node::compare(Node::ident("close"), CompareOp::Gt, Node::number(3.0));
        let c = Node::compare(Node::ident("close"), CompareOp::Ge, Node::number(3.0));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn not_has_no_left_operand() {
        match Node::not(Node::ident("x")) {
            Node::Logical { op, left, .. } => {
                assert_eq!(op, LogicalOp::Not);
                assert!(left.is_none());
            }
            other => panic!("expected Logical, got {other:?}"),
        }
    }

    #[test]
    fn display_operands() {
        assert_eq!(Node::ident("close").to_string(), "close");
        assert_eq!(Node::number(3.0).to_string(), "3");
        assert_eq!(Node::number(2.5).to_string(), "2.5");
        assert_eq!(Node::lookback("high", 1).to_string(), "high[1]");
        assert_eq!(sma(20.0).to_string(), "SMA(close, 20)");
    }

    #[test]
    fn display_cross() {
        let node = Node::cross(Node::ident("close"), CrossDirection::Below, sma(10.0));
        assert_eq!(node.to_string(), "CROSS(close, \"BELOW\", SMA(close, 10))");
    }

    #[test]
    fn display_groups_right_nested_logic() {
        let a = Node::compare(Node::ident("a"), CompareOp::Gt, Node::number(1.0));
        let b = Node::compare(Node::ident("b"), CompareOp::Gt, Node::number(1.0));
        let c = Node::compare(Node::ident("c"), CompareOp::Gt, Node::number(1.0));

        let left_nested = Node::and(Node::or(a.clone(), b.clone()), c.clone());
        assert_eq!(left_nested.to_string(), "a > 1 OR b > 1 AND c > 1");

        let right_nested = Node::or(a, Node::and(b, c));
        assert_eq!(right_nested.to_string(), "a > 1 OR (b > 1 AND c > 1)");
    }

    #[test]
    fn display_strategy_blocks() {
        let strategy = Strategy {
            entry: Some(Block::new(vec![Node::compare(
                Node::ident("close"),
                CompareOp::Gt,
                sma(20.0),
            )])),
            exit: Some(Block::new(vec![Node::compare(
                Node::call("RSI", vec![Node::ident("close"), Node::number(14.0)]),
                CompareOp::Lt,
                Node::number(30.0),
            )])),
        };
        assert_eq!(
            strategy.to_string(),
            "ENTRY:\nclose > SMA(close, 20)\n\nEXIT:\nRSI(close, 14) < 30\n"
        );
    }

    #[test]
    fn references_cover_nested_arguments() {
        let strategy = Strategy {
            entry: Some(Block::new(vec![Node::cross(
                Node::call("SMA", vec![Node::lookback("High", 1), Node::number(5.0)]),
                CrossDirection::Above,
                Node::ident("close"),
            )])),
            exit: None,
        };
        let columns: Vec<String> = strategy.referenced_columns().into_iter().collect();
        assert_eq!(columns, vec!["close", "high"]);
        let indicators: Vec<String> = strategy.indicator_names().into_iter().collect();
        assert_eq!(indicators, vec!["SMA"]);
    }
}
