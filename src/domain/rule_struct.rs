//! Structured rule sets (JSON) and their conversion to rule-language text or
//! directly to a [`Strategy`].
//!
//! ```json
//! {
//!   "entry": [
//!     {"type": "comparison",
//!      "left": {"kind": "identifier", "name": "close"},
//!      "op": ">",
//!      "right": {"kind": "indicator", "name": "sma", "args": ["close", 20]}}
//!   ],
//!   "exit": [
//!     {"type": "cross",
//!      "left": {"kind": "identifier", "name": "close"},
//!      "direction": "below",
//!      "right": {"kind": "indicator", "name": "SMA", "args": ["close", 10]}}
//!   ]
//! }
//! ```
//!
//! Unrecognised keys are ignored. For every rule set `s` that renders,
//! `parse(&to_dsl(&s)?) == to_strategy(&s)`.

use crate::domain::error::RenderError;
use crate::domain::registry::{self, CompareOp, CrossDirection, IndicatorCheck, IndicatorSpec};
use crate::domain::rule::{Block, Node, Strategy};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RuleSet {
    #[serde(default)]
    pub entry: Vec<RuleSpec>,
    #[serde(default)]
    pub exit: Vec<RuleSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RuleSpec {
    Comparison {
        left: OperandSpec,
        op: String,
        right: TermSpec,
    },
    Cross {
        left: OperandSpec,
        direction: String,
        right: TermSpec,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum OperandSpec {
    Identifier { name: String },
    Lookback { name: String, offset: usize },
    Indicator { name: String, args: Vec<ArgSpec> },
}

/// Right-hand side of a rule: a bare number or an operand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TermSpec {
    Number(f64),
    Operand(OperandSpec),
}

/// Indicator argument: a number, a bare field name, or a nested operand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgSpec {
    Number(f64),
    Field(String),
    Operand(OperandSpec),
}

impl RuleSet {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn is_empty(&self) -> bool {
        self.entry.is_empty() && self.exit.is_empty()
    }
}

fn check_name(name: &str) -> Result<&str, RenderError> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid_start || !valid_rest || registry::is_reserved(name) {
        return Err(RenderError::InvalidName {
            name: name.to_string(),
        });
    }
    Ok(name)
}

fn check_number(value: f64) -> Result<f64, RenderError> {
    if !value.is_finite() || value < 0.0 {
        return Err(RenderError::UnrepresentableNumber { value });
    }
    // -0.0 would render as "-0"
    Ok(value.abs())
}

fn check_op(op: &str) -> Result<CompareOp, RenderError> {
    CompareOp::from_symbol(op.trim()).ok_or_else(|| RenderError::UnknownOperator {
        op: op.to_string(),
    })
}

fn check_indicator(name: &str, arg_count: usize) -> Result<&'static IndicatorSpec, RenderError> {
    registry::validate(name, arg_count).map_err(|check| match check {
        IndicatorCheck::Unknown { name } => RenderError::UnknownIndicator { name },
        IndicatorCheck::Arity {
            indicator,
            expected,
            actual,
        } => RenderError::ArityMismatch {
            indicator: indicator.to_string(),
            expected,
            actual,
        },
    })
}

fn check_direction(direction: &str) -> Result<CrossDirection, RenderError> {
    CrossDirection::parse(direction).ok_or_else(|| RenderError::InvalidDirection {
        value: direction.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Struct -> DSL text
// ---------------------------------------------------------------------------

fn operand_to_dsl(operand: &OperandSpec) -> Result<String, RenderError> {
    Ok(match operand {
        OperandSpec::Identifier { name } => check_name(name)?.to_string(),
        OperandSpec::Lookback { name, offset } => format!("{}[{}]", check_name(name)?, offset),
        OperandSpec::Indicator { name, args } => {
            let spec = check_indicator(name, args.len())?;
            let rendered = args
                .iter()
                .map(|arg| match arg {
                    ArgSpec::Number(v) => Ok(check_number(*v)?.to_string()),
                    ArgSpec::Field(field) => Ok(check_name(field)?.to_string()),
                    ArgSpec::Operand(op) => operand_to_dsl(op),
                })
                .collect::<Result<Vec<_>, _>>()?;
            format!("{}({})", spec.name, rendered.join(", "))
        }
    })
}

fn term_to_dsl(term: &TermSpec) -> Result<String, RenderError> {
    match term {
        TermSpec::Number(v) => Ok(check_number(*v)?.to_string()),
        TermSpec::Operand(op) => operand_to_dsl(op),
    }
}

fn rule_to_dsl(rule: &RuleSpec) -> Result<String, RenderError> {
    match rule {
        RuleSpec::Comparison { left, op, right } => Ok(format!(
            "{} {} {}",
            operand_to_dsl(left)?,
            check_op(op)?,
            term_to_dsl(right)?
        )),
        RuleSpec::Cross {
            left,
            direction,
            right,
        } => Ok(format!(
            "CROSS({}, \"{}\", {})",
            operand_to_dsl(left)?,
            check_direction(direction)?,
            term_to_dsl(right)?
        )),
    }
}

/// Render a rule set as rule-language text: an `ENTRY:` block, a blank line,
/// then an `EXIT:` block. Empty blocks are left out.
pub fn to_dsl(rules: &RuleSet) -> Result<String, RenderError> {
    if rules.is_empty() {
        return Err(RenderError::Empty);
    }
    let mut lines: Vec<String> = Vec::new();
    for (keyword, block) in [("ENTRY", &rules.entry), ("EXIT", &rules.exit)] {
        if block.is_empty() {
            continue;
        }
        lines.push(format!("{}:", keyword));
        for rule in block {
            lines.push(rule_to_dsl(rule)?);
        }
        lines.push(String::new());
    }
    let text = lines.join("\n");
    log::debug!("rendered {} rules to DSL", rules.entry.len() + rules.exit.len());
    Ok(text.trim_end().to_string())
}

// ---------------------------------------------------------------------------
// Struct -> AST
// ---------------------------------------------------------------------------

fn operand_to_node(operand: &OperandSpec) -> Result<Node, RenderError> {
    match operand {
        OperandSpec::Identifier { name } => Ok(Node::ident(check_name(name)?)),
        OperandSpec::Lookback { name, offset } => Ok(Node::lookback(check_name(name)?, *offset)),
        OperandSpec::Indicator { name, args } => {
            let spec = check_indicator(name, args.len())?;
            let args = args
                .iter()
                .map(|arg| match arg {
                    ArgSpec::Number(v) => Ok(Node::number(check_number(*v)?)),
                    ArgSpec::Field(field) => Ok(Node::ident(check_name(field)?)),
                    ArgSpec::Operand(op) => operand_to_node(op),
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Node::call(spec.name, args))
        }
    }
}

fn term_to_node(term: &TermSpec) -> Result<Node, RenderError> {
    match term {
        TermSpec::Number(v) => Ok(Node::number(check_number(*v)?)),
        TermSpec::Operand(op) => operand_to_node(op),
    }
}

fn rule_to_node(rule: &RuleSpec) -> Result<Node, RenderError> {
    match rule {
        RuleSpec::Comparison { left, op, right } => Ok(Node::compare(
            operand_to_node(left)?,
            check_op(op)?,
            term_to_node(right)?,
        )),
        RuleSpec::Cross {
            left,
            direction,
            right,
        } => Ok(Node::cross(
            operand_to_node(left)?,
            check_direction(direction)?,
            term_to_node(right)?,
        )),
    }
}

fn block_to_ast(rules: &[RuleSpec]) -> Result<Option<Block>, RenderError> {
    if rules.is_empty() {
        return Ok(None);
    }
    let nodes = rules.iter().map(rule_to_node).collect::<Result<Vec<_>, _>>()?;
    Ok(Some(Block::new(nodes)))
}

/// Build the AST a rule set describes without going through text.
pub fn to_strategy(rules: &RuleSet) -> Result<Strategy, RenderError> {
    if rules.is_empty() {
        return Err(RenderError::Empty);
    }
    Ok(Strategy {
        entry: block_to_ast(&rules.entry)?,
        exit: block_to_ast(&rules.exit)?,
    })
}
