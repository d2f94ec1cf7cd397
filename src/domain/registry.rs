//! Indicator and operator registries.
//!
//! Both are fixed tables compiled into the binary. The parser consults the
//! indicator table to reject unknown names and wrong argument counts before
//! an `IndicatorCall` node is built; the evaluator dispatches on the same
//! canonical names.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Series,
    Integer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Param {
    pub name: &'static str,
    pub kind: ParamKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorSpec {
    pub name: &'static str,
    pub params: &'static [Param],
}

impl IndicatorSpec {
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

const SERIES_PERIOD: &[Param] = &[
    Param {
        name: "series",
        kind: ParamKind::Series,
    },
    Param {
        name: "period",
        kind: ParamKind::Integer,
    },
];

pub static INDICATORS: &[IndicatorSpec] = &[
    IndicatorSpec {
        name: "SMA",
        params: SERIES_PERIOD,
    },
    IndicatorSpec {
        name: "RSI",
        params: SERIES_PERIOD,
    },
];

/// Why an indicator call failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndicatorCheck {
    Unknown { name: String },
    Arity {
        indicator: &'static str,
        expected: usize,
        actual: usize,
    },
}

pub fn canonicalize(name: &str) -> String {
    name.trim().to_ascii_uppercase()
}

pub fn lookup(name: &str) -> Option<&'static IndicatorSpec> {
    let canonical = canonicalize(name);
    INDICATORS.iter().find(|spec| spec.name == canonical)
}

pub fn is_indicator(name: &str) -> bool {
    lookup(name).is_some()
}

/// Check an indicator call with `arg_count` positional arguments.
pub fn validate(name: &str, arg_count: usize) -> Result<&'static IndicatorSpec, IndicatorCheck> {
    let spec = lookup(name).ok_or_else(|| IndicatorCheck::Unknown {
        name: name.to_string(),
    })?;
    if spec.arity() != arg_count {
        return Err(IndicatorCheck::Arity {
            indicator: spec.name,
            expected: spec.arity(),
            actual: arg_count,
        });
    }
    Ok(spec)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Gt,
    Lt,
    Ge,
    Le,
    Eq,
}

impl CompareOp {
    pub const ALL: [CompareOp; 5] = [
        CompareOp::Gt,
        CompareOp::Lt,
        CompareOp::Ge,
        CompareOp::Le,
        CompareOp::Eq,
    ];

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.symbol() == symbol)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Gt => ">",
            CompareOp::Lt => "<",
            CompareOp::Ge => ">=",
            CompareOp::Le => "<=",
            CompareOp::Eq => "==",
        }
    }

    /// Unknown (NaN) on either side compares false for every operator.
    pub fn apply(self, left: f64, right: f64) -> bool {
        match self {
            CompareOp::Gt => left > right,
            CompareOp::Lt => left < right,
            CompareOp::Ge => left >= right,
            CompareOp::Le => left <= right,
            CompareOp::Eq => left == right,
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOp {
    And,
    Or,
    Not,
}

impl LogicalOp {
    pub const ALL: [LogicalOp; 3] = [LogicalOp::And, LogicalOp::Or, LogicalOp::Not];

    pub fn from_keyword(word: &str) -> Option<Self> {
        let canonical = canonicalize(word);
        Self::ALL.into_iter().find(|op| op.keyword() == canonical)
    }

    pub fn keyword(self) -> &'static str {
        match self {
            LogicalOp::And => "AND",
            LogicalOp::Or => "OR",
            LogicalOp::Not => "NOT",
        }
    }

    /// Conventional binding strength. The parser combines AND and OR
    /// strictly left to right and does not consult this.
    pub fn precedence(self) -> u8 {
        match self {
            LogicalOp::Not => 3,
            LogicalOp::And => 2,
            LogicalOp::Or => 1,
        }
    }
}

impl fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrossDirection {
    Above,
    Below,
}

impl CrossDirection {
    /// Case-insensitive; surrounding whitespace is not accepted.
    pub fn parse(value: &str) -> Option<Self> {
        [CrossDirection::Above, CrossDirection::Below]
            .into_iter()
            .find(|d| d.keyword().eq_ignore_ascii_case(value))
    }

    pub fn keyword(self) -> &'static str {
        match self {
            CrossDirection::Above => "ABOVE",
            CrossDirection::Below => "BELOW",
        }
    }
}

impl fmt::Display for CrossDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Words that are never identifiers.
pub const RESERVED: &[&str] = &["ENTRY", "EXIT", "AND", "OR", "NOT", "CROSS"];

pub fn is_reserved(word: &str) -> bool {
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(word))
}
