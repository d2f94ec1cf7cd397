//! Vectorized strategy evaluation.
//!
//! Each AST node is evaluated once over the whole series, producing either a
//! numeric vector (`f64::NAN` = unknown) or a boolean vector.
//!
//! # Evaluation Semantics
//!
//! - Comparisons are element-wise; an unknown operand compares `false`
//! - `CROSS(l, "ABOVE", r)` at bar `i`: `l[i-1] < r[i-1]` and `l[i] >= r[i]`
//! - `CROSS(l, "BELOW", r)` at bar `i`: `l[i-1] > r[i-1]` and `l[i] <= r[i]`
//! - Cross is `false` at bar 0
//! - A numeric rule is true where the value is known and non-zero
//! - Rules in a block are OR-combined; a missing block never fires

use crate::domain::error::EvalError;
use crate::domain::indicator::IndicatorType;
use crate::domain::ohlcv::BarSeries;
use crate::domain::registry::{self, CompareOp, CrossDirection, LogicalOp};
use crate::domain::rule::{Block, Node, Strategy};
use std::collections::HashMap;

/// Entry and exit flags, one per bar.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Signals {
    pub entry: Vec<bool>,
    pub exit: Vec<bool>,
}

impl Signals {
    pub fn len(&self) -> usize {
        self.entry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entry.is_empty()
    }
}

enum Value {
    Numeric(Vec<f64>),
    Boolean(Vec<bool>),
}

impl Value {
    fn into_numeric(self) -> Vec<f64> {
        match self {
            Value::Numeric(v) => v,
            Value::Boolean(b) => b.into_iter().map(|x| if x { 1.0 } else { 0.0 }).collect(),
        }
    }

    fn into_boolean(self) -> Vec<bool> {
        match self {
            Value::Numeric(v) => v.into_iter().map(|x| !x.is_nan() && x != 0.0).collect(),
            Value::Boolean(b) => b,
        }
    }
}

struct Evaluator<'a> {
    series: &'a BarSeries,
    cache: HashMap<(IndicatorType, String), Vec<f64>>,
}

impl<'a> Evaluator<'a> {
    fn new(series: &'a BarSeries) -> Self {
        Self {
            series,
            cache: HashMap::new(),
        }
    }

    fn column(&self, name: &str) -> Result<&'a [f64], EvalError> {
        self.series
            .column(name)
            .ok_or_else(|| EvalError::UnknownColumn {
                name: name.to_string(),
            })
    }

    fn numeric(&mut self, node: &Node) -> Result<Vec<f64>, EvalError> {
        Ok(self.eval(node)?.into_numeric())
    }

    fn boolean(&mut self, node: &Node) -> Result<Vec<bool>, EvalError> {
        Ok(self.eval(node)?.into_boolean())
    }

    fn eval(&mut self, node: &Node) -> Result<Value, EvalError> {
        let n = self.series.len();
        let value = match node {
            Node::Identifier { name } => Value::Numeric(self.column(name)?.to_vec()),
            Node::NumberLiteral { value } => Value::Numeric(vec![*value; n]),
            Node::Lookback { name, offset } => {
                let col = self.column(name)?;
                let shifted = (0..n)
                    .map(|i| if i >= *offset { col[i - offset] } else { f64::NAN })
                    .collect();
                Value::Numeric(shifted)
            }
            Node::IndicatorCall { name, args } => Value::Numeric(self.indicator(name, args)?),
            Node::Compare { left, op, right } => {
                let l = self.numeric(left)?;
                let r = self.numeric(right)?;
                Value::Boolean(compare(&l, *op, &r))
            }
            Node::Logical { op, left, right } => {
                let r = self.boolean(right)?;
                match (op, left) {
                    (LogicalOp::Not, _) => Value::Boolean(r.into_iter().map(|x| !x).collect()),
                    (LogicalOp::And, Some(left)) => {
                        let l = self.boolean(left)?;
                        Value::Boolean(l.iter().zip(&r).map(|(a, b)| *a && *b).collect())
                    }
                    (LogicalOp::Or, Some(left)) => {
                        let l = self.boolean(left)?;
                        Value::Boolean(l.iter().zip(&r).map(|(a, b)| *a || *b).collect())
                    }
                    (LogicalOp::And | LogicalOp::Or, None) => Value::Boolean(r),
                }
            }
            Node::Cross {
                left,
                direction,
                right,
            } => {
                let l = self.numeric(left)?;
                let r = self.numeric(right)?;
                Value::Boolean(cross(&l, *direction, &r))
            }
        };
        Ok(value)
    }

    fn indicator(&mut self, name: &str, args: &[Node]) -> Result<Vec<f64>, EvalError> {
        let invalid = |reason: String| EvalError::InvalidArgument {
            indicator: name.to_string(),
            reason,
        };

        let spec = registry::validate(name, args.len()).map_err(|check| match check {
            registry::IndicatorCheck::Unknown { .. } => invalid("unknown indicator".to_string()),
            registry::IndicatorCheck::Arity {
                expected, actual, ..
            } => invalid(format!("expected {} arguments, got {}", expected, actual)),
        })?;

        let period = match &args[1] {
            Node::NumberLiteral { value }
                if value.is_finite() && *value >= 1.0 && value.fract() == 0.0 =>
            {
                *value as usize
            }
            other => {
                return Err(invalid(format!(
                    "period must be a positive integer, got {}",
                    other
                )));
            }
        };
        let indicator = IndicatorType::from_name(spec.name, period)
            .ok_or_else(|| invalid("no implementation".to_string()))?;

        let key = (indicator, args[0].to_string());
        if let Some(cached) = self.cache.get(&key) {
            return Ok(cached.clone());
        }
        let input = self.numeric(&args[0])?;
        let values = indicator.calculate(&input);
        self.cache.insert(key, values.clone());
        Ok(values)
    }

    fn block(&mut self, block: Option<&Block>) -> Result<Vec<bool>, EvalError> {
        let mut fired = vec![false; self.series.len()];
        for rule in block.map(|b| b.rules.as_slice()).unwrap_or_default() {
            for (acc, hit) in fired.iter_mut().zip(self.boolean(rule)?) {
                *acc |= hit;
            }
        }
        Ok(fired)
    }
}

fn compare(left: &[f64], op: CompareOp, right: &[f64]) -> Vec<bool> {
    left.iter()
        .zip(right)
        .map(|(l, r)| op.apply(*l, *r))
        .collect()
}

fn cross(left: &[f64], direction: CrossDirection, right: &[f64]) -> Vec<bool> {
    let mut out = vec![false; left.len()];
    for i in 1..left.len() {
        out[i] = match direction {
            CrossDirection::Above => left[i - 1] < right[i - 1] && left[i] >= right[i],
            CrossDirection::Below => left[i - 1] > right[i - 1] && left[i] <= right[i],
        };
    }
    out
}

/// Evaluate a single rule over the whole series.
pub fn evaluate_node(node: &Node, series: &BarSeries) -> Result<Vec<bool>, EvalError> {
    Evaluator::new(series).boolean(node)
}

/// Evaluate a node as a number per bar (`NaN` where unknown).
pub fn evaluate_values(node: &Node, series: &BarSeries) -> Result<Vec<f64>, EvalError> {
    Evaluator::new(series).numeric(node)
}

pub fn evaluate(strategy: &Strategy, series: &BarSeries) -> Result<Signals, EvalError> {
    let mut evaluator = Evaluator::new(series);
    let entry = evaluator.block(strategy.entry.as_ref())?;
    let exit = evaluator.block(strategy.exit.as_ref())?;
    log::debug!(
        "evaluated {} bars: {} entry signals, {} exit signals",
        series.len(),
        entry.iter().filter(|x| **x).count(),
        exit.iter().filter(|x| **x).count(),
    );
    Ok(Signals { entry, exit })
}
