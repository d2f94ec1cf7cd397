//! Technical indicators over `f64` series.
//!
//! Every indicator maps an input slice to an output of the same length.
//! Positions where the value is not yet (or not) defined hold `f64::NAN`.
//! `IndicatorType` names an indicator together with its period and doubles
//! as a cache key in the evaluator.

pub mod rsi;
pub mod sma;

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Rsi(usize),
}

impl IndicatorType {
    /// Build from a canonical registry name and a period.
    pub fn from_name(name: &str, period: usize) -> Option<Self> {
        match name {
            "SMA" => Some(IndicatorType::Sma(period)),
            "RSI" => Some(IndicatorType::Rsi(period)),
            _ => None,
        }
    }

    pub fn period(&self) -> usize {
        match self {
            IndicatorType::Sma(period) | IndicatorType::Rsi(period) => *period,
        }
    }

    pub fn calculate(&self, values: &[f64]) -> Vec<f64> {
        match self {
            IndicatorType::Sma(period) => sma::calculate_sma(values, *period),
            IndicatorType::Rsi(period) => rsi::calculate_rsi(values, *period),
        }
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
        }
    }
}
