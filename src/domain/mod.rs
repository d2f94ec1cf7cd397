//! Core domain types and logic.

pub mod backtest;
pub mod config_validation;
pub mod cursor;
pub mod error;
pub mod indicator;
pub mod lexer;
pub mod ohlcv;
pub mod registry;
pub mod rule;
pub mod rule_eval;
pub mod rule_parser;
pub mod rule_struct;
pub mod token;
