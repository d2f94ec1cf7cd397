//! stratlang: a small rule language for trading strategies.
//!
//! Hexagonal architecture: the compiler, evaluator and simulator live in
//! [`domain`], port traits in [`ports`], concrete implementations in
//! [`adapters`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod ports;
