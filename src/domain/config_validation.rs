//! Configuration validation.
//!
//! Checks every config field before anything is compiled or loaded and
//! resolves the run settings.

use crate::domain::error::StratError;
use crate::domain::rule_parser::{DEFAULT_MAX_DEPTH, MAX_DEPTH_LIMIT, ParserOptions};
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;
use std::path::PathBuf;

/// Validated settings for a single run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    pub strategy_name: Option<String>,
    pub strategy_path: PathBuf,
    /// `None` selects the built-in demo series.
    pub data_path: Option<PathBuf>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub parser: ParserOptions,
}

const KNOWN_SECTIONS: [&str; 3] = ["strategy", "data", "parser"];

/// Sections the run settings never read, usually a typo.
pub fn unknown_sections(config: &dyn ConfigPort) -> Vec<String> {
    config
        .sections()
        .into_iter()
        .filter(|s| s != "default" && !KNOWN_SECTIONS.contains(&s.as_str()))
        .collect()
}

pub fn load_settings(config: &dyn ConfigPort) -> Result<RunSettings, StratError> {
    for section in unknown_sections(config) {
        log::warn!("ignoring unknown config section [{}]", section);
    }
    let strategy_path = validate_strategy_path(config)?;
    let (start_date, end_date) = validate_dates(config)?;
    let max_depth = validate_max_depth(config)?;

    Ok(RunSettings {
        strategy_name: non_empty(config.get_string("strategy", "name")),
        strategy_path,
        data_path: non_empty(config.get_string("data", "path")).map(PathBuf::from),
        start_date,
        end_date,
        parser: ParserOptions { max_depth },
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn validate_strategy_path(config: &dyn ConfigPort) -> Result<PathBuf, StratError> {
    non_empty(config.get_string("strategy", "path"))
        .map(PathBuf::from)
        .ok_or_else(|| StratError::ConfigMissing {
            section: "strategy".to_string(),
            key: "path".to_string(),
        })
}

fn validate_dates(
    config: &dyn ConfigPort,
) -> Result<(Option<NaiveDate>, Option<NaiveDate>), StratError> {
    let start = parse_date(config, "start_date")?;
    let end = parse_date(config, "end_date")?;

    if let (Some(s), Some(e)) = (start, end) {
        if s > e {
            return Err(StratError::ConfigInvalid {
                section: "data".to_string(),
                key: "start_date".to_string(),
                reason: "start_date must not be after end_date".to_string(),
            });
        }
    }
    Ok((start, end))
}

fn parse_date(config: &dyn ConfigPort, field: &str) -> Result<Option<NaiveDate>, StratError> {
    let Some(value) = non_empty(config.get_string("data", field)) else {
        return Ok(None);
    };
    NaiveDate::parse_from_str(&value, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| StratError::ConfigInvalid {
            section: "data".to_string(),
            key: field.to_string(),
            reason: format!("invalid {} format, expected YYYY-MM-DD", field),
        })
}

fn validate_max_depth(config: &dyn ConfigPort) -> Result<usize, StratError> {
    let Some(value) = non_empty(config.get_string("parser", "max_depth")) else {
        return Ok(DEFAULT_MAX_DEPTH);
    };
    match value.parse::<usize>() {
        Ok(depth) if (1..=MAX_DEPTH_LIMIT).contains(&depth) => Ok(depth),
        _ => Err(StratError::ConfigInvalid {
            section: "parser".to_string(),
            key: "max_depth".to_string(),
            reason: format!("max_depth must be an integer from 1 to {}", MAX_DEPTH_LIMIT),
        }),
    }
}
