#![allow(dead_code)]

use chrono::NaiveDate;
use std::io::Write;
use stratlang::domain::error::StratError;
pub use stratlang::domain::ohlcv::BarSeries;
use stratlang::ports::data_port::DataPort;

/// Serves a fixed series, or a fixed load failure.
pub struct MockDataPort {
    pub series: Option<BarSeries>,
    pub error: Option<String>,
}

impl MockDataPort {
    pub fn new(series: BarSeries) -> Self {
        Self {
            series: Some(series),
            error: None,
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            series: None,
            error: Some(reason.to_string()),
        }
    }
}

impl DataPort for MockDataPort {
    fn fetch_series(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<BarSeries, StratError> {
        if let Some(reason) = &self.error {
            return Err(StratError::DataLoad {
                reason: reason.clone(),
            });
        }
        match &self.series {
            Some(series) => Ok(series.clone().between(start, end)),
            None => Err(StratError::DataLoad {
                reason: "no series".to_string(),
            }),
        }
    }
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// One bar per day from 2024-01-01 with the given closes; open equals close,
/// high and low sit one point either side.
pub fn daily_series(closes: &[f64]) -> BarSeries {
    let start = date("2024-01-01");
    let shifted = |delta: f64| closes.iter().map(|c| c + delta).collect::<Vec<f64>>();
    BarSeries::from_columns([
        ("open", closes.to_vec()),
        ("high", shifted(1.0)),
        ("low", shifted(-1.0)),
        ("close", closes.to_vec()),
        ("volume", vec![1_000_000.0; closes.len()]),
    ])
    .unwrap()
    .with_dates(
        (0..closes.len())
            .map(|i| start + chrono::Days::new(i as u64))
            .collect(),
    )
    .unwrap()
}

pub fn closes_only(closes: &[f64]) -> BarSeries {
    BarSeries::from_columns([("close", closes.to_vec())]).unwrap()
}

pub fn write_temp(content: &str, suffix: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

pub const PRESET_TREND: &str = "\
ENTRY:
  close > SMA(close, 20)
  volume > 1000000

EXIT:
  RSI(close, 14) < 30
";

pub const PRESET_CROSS: &str = "\
ENTRY:
  CROSS(close, \"ABOVE\", SMA(close, 10))
EXIT:
  CROSS(close, \"BELOW\", SMA(close, 10))
";

pub const PRESET_LOOKBACK: &str = "\
ENTRY:
  high[1] > close
EXIT:
  volume < 900000
";
