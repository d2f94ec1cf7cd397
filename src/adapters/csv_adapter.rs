//! CSV file data adapter.
//!
//! The first row names the columns. A `date` column (`YYYY-MM-DD`), if
//! present, becomes the date index and rows are sorted by it. Every other
//! column is numeric; an empty cell is an unknown value.

use crate::domain::error::StratError;
use crate::domain::ohlcv::BarSeries;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

pub struct CsvAdapter {
    path: PathBuf,
}

struct Row {
    date: Option<NaiveDate>,
    values: Vec<f64>,
}

impl CsvAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn parse(&self, content: &str) -> Result<BarSeries, StratError> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let headers = rdr
            .headers()
            .map_err(|e| StratError::DataLoad {
                reason: format!("CSV header error in {}: {}", self.path.display(), e),
            })?
            .clone();
        let date_idx = headers.iter().position(|h| h.eq_ignore_ascii_case("date"));
        let value_idx: Vec<usize> = (0..headers.len()).filter(|i| Some(*i) != date_idx).collect();

        let mut rows = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| StratError::DataLoad {
                reason: format!("CSV parse error: {}", e),
            })?;
            let line = record.position().map_or(0, |p| p.line());

            let date = match date_idx {
                Some(idx) => {
                    let raw = record.get(idx).unwrap_or_default();
                    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| {
                        StratError::DataLoad {
                            reason: format!("invalid date '{}' on line {}: {}", raw, line, e),
                        }
                    })?;
                    Some(date)
                }
                None => None,
            };

            let values = value_idx
                .iter()
                .map(|&idx| {
                    let raw = record.get(idx).unwrap_or_default();
                    if raw.is_empty() {
                        return Ok(f64::NAN);
                    }
                    let value = raw.parse::<f64>().map_err(|e| StratError::DataLoad {
                        reason: format!(
                            "invalid {} value '{}' on line {}: {}",
                            &headers[idx], raw, line, e
                        ),
                    })?;
                    if value.is_infinite() {
                        return Err(StratError::DataLoad {
                            reason: format!(
                                "infinite {} value '{}' on line {}",
                                &headers[idx], raw, line
                            ),
                        });
                    }
                    Ok(value)
                })
                .collect::<Result<Vec<f64>, _>>()?;

            rows.push(Row { date, values });
        }

        if date_idx.is_some() {
            rows.sort_by_key(|r| r.date);
        }

        let columns = value_idx.iter().enumerate().map(|(col, &idx)| {
            let values = rows.iter().map(|r| r.values[col]).collect::<Vec<f64>>();
            (headers[idx].to_string(), values)
        });
        let series = BarSeries::from_columns(columns)?;

        match date_idx {
            Some(_) => Ok(series.with_dates(rows.iter().filter_map(|r| r.date).collect())?),
            None => Ok(series),
        }
    }
}

impl DataPort for CsvAdapter {
    fn fetch_series(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<BarSeries, StratError> {
        let content = fs::read_to_string(&self.path).map_err(|e| StratError::DataLoad {
            reason: format!("failed to read {}: {}", self.path.display(), e),
        })?;
        let series = self.parse(&content)?.between(start, end);
        log::debug!(
            "loaded {} bars from {}",
            series.len(),
            self.path.display()
        );
        Ok(series)
    }
}
