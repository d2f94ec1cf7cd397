//! Bar data: the column-oriented `BarSeries` the evaluator reads.

use crate::domain::error::SeriesError;
use chrono::NaiveDate;

/// An ordered table of equal-length `f64` columns with a required `close`
/// column and an optional date per bar. Column names are stored lowercase.
#[derive(Debug, Clone, PartialEq)]
pub struct BarSeries {
    columns: Vec<(String, Vec<f64>)>,
    dates: Option<Vec<NaiveDate>>,
    len: usize,
}

impl BarSeries {
    pub fn from_columns<I, S>(columns: I) -> Result<Self, SeriesError>
    where
        I: IntoIterator<Item = (S, Vec<f64>)>,
        S: AsRef<str>,
    {
        let mut out: Vec<(String, Vec<f64>)> = Vec::new();
        let mut len = None;
        for (name, values) in columns {
            let name = name.as_ref().trim().to_ascii_lowercase();
            if out.iter().any(|(existing, _)| *existing == name) {
                return Err(SeriesError::DuplicateColumn { column: name });
            }
            let expected = *len.get_or_insert(values.len());
            if values.len() != expected {
                return Err(SeriesError::LengthMismatch {
                    column: name,
                    expected,
                    actual: values.len(),
                });
            }
            out.push((name, values));
        }
        if !out.iter().any(|(name, _)| name == "close") {
            return Err(SeriesError::MissingClose);
        }
        Ok(Self {
            columns: out,
            dates: None,
            len: len.unwrap_or(0),
        })
    }

    /// Attach a date index; one date per bar.
    pub fn with_dates(mut self, dates: Vec<NaiveDate>) -> Result<Self, SeriesError> {
        if dates.len() != self.len {
            return Err(SeriesError::LengthMismatch {
                column: "date".to_string(),
                expected: self.len,
                actual: dates.len(),
            });
        }
        self.dates = Some(dates);
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Case-insensitive column lookup.
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|(col, _)| col.eq_ignore_ascii_case(name))
            .map(|(_, values)| values.as_slice())
    }

    pub fn close(&self) -> &[f64] {
        self.column("close").unwrap_or_default()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn dates(&self) -> Option<&[NaiveDate]> {
        self.dates.as_deref()
    }

    pub fn date(&self, index: usize) -> Option<NaiveDate> {
        self.dates.as_ref()?.get(index).copied()
    }

    /// Keep only bars dated within `[start, end]`. A series without dates is
    /// returned unchanged.
    pub fn between(self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        let Some(dates) = &self.dates else {
            return self;
        };
        let keep: Vec<bool> = dates
            .iter()
            .map(|d| start.is_none_or(|s| *d >= s) && end.is_none_or(|e| *d <= e))
            .collect();
        let filter = |values: &[f64]| -> Vec<f64> {
            values
                .iter()
                .zip(&keep)
                .filter(|(_, k)| **k)
                .map(|(v, _)| *v)
                .collect()
        };

        let columns = self
            .columns
            .iter()
            .map(|(name, values)| (name.clone(), filter(values)))
            .collect();
        let dates: Vec<NaiveDate> = dates
            .iter()
            .zip(&keep)
            .filter(|(_, k)| **k)
            .map(|(d, _)| *d)
            .collect();
        Self {
            columns,
            len: dates.len(),
            dates: Some(dates),
        }
    }
}

/// Ten rising demo bars with no date index.
pub fn sample_series() -> BarSeries {
    let ramp = |base: f64| (0..10).map(|i| base + i as f64).collect::<Vec<f64>>();
    BarSeries {
        columns: vec![
            ("open".to_string(), ramp(100.0)),
            ("high".to_string(), ramp(101.0)),
            ("low".to_string(), ramp(99.0)),
            ("close".to_string(), ramp(100.0)),
            (
                "volume".to_string(),
                vec![
                    500_000.0, 1_200_000.0, 900_000.0, 2_000_000.0, 1_500_000.0, 1_100_000.0,
                    950_000.0, 1_800_000.0, 1_300_000.0, 1_600_000.0,
                ],
            ),
        ],
        dates: None,
        len: 10,
    }
}
