//! Bar data access port trait.

use crate::domain::error::StratError;
use crate::domain::ohlcv::BarSeries;
use chrono::NaiveDate;

pub trait DataPort {
    /// Load the series, keeping only bars dated within `[start, end]` when
    /// the source has dates and a bound is given.
    fn fetch_series(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<BarSeries, StratError>;
}
