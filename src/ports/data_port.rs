//! Market-data access port trait.
//!
//! Implementations return bars sorted by date. An unknown symbol is
//! `NoData`; a read or parse failure is `DataSource`. Retrying is the
//! implementation's concern, never the caller's.

use crate::domain::error::SmartstockError;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;

pub trait DataPort {
    /// Daily bars with `start_date <= date <= end_date`.
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, SmartstockError>;

    /// The most recent `bars` daily bars.
    fn fetch_recent(&self, symbol: &str, bars: usize) -> Result<Vec<OhlcvBar>, SmartstockError>;

    fn list_symbols(&self) -> Result<Vec<String>, SmartstockError>;
}
