//! Backtest output export port trait.

use std::path::Path;

use crate::domain::backtest::BacktestResult;
use crate::domain::error::SmartstockError;

/// Port for writing the trade ledger and equity series.
pub trait ReportPort {
    fn write(&self, result: &BacktestResult, output_dir: &Path) -> Result<(), SmartstockError>;
}
