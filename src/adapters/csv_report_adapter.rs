//! CSV report adapter implementing ReportPort.
//!
//! Writes `trades.csv` (the ledger) and `equity.csv` (one row per evaluated
//! bar) into the output directory, creating it if needed.

use std::fs;
use std::path::Path;

use crate::domain::backtest::BacktestResult;
use crate::domain::error::SmartstockError;
use crate::ports::report_port::ReportPort;

pub const TRADES_FILE: &str = "trades.csv";
pub const EQUITY_FILE: &str = "equity.csv";

#[derive(Debug, Default)]
pub struct CsvReportAdapter;

fn csv_error(path: &Path, e: csv::Error) -> SmartstockError {
    SmartstockError::Io(std::io::Error::other(format!(
        "failed to write {}: {}",
        path.display(),
        e
    )))
}

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }

    fn write_trades(&self, result: &BacktestResult, path: &Path) -> Result<(), SmartstockError> {
        let mut wtr = csv::Writer::from_path(path).map_err(|e| csv_error(path, e))?;
        wtr.write_record([
            "date",
            "side",
            "tag",
            "entry_tag",
            "price",
            "quantity",
            "realized_return",
        ])
        .map_err(|e| csv_error(path, e))?;

        for trade in &result.trades {
            wtr.write_record([
                trade.date.to_string(),
                trade.side.to_string(),
                trade.tag.to_string(),
                trade.entry_tag.to_string(),
                format!("{:.4}", trade.price),
                trade.quantity.to_string(),
                trade
                    .realized_return
                    .map(|r| format!("{r:.6}"))
                    .unwrap_or_default(),
            ])
            .map_err(|e| csv_error(path, e))?;
        }

        wtr.flush()?;
        Ok(())
    }

    fn write_equity(&self, result: &BacktestResult, path: &Path) -> Result<(), SmartstockError> {
        let mut wtr = csv::Writer::from_path(path).map_err(|e| csv_error(path, e))?;
        wtr.write_record(["date", "equity"])
            .map_err(|e| csv_error(path, e))?;

        for point in &result.equity_curve {
            wtr.write_record([point.date.to_string(), format!("{:.2}", point.equity)])
                .map_err(|e| csv_error(path, e))?;
        }

        wtr.flush()?;
        Ok(())
    }
}

impl ReportPort for CsvReportAdapter {
    fn write(&self, result: &BacktestResult, output_dir: &Path) -> Result<(), SmartstockError> {
        fs::create_dir_all(output_dir)?;
        self.write_trades(result, &output_dir.join(TRADES_FILE))?;
        self.write_equity(result, &output_dir.join(EQUITY_FILE))?;
        tracing::info!(
            dir = %output_dir.display(),
            trades = result.trades.len(),
            points = result.equity_curve.len(),
            "report written"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::backtest::EngineState;
    use crate::domain::metrics::{BacktestStats, SignalCounters};
    use crate::domain::portfolio::Portfolio;
    use crate::domain::position::{Side, Trade};
    use crate::domain::signal::StrategyTag;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn sample_result() -> BacktestResult {
        let mut portfolio = Portfolio::new(100_000.0);
        portfolio.record_trade(Trade {
            date: d(4),
            side: Side::Buy,
            tag: StrategyTag::Breakout,
            entry_tag: StrategyTag::Breakout,
            price: 100.05,
            quantity: 698,
            realized_return: None,
        });
        portfolio.record_trade(Trade {
            date: d(8),
            side: Side::Sell,
            tag: StrategyTag::Stop,
            entry_tag: StrategyTag::Breakout,
            price: 95.0,
            quantity: 698,
            realized_return: Some(95.0 / 100.05 - 1.0),
        });
        for (day, equity) in [(1, 100_000.0), (4, 100_100.0), (8, 96_400.0)] {
            portfolio.record_equity(d(day), equity);
        }
        let stats = BacktestStats::compute(&portfolio, &SignalCounters::default());
        BacktestResult {
            symbol: "SPY".to_string(),
            trades: portfolio.trades,
            equity_curve: portfolio.equity_curve,
            stats,
            final_state: EngineState::Cooldown,
        }
    }

    #[test]
    fn writes_ledger_and_equity() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("report");
        CsvReportAdapter::new().write(&sample_result(), &out).unwrap();

        let trades = fs::read_to_string(out.join(TRADES_FILE)).unwrap();
        let lines: Vec<&str> = trades.lines().collect();
        assert_eq!(lines[0], "date,side,tag,entry_tag,price,quantity,realized_return");
        assert_eq!(lines[1], "2024-03-04,BUY,BREAKOUT,BREAKOUT,100.0500,698,");
        assert!(lines[2].starts_with("2024-03-08,SELL,STOP,BREAKOUT,95.0000,698,-0.05"));

        let equity = fs::read_to_string(out.join(EQUITY_FILE)).unwrap();
        let lines: Vec<&str> = equity.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "date,equity");
        assert_eq!(lines[3], "2024-03-08,96400.00");
    }

    #[test]
    fn empty_result_writes_headers_only() {
        let dir = TempDir::new().unwrap();
        let mut result = sample_result();
        result.trades.clear();
        result.equity_curve.clear();
        CsvReportAdapter::new().write(&result, dir.path()).unwrap();

        let trades = fs::read_to_string(dir.path().join(TRADES_FILE)).unwrap();
        assert_eq!(trades.lines().count(), 1);
    }
}
