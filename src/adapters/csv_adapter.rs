//! CSV file data adapter.
//!
//! One file per symbol, `<base>/<SYMBOL>.csv`, with a header row and columns
//! `date,open,high,low,close,volume` (date as YYYY-MM-DD).

use crate::domain::error::SmartstockError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

pub struct CsvAdapter {
    base_path: PathBuf,
}

fn parse_field<T>(record: &csv::StringRecord, index: usize, name: &str) -> Result<T, SmartstockError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    record
        .get(index)
        .ok_or_else(|| SmartstockError::DataSource {
            reason: format!("missing {name} column"),
        })?
        .trim()
        .parse()
        .map_err(|e| SmartstockError::DataSource {
            reason: format!("invalid {name} value: {e}"),
        })
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol.to_uppercase()))
    }

    fn read_all(&self, symbol: &str) -> Result<Vec<OhlcvBar>, SmartstockError> {
        let path = self.csv_path(symbol);
        if !path.exists() {
            tracing::warn!(symbol, path = %path.display(), "no data file");
            return Err(SmartstockError::NoData {
                symbol: symbol.to_string(),
            });
        }
        let content = fs::read_to_string(&path).map_err(|e| SmartstockError::DataSource {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| SmartstockError::DataSource {
                reason: format!("CSV parse error: {}", e),
            })?;

            let date_str: String = parse_field(&record, 0, "date")?;
            let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").map_err(|e| {
                SmartstockError::DataSource {
                    reason: format!("invalid date format: {}", e),
                }
            })?;

            bars.push(OhlcvBar {
                date,
                open: parse_field(&record, 1, "open")?,
                high: parse_field(&record, 2, "high")?,
                low: parse_field(&record, 3, "low")?,
                close: parse_field(&record, 4, "close")?,
                volume: parse_field(&record, 5, "volume")?,
            });
        }

        bars.sort_by_key(|b| b.date);
        bars.dedup_by_key(|b| b.date);
        tracing::debug!(symbol, bars = bars.len(), "loaded csv");
        Ok(bars)
    }
}

impl DataPort for CsvAdapter {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, SmartstockError> {
        let mut bars = self.read_all(symbol)?;
        bars.retain(|b| b.date >= start_date && b.date <= end_date);
        Ok(bars)
    }

    fn fetch_recent(&self, symbol: &str, bars: usize) -> Result<Vec<OhlcvBar>, SmartstockError> {
        let mut all = self.read_all(symbol)?;
        let skip = all.len().saturating_sub(bars);
        Ok(all.split_off(skip))
    }

    fn list_symbols(&self) -> Result<Vec<String>, SmartstockError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| SmartstockError::DataSource {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|e| SmartstockError::DataSource {
                reason: format!("directory entry error: {}", e),
            })?;

            let name = entry.file_name();
            let name_str = name.to_string_lossy();

            if let Some(symbol) = name_str.strip_suffix(".csv") {
                symbols.push(symbol.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}
