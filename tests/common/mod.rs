#![allow(dead_code)]

use chrono::{Days, NaiveDate};
use smartstock::domain::error::SmartstockError;
pub use smartstock::domain::ohlcv::OhlcvBar;
use smartstock::ports::data_port::DataPort;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }

    fn lookup(&self, symbol: &str) -> Result<Vec<OhlcvBar>, SmartstockError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(SmartstockError::DataSource {
                reason: reason.clone(),
            });
        }
        self.data
            .get(symbol)
            .cloned()
            .ok_or_else(|| SmartstockError::NoData {
                symbol: symbol.to_string(),
            })
    }
}

impl DataPort for MockDataPort {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, SmartstockError> {
        let mut bars = self.lookup(symbol)?;
        bars.retain(|b| b.date >= start_date && b.date <= end_date);
        Ok(bars)
    }

    fn fetch_recent(&self, symbol: &str, count: usize) -> Result<Vec<OhlcvBar>, SmartstockError> {
        let mut bars = self.lookup(symbol)?;
        let skip = bars.len().saturating_sub(count);
        Ok(bars.split_off(skip))
    }

    fn list_symbols(&self) -> Result<Vec<String>, SmartstockError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

pub fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
}

pub fn end_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2030, 12, 31).unwrap()
}

/// Calendar-day bars that close near their high on volume growing 3% a bar.
pub fn make_bars(closes: &[f64]) -> Vec<OhlcvBar> {
    let mut volume = 10_000.0_f64;
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            volume *= 1.03;
            OhlcvBar {
                date: start_date() + Days::new(i as u64),
                open: if i == 0 { close } else { closes[i - 1] },
                high: close * 1.002,
                low: close * 0.99,
                close,
                volume: volume as i64,
            }
        })
        .collect()
}

/// Identical bars: no range, no volume change.
pub fn flat_bars(n: usize, price: f64) -> Vec<OhlcvBar> {
    (0..n)
        .map(|i| OhlcvBar {
            date: start_date() + Days::new(i as u64),
            open: price,
            high: price,
            low: price,
            close: price,
            volume: 1_000,
        })
        .collect()
}

pub fn rising_closes(n: usize) -> Vec<f64> {
    (0..n).map(|i| 100.0 * 1.01f64.powi(i as i32)).collect()
}

/// Rise for `up` bars, fall 2% a bar for `down`, then rise 1% a bar for `recover`.
pub fn swing_closes(up: usize, down: usize, recover: usize) -> Vec<f64> {
    let mut closes = rising_closes(up);
    let mut last = closes.last().copied().unwrap_or(100.0);
    for _ in 0..down {
        last *= 0.98;
        closes.push(last);
    }
    for _ in 0..recover {
        last *= 1.01;
        closes.push(last);
    }
    closes
}

/// Flat base with an old spike holding the 252-bar high out of reach, a dip
/// at bar 250, then a sharp recovery from bar 252 rising 1% a bar.
pub fn dip_and_recover_closes(n: usize) -> Vec<f64> {
    let mut closes = vec![100.0; n];
    closes[5] = 150.0;
    closes[250] = 99.5;
    closes[251] = 99.6;
    for (k, close) in closes.iter_mut().enumerate().skip(252) {
        *close = 105.0 * 1.01f64.powi((k - 252) as i32);
    }
    closes
}
