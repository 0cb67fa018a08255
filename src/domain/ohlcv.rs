//! OHLCV bar representation and ordered bar series.

use chrono::NaiveDate;

use crate::domain::error::SmartstockError;
use crate::domain::timeframe::Timeframe;

#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl OhlcvBar {
    /// high - low
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// Where the close sits inside the bar's range, 0.0 at the low and 1.0 at
    /// the high. A zero-range bar reports the neutral 0.5.
    pub fn close_position(&self) -> f64 {
        if self.high == self.low {
            0.5
        } else {
            (self.close - self.low) / self.range()
        }
    }

    fn is_finite(&self) -> bool {
        self.open.is_finite() && self.high.is_finite() && self.low.is_finite() && self.close.is_finite()
    }
}

/// Ordered bars for one instrument at one sampling frequency.
///
/// Dates are strictly increasing. Gaps (weekends, holidays) are allowed.
#[derive(Debug, Clone, PartialEq)]
pub struct BarSeries {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub bars: Vec<OhlcvBar>,
}

impl BarSeries {
    pub fn new(
        symbol: impl Into<String>,
        timeframe: Timeframe,
        bars: Vec<OhlcvBar>,
    ) -> Result<Self, SmartstockError> {
        let symbol = symbol.into();
        if let Some(pos) = bars.windows(2).position(|w| w[1].date <= w[0].date) {
            return Err(SmartstockError::AnalysisFailed {
                reason: format!(
                    "{symbol} {timeframe} bars out of order at {}",
                    bars[pos + 1].date
                ),
            });
        }
        if let Some(bar) = bars.iter().find(|b| !b.is_finite()) {
            return Err(SmartstockError::AnalysisFailed {
                reason: format!("{symbol} {timeframe} bar on {} has non-finite prices", bar.date),
            });
        }
        Ok(Self {
            symbol,
            timeframe,
            bars,
        })
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> Option<&OhlcvBar> {
        self.bars.last()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }

    /// Fails with `InsufficientData` unless at least `minimum` bars exist.
    pub fn require(&self, minimum: usize) -> Result<(), SmartstockError> {
        if self.bars.is_empty() {
            return Err(SmartstockError::NoData {
                symbol: self.symbol.clone(),
            });
        }
        if self.bars.len() < minimum {
            return Err(SmartstockError::InsufficientData {
                symbol: self.symbol.clone(),
                timeframe: self.timeframe,
                bars: self.bars.len(),
                minimum,
            });
        }
        Ok(())
    }
}
