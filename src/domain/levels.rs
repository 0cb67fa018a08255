//! Multi-timeframe reference levels and macro regime flags.
//!
//! For each timeframe:
//! - high reference: rolling max of High, lagged one bar
//! - support reference: rolling min of Low, lagged one bar
//! - trend: rolling mean of Close, same bar
//!
//! Macro regime:
//! - weekly bullish = close > MA(50) and long BX > -5
//! - monthly bullish = close > MA(20)
//!
//! Weekly/monthly flags reach the daily index only through [`forward_fill`],
//! which hands each daily bar the flag of the latest period already closed.

use chrono::NaiveDate;

use crate::domain::error::SmartstockError;
use crate::domain::indicator::IndicatorSeries;
use crate::domain::indicator::momentum::{MomentumParams, calculate_momentum};
use crate::domain::indicator::rolling::{rolling_max, rolling_mean, rolling_min};
use crate::domain::ohlcv::{BarSeries, OhlcvBar};
use crate::domain::timeframe::{PeriodPolicy, Timeframe, resample};

/// Mid-term daily trend used by the reversal trigger and plan abandonment.
pub const DAILY_MID_TREND_WINDOW: usize = 50;
pub const VOLUME_MA_WINDOW: usize = 20;
pub const WEEKLY_MOMENTUM_FLOOR: f64 = -5.0;

/// Chart and decision overlays for one timeframe.
#[derive(Debug, Clone)]
pub struct TimeframeLevels {
    pub timeframe: Timeframe,
    pub high_ref: IndicatorSeries,
    pub support_ref: IndicatorSeries,
    pub trend: IndicatorSeries,
    pub momentum_short: IndicatorSeries,
    pub momentum_long: IndicatorSeries,
}

impl TimeframeLevels {
    pub fn compute(bars: &[OhlcvBar], timeframe: Timeframe) -> Self {
        let windows = timeframe.windows();
        let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
        let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

        TimeframeLevels {
            timeframe,
            high_ref: rolling_max(&highs, windows.high).lagged(1),
            support_ref: rolling_min(&lows, windows.support).lagged(1),
            trend: rolling_mean(&closes, windows.trend),
            momentum_short: calculate_momentum(&closes, MomentumParams::SHORT),
            momentum_long: calculate_momentum(&closes, MomentumParams::LONG),
        }
    }
}

/// Daily levels plus the daily-only series the decision rules read.
#[derive(Debug, Clone)]
pub struct DailyLevels {
    pub levels: TimeframeLevels,
    pub trend_mid: IndicatorSeries,
    pub volume_ma: IndicatorSeries,
}

impl DailyLevels {
    pub fn compute(bars: &[OhlcvBar]) -> Self {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let volumes: Vec<f64> = bars.iter().map(|b| b.volume as f64).collect();
        DailyLevels {
            levels: TimeframeLevels::compute(bars, Timeframe::Daily),
            trend_mid: rolling_mean(&closes, DAILY_MID_TREND_WINDOW),
            volume_ma: rolling_mean(&volumes, VOLUME_MA_WINDOW),
        }
    }

    /// Current volume over its 20-bar average; 0 when the average is unusable.
    pub fn volume_ratio(&self, bars: &[OhlcvBar], index: usize) -> f64 {
        match self.volume_ma.get(index) {
            Some(avg) if avg > 0.0 => bars[index].volume as f64 / avg,
            _ => 0.0,
        }
    }
}

pub fn weekly_bullish(bars: &[OhlcvBar]) -> Vec<bool> {
    let levels = TimeframeLevels::compute(bars, Timeframe::Weekly);
    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            let above_trend = levels.trend.get(i).is_some_and(|ma| bar.close > ma);
            let momentum_ok = levels
                .momentum_long
                .get(i)
                .is_some_and(|bx| bx > WEEKLY_MOMENTUM_FLOOR);
            above_trend && momentum_ok
        })
        .collect()
}

pub fn monthly_bullish(bars: &[OhlcvBar]) -> Vec<bool> {
    let levels = TimeframeLevels::compute(bars, Timeframe::Monthly);
    bars.iter()
        .enumerate()
        .map(|(i, bar)| levels.trend.get(i).is_some_and(|ma| bar.close > ma))
        .collect()
}

/// Map per-period flags onto `daily_dates`.
///
/// `period_dates` are period-end stamps (ascending). A daily bar takes the
/// flag of the last period whose end is on or before its date; before the
/// first completed period the flag is false.
pub fn forward_fill(daily_dates: &[NaiveDate], period_dates: &[NaiveDate], flags: &[bool]) -> Vec<bool> {
    let mut out = Vec::with_capacity(daily_dates.len());
    let mut next = 0;
    let mut current = false;
    for date in daily_dates {
        while next < period_dates.len() && period_dates[next] <= *date {
            current = flags.get(next).copied().unwrap_or(false);
            next += 1;
        }
        out.push(current);
    }
    out
}

/// Daily series with its derived weekly and monthly views.
#[derive(Debug, Clone)]
pub struct MultiTimeframe {
    pub daily: BarSeries,
    pub weekly: BarSeries,
    pub monthly: BarSeries,
}

/// Macro flags for each timeframe on its own index.
#[derive(Debug, Clone, PartialEq)]
pub struct MacroRegime {
    pub weekly: Vec<bool>,
    pub monthly: Vec<bool>,
}

impl MultiTimeframe {
    pub fn from_daily(daily: BarSeries, policy: &PeriodPolicy) -> Result<Self, SmartstockError> {
        let weekly = BarSeries::new(
            daily.symbol.clone(),
            Timeframe::Weekly,
            resample(&daily.bars, Timeframe::Weekly, policy),
        )?;
        let monthly = BarSeries::new(
            daily.symbol.clone(),
            Timeframe::Monthly,
            resample(&daily.bars, Timeframe::Monthly, policy),
        )?;
        Ok(MultiTimeframe {
            daily,
            weekly,
            monthly,
        })
    }

    pub fn macro_regime(&self) -> MacroRegime {
        MacroRegime {
            weekly: weekly_bullish(&self.weekly.bars),
            monthly: monthly_bullish(&self.monthly.bars),
        }
    }

    /// Macro flags forward-filled onto the daily index, (weekly, monthly).
    pub fn synced_macro(&self, regime: &MacroRegime) -> (Vec<bool>, Vec<bool>) {
        let daily_dates = self.daily.dates();
        (
            forward_fill(&daily_dates, &self.weekly.dates(), &regime.weekly),
            forward_fill(&daily_dates, &self.monthly.dates(), &regime.monthly),
        )
    }
}
