//! End-of-day analysis of the latest daily bar.

use crate::domain::error::SmartstockError;
use crate::domain::levels::{DailyLevels, MultiTimeframe, monthly_bullish, weekly_bullish};
use crate::domain::ohlcv::BarSeries;
use crate::domain::signal::{DecisionInput, Recommendation, decide};
use crate::domain::timeframe::PeriodPolicy;

/// 252 bars of high-reference history plus a little slack.
pub const MIN_HISTORY_BARS: usize = 260;

/// Decision for the last bar plus the context needed to present it.
#[derive(Debug, Clone)]
pub struct EodReport {
    pub symbol: String,
    pub recommendation: Recommendation,
    pub high_ref: f64,
    pub support_ref: f64,
    /// Long daily trend, MA(200).
    pub ma_long: f64,
    /// Mid daily trend, MA(50).
    pub ma_mid: f64,
    pub daily: BarSeries,
    pub weekly: BarSeries,
    pub monthly: BarSeries,
}

impl EodReport {
    pub fn date(&self) -> Option<chrono::NaiveDate> {
        self.daily.last().map(|b| b.date)
    }

    pub fn close(&self) -> Option<f64> {
        self.daily.last().map(|b| b.close)
    }
}

fn level(value: Option<f64>, name: &str) -> Result<f64, SmartstockError> {
    match value {
        Some(v) if v.is_finite() => Ok(v),
        Some(v) => Err(SmartstockError::AnalysisFailed {
            reason: format!("{name} is not finite ({v})"),
        }),
        None => Err(SmartstockError::AnalysisFailed {
            reason: format!("{name} is undefined on the last bar"),
        }),
    }
}

pub fn analyze(daily: BarSeries, policy: &PeriodPolicy) -> Result<EodReport, SmartstockError> {
    daily.require(MIN_HISTORY_BARS)?;

    let mtf = MultiTimeframe::from_daily(daily, policy)?;
    mtf.weekly.require(1)?;
    mtf.monthly.require(1)?;

    let bars = &mtf.daily.bars;
    let last = bars.len() - 1;
    let levels = DailyLevels::compute(bars);

    let high_ref = level(levels.levels.high_ref.get(last), "high reference")?;
    let support_ref = level(levels.levels.support_ref.get(last), "support reference")?;
    let ma_long = level(levels.levels.trend.get(last), "MA(200)")?;
    let ma_mid = level(levels.trend_mid.get(last), "MA(50)")?;
    if high_ref <= 0.0 {
        return Err(SmartstockError::AnalysisFailed {
            reason: format!("high reference must be positive, got {high_ref}"),
        });
    }

    let volume_ratio = levels.volume_ratio(bars, last);
    if !volume_ratio.is_finite() {
        return Err(SmartstockError::AnalysisFailed {
            reason: "volume ratio is not finite".to_string(),
        });
    }

    // the latest period, closed or not, is the current macro state
    let weekly = weekly_bullish(&mtf.weekly.bars).last().copied().unwrap_or(false);
    let monthly = monthly_bullish(&mtf.monthly.bars).last().copied().unwrap_or(false);

    let momentum = &levels.levels.momentum_short;
    let recommendation = decide(&DecisionInput {
        bar: &bars[last],
        high_ref,
        support_ref,
        trend_mid: ma_mid,
        volume_ratio,
        momentum_prev: momentum.get(last - 1),
        momentum_now: momentum.get(last),
        weekly_bullish: weekly,
        monthly_bullish: monthly,
    });

    tracing::info!(
        symbol = %mtf.daily.symbol,
        date = %bars[last].date,
        action = %recommendation.action,
        reason = %recommendation.reason,
        "eod decision"
    );

    Ok(EodReport {
        symbol: mtf.daily.symbol.clone(),
        recommendation,
        high_ref,
        support_ref,
        ma_long,
        ma_mid,
        daily: mtf.daily,
        weekly: mtf.weekly,
        monthly: mtf.monthly,
    })
}
