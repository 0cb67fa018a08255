//! Sampling frequencies, calendar-period boundaries and resampling.
//!
//! Weekly and monthly bars are derived from the daily series by grouping
//! into calendar periods: open = first, high = max, low = min, close = last,
//! volume = sum. Aggregated bars are stamped with the period's end date
//! (the week's closing weekday, the last calendar day of the month), so a
//! period is "complete" for any daily bar dated on or after that stamp.

use chrono::{Datelike, Days, Months, NaiveDate, Weekday};
use std::fmt;

use crate::domain::ohlcv::OhlcvBar;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timeframe {
    Daily,
    Weekly,
    Monthly,
}

/// Lookback windows used for one timeframe's reference levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeframeWindows {
    /// Rolling max of High, shifted one bar.
    pub high: usize,
    /// Rolling min of Low, shifted one bar.
    pub support: usize,
    /// Rolling mean of Close, same-bar.
    pub trend: usize,
}

impl Timeframe {
    pub fn windows(self) -> TimeframeWindows {
        match self {
            Timeframe::Daily => TimeframeWindows {
                high: 252,
                support: 20,
                trend: 200,
            },
            Timeframe::Weekly => TimeframeWindows {
                high: 52,
                support: 10,
                trend: 50,
            },
            Timeframe::Monthly => TimeframeWindows {
                high: 12,
                support: 6,
                trend: 20,
            },
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timeframe::Daily => write!(f, "daily"),
            Timeframe::Weekly => write!(f, "weekly"),
            Timeframe::Monthly => write!(f, "monthly"),
        }
    }
}

/// Calendar convention for period boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodPolicy {
    pub week_ends_on: Weekday,
}

impl Default for PeriodPolicy {
    fn default() -> Self {
        PeriodPolicy {
            week_ends_on: Weekday::Sun,
        }
    }
}

impl PeriodPolicy {
    /// Parse a `week_ends_on` config value ("sun", "fri", ...).
    pub fn parse_week_end(value: &str) -> Option<Weekday> {
        match value.trim().to_lowercase().as_str() {
            "mon" | "monday" => Some(Weekday::Mon),
            "tue" | "tuesday" => Some(Weekday::Tue),
            "wed" | "wednesday" => Some(Weekday::Wed),
            "thu" | "thursday" => Some(Weekday::Thu),
            "fri" | "friday" => Some(Weekday::Fri),
            "sat" | "saturday" => Some(Weekday::Sat),
            "sun" | "sunday" => Some(Weekday::Sun),
            _ => None,
        }
    }

    /// End date of the period containing `date`.
    pub fn period_end(&self, date: NaiveDate, timeframe: Timeframe) -> NaiveDate {
        match timeframe {
            Timeframe::Daily => date,
            Timeframe::Weekly => {
                let target = self.week_ends_on.num_days_from_monday() as i64;
                let current = date.weekday().num_days_from_monday() as i64;
                let ahead = (target - current).rem_euclid(7) as u64;
                date + Days::new(ahead)
            }
            Timeframe::Monthly => month_end(date),
        }
    }
}

fn month_end(date: NaiveDate) -> NaiveDate {
    date.with_day(1)
        .and_then(|first| first.checked_add_months(Months::new(1)))
        .and_then(|next| next.pred_opt())
        .unwrap_or(date)
}

/// Aggregate ordered daily bars into `timeframe` bars under `policy`.
///
/// Only periods containing at least one daily bar are emitted.
pub fn resample(bars: &[OhlcvBar], timeframe: Timeframe, policy: &PeriodPolicy) -> Vec<OhlcvBar> {
    if timeframe == Timeframe::Daily {
        return bars.to_vec();
    }

    let mut out: Vec<OhlcvBar> = Vec::new();
    for bar in bars {
        let end = policy.period_end(bar.date, timeframe);
        match out.last_mut() {
            Some(agg) if agg.date == end => {
                agg.high = agg.high.max(bar.high);
                agg.low = agg.low.min(bar.low);
                agg.close = bar.close;
                agg.volume += bar.volume;
            }
            _ => out.push(OhlcvBar {
                date: end,
                open: bar.open,
                high: bar.high,
                low: bar.low,
                close: bar.close,
                volume: bar.volume,
            }),
        }
    }
    out
}
