//! Wilder RSI with exponentially smoothed averages.
//!
//! Gains and losses are smoothed with the adjust-free recursion at
//! a = 1/period, seeded with zero change on the first bar.
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / (avg_loss + 1e-12)))
//! The epsilon keeps an all-gains window finite (just below 100).
//!
//! Warmup: the first `period` bars are invalid. They still feed the
//! recursion, so later values do not depend on where validity begins.

use crate::domain::indicator::ema::smooth;
use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};

const LOSS_EPSILON: f64 = 1e-12;

/// RSI for every bar, including the warmup ones.
pub(crate) fn raw_rsi(prices: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || prices.is_empty() {
        return vec![0.0; prices.len()];
    }

    let mut gains = Vec::with_capacity(prices.len());
    let mut losses = Vec::with_capacity(prices.len());
    gains.push(0.0);
    losses.push(0.0);
    for w in prices.windows(2) {
        let change = w[1] - w[0];
        gains.push(if change > 0.0 { change } else { 0.0 });
        losses.push(if change < 0.0 { -change } else { 0.0 });
    }

    let alpha = 1.0 / period as f64;
    let avg_gain = smooth(&gains, alpha);
    let avg_loss = smooth(&losses, alpha);

    avg_gain
        .iter()
        .zip(&avg_loss)
        .map(|(g, l)| 100.0 - 100.0 / (1.0 + g / (l + LOSS_EPSILON)))
        .collect()
}

pub fn calculate_wilder_rsi(prices: &[f64], period: usize) -> IndicatorSeries {
    let values = raw_rsi(prices, period)
        .into_iter()
        .enumerate()
        .map(|(i, rsi)| {
            if period > 0 && i >= period {
                IndicatorPoint::valid(rsi)
            } else {
                IndicatorPoint::invalid()
            }
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::WilderRsi(period),
        values,
    }
}
