//! Smoothed RSI momentum oscillator ("BX").
//!
//! BX = EMA_span(RSI(period) - 50), adjust-free. Positive is bullish
//! momentum, negative bearish. Parameterised twice: short (5, 3) drives the
//! reversal trigger, long (20, 10) gates the weekly macro regime.

use crate::domain::indicator::ema::{smooth, span_alpha};
use crate::domain::indicator::rsi::raw_rsi;
use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MomentumParams {
    pub rsi_period: usize,
    pub smooth_span: usize,
}

impl MomentumParams {
    pub const SHORT: MomentumParams = MomentumParams {
        rsi_period: 5,
        smooth_span: 3,
    };

    pub const LONG: MomentumParams = MomentumParams {
        rsi_period: 20,
        smooth_span: 10,
    };
}

pub fn calculate_momentum(prices: &[f64], params: MomentumParams) -> IndicatorSeries {
    let indicator_type = IndicatorType::Momentum {
        rsi_period: params.rsi_period,
        smooth_span: params.smooth_span,
    };

    if params.rsi_period == 0 || params.smooth_span == 0 {
        return IndicatorSeries {
            indicator_type,
            values: prices.iter().map(|_| IndicatorPoint::invalid()).collect(),
        };
    }

    let centred: Vec<f64> = raw_rsi(prices, params.rsi_period)
        .into_iter()
        .map(|rsi| rsi - 50.0)
        .collect();

    let values = smooth(&centred, span_alpha(params.smooth_span))
        .into_iter()
        .enumerate()
        .map(|(i, bx)| {
            if i >= params.rsi_period {
                IndicatorPoint::valid(bx)
            } else {
                IndicatorPoint::invalid()
            }
        })
        .collect();

    IndicatorSeries {
        indicator_type,
        values,
    }
}

/// True when the oscillator moved from <= 0 on the prior bar to > 0 now.
pub fn crossed_above_zero(series: &IndicatorSeries, index: usize) -> bool {
    if index == 0 {
        return false;
    }
    match (series.get(index - 1), series.get(index)) {
        (Some(prev), Some(now)) => prev <= 0.0 && now > 0.0,
        _ => false,
    }
}
