//! Exponential Moving Average, adjust-free recursive form.
//!
//! EMA[0] = X[0], then EMA[i] = X[i]*a + EMA[i-1]*(1-a).
//! With a span: a = 2/(span+1). Wilder smoothing uses a = 1/period.
//! No warmup: the seed is the first input, not an SMA of the first n values.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};

/// Raw recursive smoothing with factor `alpha`.
pub fn smooth(values: &[f64], alpha: f64) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len());
    let mut prev: Option<f64> = None;
    for &x in values {
        let next = match prev {
            None => x,
            Some(p) => x * alpha + p * (1.0 - alpha),
        };
        out.push(next);
        prev = Some(next);
    }
    out
}

pub fn span_alpha(span: usize) -> f64 {
    2.0 / (span as f64 + 1.0)
}

pub fn calculate_ema(values: &[f64], span: usize) -> IndicatorSeries {
    if span == 0 {
        return IndicatorSeries {
            indicator_type: IndicatorType::Ema(span),
            values: values.iter().map(|_| IndicatorPoint::invalid()).collect(),
        };
    }

    let values = smooth(values, span_alpha(span))
        .into_iter()
        .map(IndicatorPoint::valid)
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Ema(span),
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ema_seed_is_first_value() {
        let series = calculate_ema(&[10.0, 20.0, 30.0], 3);
        assert_eq!(series.get(0), Some(10.0));
    }

    #[test]
    fn ema_recursive_calculation() {
        let series = calculate_ema(&[10.0, 20.0, 30.0, 40.0], 3);

        let k = 2.0 / 4.0;
        let e1 = 20.0 * k + 10.0 * (1.0 - k);
        let e2 = 30.0 * k + e1 * (1.0 - k);
        let e3 = 40.0 * k + e2 * (1.0 - k);

        assert!((series.get(1).unwrap() - e1).abs() < f64::EPSILON);
        assert!((series.get(2).unwrap() - e2).abs() < f64::EPSILON);
        assert!((series.get(3).unwrap() - e3).abs() < f64::EPSILON);
    }

    #[test]
    fn ema_period_1_tracks_input() {
        let series = calculate_ema(&[10.0, 20.0, 30.0], 1);
        assert_eq!(series.get(1), Some(20.0));
        assert_eq!(series.get(2), Some(30.0));
    }

    #[test]
    fn ema_equal_prices() {
        let series = calculate_ema(&[100.0; 5], 3);
        for i in 0..5 {
            assert!((series.get(i).unwrap() - 100.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn ema_span_0_is_invalid() {
        let series = calculate_ema(&[10.0, 20.0], 0);
        assert_eq!(series.len(), 2);
        assert!(series.values.iter().all(|p| !p.valid));
    }

    #[test]
    fn ema_empty_input() {
        assert!(calculate_ema(&[], 3).is_empty());
    }

    #[test]
    fn wilder_alpha_smoothing() {
        let out = smooth(&[0.0, 14.0], 1.0 / 14.0);
        assert!((out[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn ema_indicator_type() {
        assert_eq!(calculate_ema(&[1.0], 10).indicator_type, IndicatorType::Ema(10));
    }
}
