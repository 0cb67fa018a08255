//! Rolling-window max, min and mean.
//!
//! Each window includes the current bar. Warmup: first (n-1) bars are
//! invalid. Use [`IndicatorSeries::lagged`] to exclude the current bar.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};

fn rolling<F>(values: &[f64], window: usize, indicator_type: IndicatorType, reduce: F) -> IndicatorSeries
where
    F: Fn(&[f64]) -> f64,
{
    let points = (0..values.len())
        .map(|i| {
            if window == 0 || i + 1 < window {
                IndicatorPoint::invalid()
            } else {
                IndicatorPoint::valid(reduce(&values[i + 1 - window..=i]))
            }
        })
        .collect();

    IndicatorSeries {
        indicator_type,
        values: points,
    }
}

pub fn rolling_max(values: &[f64], window: usize) -> IndicatorSeries {
    rolling(values, window, IndicatorType::RollingMax(window), |w| {
        w.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    })
}

pub fn rolling_min(values: &[f64], window: usize) -> IndicatorSeries {
    rolling(values, window, IndicatorType::RollingMin(window), |w| {
        w.iter().copied().fold(f64::INFINITY, f64::min)
    })
}

pub fn rolling_mean(values: &[f64], window: usize) -> IndicatorSeries {
    rolling(values, window, IndicatorType::RollingMean(window), |w| {
        w.iter().sum::<f64>() / w.len() as f64
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rolling_max_warmup_and_values() {
        let series = rolling_max(&[1.0, 5.0, 3.0, 2.0, 4.0], 3);
        assert_eq!(series.get(0), None);
        assert_eq!(series.get(1), None);
        assert_eq!(series.get(2), Some(5.0));
        assert_eq!(series.get(3), Some(5.0));
        assert_eq!(series.get(4), Some(4.0));
    }

    #[test]
    fn rolling_min_values() {
        let series = rolling_min(&[3.0, 1.0, 4.0, 5.0], 2);
        assert_eq!(series.get(1), Some(1.0));
        assert_eq!(series.get(2), Some(1.0));
        assert_eq!(series.get(3), Some(4.0));
    }

    #[test]
    fn rolling_mean_values() {
        let series = rolling_mean(&[2.0, 4.0, 6.0, 8.0], 2);
        assert_eq!(series.get(0), None);
        assert!((series.get(1).unwrap() - 3.0).abs() < f64::EPSILON);
        assert!((series.get(3).unwrap() - 7.0).abs() < f64::EPSILON);
    }

    #[test]
    fn window_longer_than_input_is_all_invalid() {
        let series = rolling_mean(&[1.0, 2.0], 5);
        assert_eq!(series.len(), 2);
        assert!(series.values.iter().all(|p| !p.valid));
    }

    #[test]
    fn zero_window_is_invalid() {
        let series = rolling_max(&[1.0, 2.0], 0);
        assert!(series.values.iter().all(|p| !p.valid));
    }

    #[test]
    fn lagged_max_excludes_current_bar() {
        let highs = [10.0, 11.0, 12.0, 20.0];
        let reference = rolling_max(&highs, 3).lagged(1);
        // at index 3 the reference only sees bars 0..=2
        assert_eq!(reference.get(3), Some(12.0));
    }

    #[test]
    fn indicator_types() {
        assert_eq!(rolling_max(&[], 252).indicator_type, IndicatorType::RollingMax(252));
        assert_eq!(rolling_min(&[], 20).indicator_type, IndicatorType::RollingMin(20));
        assert_eq!(rolling_mean(&[], 50).indicator_type, IndicatorType::RollingMean(50));
    }
}
