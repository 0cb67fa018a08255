//! Technical indicator implementations.
//!
//! This module provides types for representing indicator values and series:
//! - `IndicatorPoint`: A single point in an indicator time series
//! - `IndicatorType`: Enum for indicator identity + parameters
//! - `IndicatorSeries`: A series aligned index-for-index with its input
//!
//! All calculations are pure functions of a price (or volume) sequence.

pub mod ema;
pub mod momentum;
pub mod rolling;
pub mod rsi;

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorPoint {
    pub valid: bool,
    pub value: f64,
}

impl IndicatorPoint {
    pub fn invalid() -> Self {
        IndicatorPoint {
            valid: false,
            value: 0.0,
        }
    }

    pub fn valid(value: f64) -> Self {
        IndicatorPoint { valid: true, value }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Ema(usize),
    WilderRsi(usize),
    Momentum { rsi_period: usize, smooth_span: usize },
    RollingMax(usize),
    RollingMin(usize),
    RollingMean(usize),
    Lagged { inner: Box<IndicatorType>, bars: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at `index`, `None` while still warming up or out of bounds.
    pub fn get(&self, index: usize) -> Option<f64> {
        self.values
            .get(index)
            .filter(|p| p.valid)
            .map(|p| p.value)
    }

    pub fn last(&self) -> Option<f64> {
        self.values.len().checked_sub(1).and_then(|i| self.get(i))
    }

    /// Shift the series forward by `bars`, so index `i` holds the value that
    /// was at `i - bars`. The first `bars` points become invalid.
    pub fn lagged(&self, bars: usize) -> IndicatorSeries {
        let values = (0..self.values.len())
            .map(|i| {
                if i < bars {
                    IndicatorPoint::invalid()
                } else {
                    self.values[i - bars]
                }
            })
            .collect();
        IndicatorSeries {
            indicator_type: IndicatorType::Lagged {
                inner: Box::new(self.indicator_type.clone()),
                bars,
            },
            values,
        }
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Ema(span) => write!(f, "EMA({})", span),
            IndicatorType::WilderRsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Momentum {
                rsi_period,
                smooth_span,
            } => write!(f, "BX({},{})", rsi_period, smooth_span),
            IndicatorType::RollingMax(window) => write!(f, "MAX({})", window),
            IndicatorType::RollingMin(window) => write!(f, "MIN({})", window),
            IndicatorType::RollingMean(window) => write!(f, "MA({})", window),
            IndicatorType::Lagged { inner, bars } => write!(f, "{}[-{}]", inner, bars),
        }
    }
}
