//! Open position and trade ledger entries.

use std::fmt;

use chrono::NaiveDate;

use super::signal::StrategyTag;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// A long holding. Quantity is always positive.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub quantity: i64,
    /// Fill price after slippage, before commission.
    pub entry_price: f64,
    pub entry_date: NaiveDate,
    pub entry_tag: StrategyTag,
}

impl Position {
    pub fn market_value(&self, price: f64) -> f64 {
        self.quantity as f64 * price
    }

    /// price / entry - 1
    pub fn return_at(&self, price: f64) -> f64 {
        price / self.entry_price - 1.0
    }
}

/// One executed fill.
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub date: NaiveDate,
    pub side: Side,
    /// Rule that raised the order. Exits are always `Stop`.
    pub tag: StrategyTag,
    /// Rule that opened the position this fill belongs to.
    pub entry_tag: StrategyTag,
    pub price: f64,
    pub quantity: i64,
    /// Exit price over entry price minus one; `None` on entries.
    pub realized_return: Option<f64>,
}

impl Trade {
    pub fn is_exit(&self) -> bool {
        self.side == Side::Sell
    }
}
