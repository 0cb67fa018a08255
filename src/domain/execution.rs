//! Fill simulation at the next bar's open.
//!
//! Entries and exits apply slippage to the open, then commission to the
//! notional. Sizing spends at most `max_position_fraction` of cash, whole
//! shares only, commission included.

use chrono::NaiveDate;

use super::portfolio::Portfolio;
use super::position::{Position, Side, Trade};
use super::signal::StrategyTag;

/// Cost and sizing parameters. Percentages are in percent (0.1 = 0.1%).
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionConfig {
    pub commission_pct: f64,
    pub slippage_pct: f64,
    pub max_position_fraction: f64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        ExecutionConfig {
            commission_pct: 0.1,
            slippage_pct: 0.05,
            max_position_fraction: 0.7,
        }
    }
}

impl ExecutionConfig {
    fn commission_rate(&self) -> f64 {
        self.commission_pct / 100.0
    }
}

/// trade_value * pct / 100
pub fn calculate_commission(trade_value: f64, config: &ExecutionConfig) -> f64 {
    trade_value * config.commission_rate()
}

/// Buy fills above the market: price * (1 + slippage_pct / 100)
pub fn apply_slippage_buy(market_price: f64, slippage_pct: f64) -> f64 {
    market_price * (1.0 + slippage_pct / 100.0)
}

/// Sell fills below the market: price * (1 - slippage_pct / 100)
pub fn apply_slippage_sell(market_price: f64, slippage_pct: f64) -> f64 {
    market_price * (1.0 - slippage_pct / 100.0)
}

/// Whole shares affordable with the allowed fraction of `cash`, commission included.
pub fn position_quantity(cash: f64, execution_price: f64, config: &ExecutionConfig) -> i64 {
    if cash <= 0.0 || execution_price <= 0.0 {
        return 0;
    }
    let budget = cash * config.max_position_fraction;
    (budget / (execution_price * (1.0 + config.commission_rate()))).floor() as i64
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntryResult {
    Entered {
        quantity: i64,
        execution_price: f64,
        cost: f64,
        commission: f64,
    },
    InsufficientCapital,
    AlreadyHolding,
}

/// Buy at `market_price` (the open) and record the holding and fill.
pub fn enter_long(
    portfolio: &mut Portfolio,
    market_price: f64,
    date: NaiveDate,
    tag: StrategyTag,
    config: &ExecutionConfig,
) -> EntryResult {
    if portfolio.has_position() {
        return EntryResult::AlreadyHolding;
    }

    let execution_price = apply_slippage_buy(market_price, config.slippage_pct);
    let quantity = position_quantity(portfolio.cash, execution_price, config);
    if quantity <= 0 {
        return EntryResult::InsufficientCapital;
    }

    let cost = quantity as f64 * execution_price;
    let commission = calculate_commission(cost, config);
    let total_cost = cost + commission;

    if total_cost > portfolio.cash {
        return EntryResult::InsufficientCapital;
    }

    portfolio.cash -= total_cost;
    portfolio.open_position(Position {
        quantity,
        entry_price: execution_price,
        entry_date: date,
        entry_tag: tag,
    });
    portfolio.record_trade(Trade {
        date,
        side: Side::Buy,
        tag,
        entry_tag: tag,
        price: execution_price,
        quantity,
        realized_return: None,
    });

    EntryResult::Entered {
        quantity,
        execution_price,
        cost,
        commission,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExitResult {
    pub quantity: i64,
    pub exit_price: f64,
    pub proceeds: f64,
    pub commission: f64,
    /// exit_price / entry_price - 1, before commissions.
    pub realized_return: f64,
    pub entry_tag: StrategyTag,
}

/// Sell the whole holding at `market_price` (the open). `None` when flat.
pub fn exit_position(
    portfolio: &mut Portfolio,
    market_price: f64,
    date: NaiveDate,
    config: &ExecutionConfig,
) -> Option<ExitResult> {
    let position = portfolio.take_position()?;

    let exit_price = apply_slippage_sell(market_price, config.slippage_pct);
    let exit_value = position.quantity as f64 * exit_price;
    let commission = calculate_commission(exit_value, config);
    let proceeds = exit_value - commission;
    let realized_return = position.return_at(exit_price);

    portfolio.cash += proceeds;
    portfolio.record_trade(Trade {
        date,
        side: Side::Sell,
        tag: StrategyTag::Stop,
        entry_tag: position.entry_tag,
        price: exit_price,
        quantity: position.quantity,
        realized_return: Some(realized_return),
    });

    Some(ExitResult {
        quantity: position.quantity,
        exit_price,
        proceeds,
        commission,
        realized_return,
        entry_tag: position.entry_tag,
    })
}
