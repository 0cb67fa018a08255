//! Backtest state machine.
//!
//! One step per bar, two phases:
//! - open: fill orders raised at the previous close, mark equity, tick cooldown
//! - close: raise the exit or entry order for the next open
//!
//! Evaluation starts at bar [`WARMUP_BARS`] so the 252-bar high reference is
//! populated. An open position at the end is marked, not closed.

use chrono::NaiveDate;

use super::error::SmartstockError;
use super::execution::{EntryResult, ExecutionConfig, enter_long, exit_position};
use super::levels::{DailyLevels, MultiTimeframe};
use super::metrics::{BacktestStats, SignalCounters};
use super::ohlcv::BarSeries;
use super::portfolio::{EquityPoint, Portfolio};
use super::position::{Side, Trade};
use super::indicator::momentum::crossed_above_zero;
use super::signal::{StrategyTag, is_confirmed_breakout};
use super::timeframe::PeriodPolicy;

/// First evaluated bar.
pub const WARMUP_BARS: usize = 252;
pub const MIN_HISTORY_BARS: usize = 260;
/// A plan starts once close is within 3% of the high reference.
pub const PLAN_PROXIMITY: f64 = 0.97;

pub const DEFAULT_INITIAL_CAPITAL: f64 = 100_000.0;
pub const DEFAULT_COOLDOWN_BARS: usize = 10;
pub const DEFAULT_PLAN_TTL_BARS: usize = 15;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_capital: f64,
    pub execution: ExecutionConfig,
    pub cooldown_bars: usize,
    pub plan_ttl_bars: usize,
}

impl BacktestConfig {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        BacktestConfig {
            start_date,
            end_date,
            initial_capital: DEFAULT_INITIAL_CAPITAL,
            execution: ExecutionConfig::default(),
            cooldown_bars: DEFAULT_COOLDOWN_BARS,
            plan_ttl_bars: DEFAULT_PLAN_TTL_BARS,
        }
    }
}

/// Order raised at a close, filled at the next open.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingOrder {
    pub side: Side,
    pub tag: StrategyTag,
    pub issued_at: NaiveDate,
}

/// Watching for a confirmed breakout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakoutPlan {
    pub age: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Flat,
    Planning,
    PendingEntry,
    Holding,
    PendingExit,
    Cooldown,
}

/// Daily bars with their levels and the macro flags on the daily index.
#[derive(Debug, Clone)]
pub struct BacktestInputs<'a> {
    pub series: &'a BarSeries,
    pub levels: DailyLevels,
    pub weekly_bullish: Vec<bool>,
    pub monthly_bullish: Vec<bool>,
}

impl<'a> BacktestInputs<'a> {
    /// Inputs with caller-supplied macro flags, one per daily bar.
    pub fn new(
        series: &'a BarSeries,
        weekly_bullish: Vec<bool>,
        monthly_bullish: Vec<bool>,
    ) -> Result<Self, SmartstockError> {
        if weekly_bullish.len() != series.len() || monthly_bullish.len() != series.len() {
            return Err(SmartstockError::AnalysisFailed {
                reason: format!(
                    "macro flags cover {}/{} bars, series has {}",
                    weekly_bullish.len(),
                    monthly_bullish.len(),
                    series.len()
                ),
            });
        }
        Ok(BacktestInputs {
            series,
            levels: DailyLevels::compute(&series.bars),
            weekly_bullish,
            monthly_bullish,
        })
    }

    /// Inputs with weekly/monthly flags forward-filled from the resampled views.
    pub fn from_multi_timeframe(mtf: &'a MultiTimeframe) -> Self {
        let regime = mtf.macro_regime();
        let (weekly_bullish, monthly_bullish) = mtf.synced_macro(&regime);
        BacktestInputs {
            series: &mtf.daily,
            levels: DailyLevels::compute(&mtf.daily.bars),
            weekly_bullish,
            monthly_bullish,
        }
    }

    fn macro_pass(&self, index: usize) -> bool {
        self.weekly_bullish[index] && self.monthly_bullish[index]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub symbol: String,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
    pub stats: BacktestStats,
    pub final_state: EngineState,
}

struct Engine<'c> {
    config: &'c BacktestConfig,
    portfolio: Portfolio,
    pending_buy: Option<PendingOrder>,
    pending_sell: Option<PendingOrder>,
    plan: Option<BreakoutPlan>,
    cooldown: usize,
    counters: SignalCounters,
}

impl<'c> Engine<'c> {
    fn new(config: &'c BacktestConfig) -> Self {
        Engine {
            config,
            portfolio: Portfolio::new(config.initial_capital),
            pending_buy: None,
            pending_sell: None,
            plan: None,
            cooldown: 0,
            counters: SignalCounters::default(),
        }
    }

    fn state(&self) -> EngineState {
        match (&self.portfolio.position, self.pending_sell, self.pending_buy) {
            (Some(_), Some(_), _) => EngineState::PendingExit,
            (Some(_), None, _) => EngineState::Holding,
            (None, _, Some(_)) => EngineState::PendingEntry,
            (None, _, None) if self.cooldown > 0 => EngineState::Cooldown,
            (None, _, None) if self.plan.is_some() => EngineState::Planning,
            _ => EngineState::Flat,
        }
    }

    fn step(&mut self, index: usize, inputs: &BacktestInputs<'_>) {
        self.execute_at_open(index, inputs);
        self.decide_at_close(index, inputs);
    }

    fn execute_at_open(&mut self, index: usize, inputs: &BacktestInputs<'_>) {
        let bar = &inputs.series.bars[index];
        let execution = &self.config.execution;

        if self.pending_sell.take().is_some() {
            if let Some(exit) = exit_position(&mut self.portfolio, bar.open, bar.date, execution) {
                tracing::debug!(
                    date = %bar.date,
                    price = exit.exit_price,
                    quantity = exit.quantity,
                    realized_return = exit.realized_return,
                    "sell filled"
                );
                self.cooldown = self.config.cooldown_bars;
                self.plan = None;
            }
        }

        if let Some(order) = self.pending_buy.take() {
            match enter_long(&mut self.portfolio, bar.open, bar.date, order.tag, execution) {
                EntryResult::Entered {
                    quantity,
                    execution_price,
                    ..
                } => {
                    tracing::debug!(
                        date = %bar.date,
                        tag = %order.tag,
                        price = execution_price,
                        quantity,
                        "buy filled"
                    );
                    self.counters.signals_triggered += 1;
                    self.plan = None;
                }
                EntryResult::InsufficientCapital => {
                    tracing::warn!(date = %bar.date, cash = self.portfolio.cash, "buy dropped: insufficient capital");
                }
                EntryResult::AlreadyHolding => {}
            }
        }

        let equity = self.portfolio.total_equity(bar.close);
        self.portfolio.record_equity(bar.date, equity);
        self.cooldown = self.cooldown.saturating_sub(1);
    }

    fn decide_at_close(&mut self, index: usize, inputs: &BacktestInputs<'_>) {
        let bar = &inputs.series.bars[index];
        let levels = &inputs.levels;

        if self.portfolio.has_position() {
            let broke_support = levels
                .levels
                .support_ref
                .get(index)
                .is_some_and(|support| bar.close < support);
            if self.pending_sell.is_none() && broke_support {
                tracing::debug!(date = %bar.date, close = bar.close, "exit raised: broke support");
                self.pending_sell = Some(PendingOrder {
                    side: Side::Sell,
                    tag: StrategyTag::Stop,
                    issued_at: bar.date,
                });
            }
            return;
        }

        if self.pending_buy.is_some() || self.cooldown > 0 {
            return;
        }

        let macro_pass = inputs.macro_pass(index);
        let trend_mid = levels.trend_mid.get(index);

        if let Some(high_ref) = levels.levels.high_ref.get(index) {
            if self.plan.is_none() && bar.close > PLAN_PROXIMITY * high_ref {
                tracing::debug!(date = %bar.date, high_ref, "breakout plan activated");
                self.plan = Some(BreakoutPlan { age: 0 });
                self.counters.signals_issued += 1;
            }

            if let Some(plan) = self.plan.as_mut() {
                plan.age += 1;
                let age = plan.age;
                let fuel = levels.volume_ratio(&inputs.series.bars, index);
                let push = bar.close_position();

                if is_confirmed_breakout(bar.close, high_ref, push, fuel) {
                    self.plan = None;
                    if macro_pass {
                        tracing::debug!(date = %bar.date, fuel, push, "entry raised: breakout");
                        self.pending_buy = Some(PendingOrder {
                            side: Side::Buy,
                            tag: StrategyTag::Breakout,
                            issued_at: bar.date,
                        });
                    } else {
                        tracing::debug!(date = %bar.date, "breakout vetoed by macro regime");
                        self.counters.macro_vetoes += 1;
                    }
                } else if age > self.config.plan_ttl_bars
                    || trend_mid.is_some_and(|ma| bar.close < ma)
                {
                    tracing::debug!(date = %bar.date, age, "breakout plan abandoned");
                    self.plan = None;
                }
            }
        }

        let momentum = &levels.levels.momentum_short;
        let reversal =
            trend_mid.is_some_and(|ma| bar.close > ma) && crossed_above_zero(momentum, index);
        if self.pending_buy.is_none() && macro_pass && reversal {
            tracing::debug!(date = %bar.date, "entry raised: momentum reversal");
            self.pending_buy = Some(PendingOrder {
                side: Side::Buy,
                tag: StrategyTag::Reversal,
                issued_at: bar.date,
            });
        }
    }
}

/// Replay `inputs` from bar [`WARMUP_BARS`] to the end.
pub fn simulate(
    inputs: &BacktestInputs<'_>,
    config: &BacktestConfig,
) -> Result<BacktestResult, SmartstockError> {
    inputs.series.require(MIN_HISTORY_BARS)?;

    let mut engine = Engine::new(config);
    let mut state = engine.state();

    for index in WARMUP_BARS..inputs.series.len() {
        engine.step(index, inputs);
        let next = engine.state();
        if next != state {
            tracing::debug!(
                date = %inputs.series.bars[index].date,
                from = ?state,
                to = ?next,
                "state transition"
            );
            state = next;
        }
    }

    if let Some(point) = engine
        .portfolio
        .equity_curve
        .iter()
        .find(|p| !p.equity.is_finite())
    {
        return Err(SmartstockError::AnalysisFailed {
            reason: format!("equity became non-finite on {}", point.date),
        });
    }

    let stats = BacktestStats::compute(&engine.portfolio, &engine.counters);
    tracing::info!(
        symbol = %inputs.series.symbol,
        trades = engine.portfolio.trades.len(),
        total_return = stats.total_return,
        max_drawdown = stats.max_drawdown,
        "backtest complete"
    );

    let final_state = engine.state();
    let Portfolio {
        trades,
        equity_curve,
        ..
    } = engine.portfolio;

    Ok(BacktestResult {
        symbol: inputs.series.symbol.clone(),
        trades,
        equity_curve,
        stats,
        final_state,
    })
}

/// Derive weekly/monthly views from `daily`, then replay it.
pub fn run_backtest(
    daily: BarSeries,
    config: &BacktestConfig,
    policy: &PeriodPolicy,
) -> Result<BacktestResult, SmartstockError> {
    daily.require(MIN_HISTORY_BARS)?;
    let mtf = MultiTimeframe::from_daily(daily, policy)?;
    mtf.weekly.require(1)?;
    mtf.monthly.require(1)?;

    let inputs = BacktestInputs::from_multi_timeframe(&mtf);
    simulate(&inputs, config)
}
