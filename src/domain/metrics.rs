//! Backtest summary statistics.

use super::portfolio::{EquityPoint, Portfolio};
use super::signal::StrategyTag;

/// Signal-funnel counters collected while the backtest runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SignalCounters {
    /// Breakout plans activated.
    pub signals_issued: usize,
    /// Entry fills.
    pub signals_triggered: usize,
    /// Confirmed breakouts rejected by the macro filter.
    pub macro_vetoes: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestStats {
    pub total_return: f64,
    /// Most negative equity / running peak - 1; 0 when equity never dips.
    pub max_drawdown: f64,
    pub macro_vetoes: usize,
    pub signals_issued: usize,
    pub signals_triggered: usize,
    pub breakout_trades: usize,
    pub reversal_trades: usize,
    pub round_trips: usize,
    pub win_rate: f64,
    pub final_equity: f64,
}

impl BacktestStats {
    pub fn compute(portfolio: &Portfolio, counters: &SignalCounters) -> Self {
        let initial_capital = portfolio.initial_capital;
        let final_equity = portfolio.final_equity();

        let total_return = if initial_capital > 0.0 {
            final_equity / initial_capital - 1.0
        } else {
            0.0
        };

        let entries = portfolio.trades.iter().filter(|t| !t.is_exit());
        let (mut breakout_trades, mut reversal_trades) = (0, 0);
        for trade in entries {
            match trade.entry_tag {
                StrategyTag::Breakout => breakout_trades += 1,
                StrategyTag::Reversal => reversal_trades += 1,
                StrategyTag::Stop => {}
            }
        }

        let exits: Vec<f64> = portfolio
            .trades
            .iter()
            .filter_map(|t| t.realized_return)
            .collect();
        let round_trips = exits.len();
        let win_rate = if round_trips > 0 {
            exits.iter().filter(|&&r| r > 0.0).count() as f64 / round_trips as f64
        } else {
            0.0
        };

        BacktestStats {
            total_return,
            max_drawdown: compute_drawdown(&portfolio.equity_curve),
            macro_vetoes: counters.macro_vetoes,
            signals_issued: counters.signals_issued,
            signals_triggered: counters.signals_triggered,
            breakout_trades,
            reversal_trades,
            round_trips,
            win_rate,
            final_equity,
        }
    }

    pub fn total_return_display(&self) -> String {
        format_percent(self.total_return)
    }

    pub fn max_drawdown_display(&self) -> String {
        format_percent(self.max_drawdown)
    }

    pub fn win_rate_display(&self) -> String {
        format_percent(self.win_rate)
    }

    pub fn final_equity_display(&self) -> String {
        format_currency(self.final_equity)
    }
}

fn compute_drawdown(equity_curve: &[EquityPoint]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;

    for point in equity_curve {
        if point.equity > peak {
            peak = point.equity;
        } else if peak > 0.0 {
            let dd = point.equity / peak - 1.0;
            if dd < max_dd {
                max_dd = dd;
            }
        }
    }

    max_dd
}

/// 0.1234 -> "12.34%"
pub fn format_percent(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

/// 1234567.8 -> "$1,234,568"
pub fn format_currency(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded < 0.0 {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::position::{Side, Trade};
    use chrono::NaiveDate;

    fn make_equity_curve(values: &[f64]) -> Vec<EquityPoint> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| EquityPoint {
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(i as i64),
                equity: v,
            })
            .collect()
    }

    fn make_trade(side: Side, entry_tag: StrategyTag, realized_return: Option<f64>) -> Trade {
        Trade {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            side,
            tag: if side == Side::Sell { StrategyTag::Stop } else { entry_tag },
            entry_tag,
            price: 100.0,
            quantity: 10,
            realized_return,
        }
    }

    fn make_portfolio(equity: &[f64], trades: Vec<Trade>) -> Portfolio {
        let mut portfolio = Portfolio::new(100_000.0);
        for trade in trades {
            portfolio.record_trade(trade);
        }
        for point in make_equity_curve(equity) {
            portfolio.record_equity(point.date, point.equity);
        }
        portfolio
    }

    #[test]
    fn empty_run_reports_initial_capital() {
        let stats = BacktestStats::compute(&make_portfolio(&[], vec![]), &SignalCounters::default());
        assert_eq!(stats.total_return, 0.0);
        assert_eq!(stats.max_drawdown, 0.0);
        assert_eq!(stats.final_equity, 100_000.0);
        assert_eq!(stats.round_trips, 0);
        assert_eq!(stats.win_rate, 0.0);
    }

    #[test]
    fn total_return_from_final_equity() {
        let portfolio = make_portfolio(&[100_000.0, 105_000.0, 110_000.0], vec![]);
        let stats = BacktestStats::compute(&portfolio, &SignalCounters::default());
        assert!((stats.total_return - 0.1).abs() < 1e-12);
        assert_eq!(stats.total_return_display(), "10.00%");
    }

    #[test]
    fn drawdown_is_negative_fraction_of_peak() {
        let curve = make_equity_curve(&[100.0, 120.0, 90.0, 130.0, 117.0]);
        // worst: 90 / 120 - 1 = -0.25
        assert!((compute_drawdown(&curve) + 0.25).abs() < 1e-12);
    }

    #[test]
    fn monotone_equity_has_no_drawdown() {
        let curve = make_equity_curve(&[100.0, 100.0, 101.0, 102.0]);
        assert_eq!(compute_drawdown(&curve), 0.0);
    }

    #[test]
    fn trade_breakdown_and_win_rate() {
        let trades = vec![
            make_trade(Side::Buy, StrategyTag::Breakout, None),
            make_trade(Side::Sell, StrategyTag::Breakout, Some(0.05)),
            make_trade(Side::Buy, StrategyTag::Reversal, None),
            make_trade(Side::Sell, StrategyTag::Reversal, Some(-0.02)),
            make_trade(Side::Buy, StrategyTag::Reversal, None),
        ];
        let counters = SignalCounters {
            signals_issued: 4,
            signals_triggered: 3,
            macro_vetoes: 2,
        };
        let stats = BacktestStats::compute(&make_portfolio(&[100_000.0], trades), &counters);
        assert_eq!(stats.breakout_trades, 1);
        assert_eq!(stats.reversal_trades, 2);
        assert_eq!(stats.round_trips, 2);
        assert!((stats.win_rate - 0.5).abs() < f64::EPSILON);
        assert_eq!(stats.signals_issued, 4);
        assert_eq!(stats.signals_triggered, 3);
        assert_eq!(stats.macro_vetoes, 2);
    }

    #[test]
    fn currency_formatting() {
        assert_eq!(format_currency(100_000.0), "$100,000");
        assert_eq!(format_currency(1_234_567.8), "$1,234,568");
        assert_eq!(format_currency(999.4), "$999");
        assert_eq!(format_currency(0.0), "$0");
        assert_eq!(format_currency(-2_500.0), "-$2,500");
    }

    #[test]
    fn percent_formatting() {
        assert_eq!(format_percent(-0.1234), "-12.34%");
        assert_eq!(format_percent(0.0), "0.00%");
    }
}
