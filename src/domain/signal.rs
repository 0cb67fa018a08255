//! End-of-day decision tree.
//!
//! Rules are evaluated in priority order, first match wins:
//! 1. close < support reference              -> SELL (broke support)
//! 2. weekly and monthly macro not both pass -> WAIT (macro veto)
//! 3. close > high reference                 -> BUY if fuel > 1.2 and push > 0.7, else WAIT (weak breakout)
//! 4. gap < 1% and fuel < 1.0                -> WAIT (absorbing)
//! 5. short BX crosses above 0, close > MA50 -> BUY (reversal)
//! 6. otherwise                              -> WAIT (normal consolidation)
//!
//! Fuel is the volume ratio, push the close position in the bar's range,
//! gap the distance below the high reference as a fraction of it.

use std::fmt;

use crate::domain::ohlcv::OhlcvBar;

pub const BREAKOUT_VOLUME_RATIO: f64 = 1.2;
pub const BREAKOUT_CLOSE_POSITION: f64 = 0.7;
pub const ABSORPTION_GAP: f64 = 0.01;
pub const ABSORPTION_VOLUME_RATIO: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Buy,
    Sell,
    Wait,
}

/// Which rule produced an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyTag {
    Breakout,
    Reversal,
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    BrokeSupport,
    MacroVeto { weekly: bool, monthly: bool },
    StrongBreakout,
    WeakBreakout,
    Absorbing,
    MomentumReversal,
    NormalConsolidation,
}

impl Reason {
    pub fn tag(&self) -> Option<StrategyTag> {
        match self {
            Reason::BrokeSupport => Some(StrategyTag::Stop),
            Reason::StrongBreakout => Some(StrategyTag::Breakout),
            Reason::MomentumReversal => Some(StrategyTag::Reversal),
            _ => None,
        }
    }
}

fn pass_fail(pass: bool) -> &'static str {
    if pass { "PASS" } else { "FAIL" }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Buy => write!(f, "BUY"),
            Action::Sell => write!(f, "SELL"),
            Action::Wait => write!(f, "WAIT"),
        }
    }
}

impl fmt::Display for StrategyTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyTag::Breakout => write!(f, "BREAKOUT"),
            StrategyTag::Reversal => write!(f, "REVERSAL"),
            StrategyTag::Stop => write!(f, "STOP"),
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reason::BrokeSupport => write!(f, "broke support"),
            Reason::MacroVeto { weekly, monthly } => write!(
                f,
                "macro veto (W:{}, M:{})",
                pass_fail(*weekly),
                pass_fail(*monthly)
            ),
            Reason::StrongBreakout => write!(f, "strong breakout"),
            Reason::WeakBreakout => write!(
                f,
                "weak breakout: price above high but insufficient volume/close-strength"
            ),
            Reason::Absorbing => write!(f, "absorbing: low volume near high"),
            Reason::MomentumReversal => write!(f, "momentum reversal"),
            Reason::NormalConsolidation => write!(f, "normal consolidation"),
        }
    }
}

/// Everything the decision tree reads for one bar.
#[derive(Debug, Clone)]
pub struct DecisionInput<'a> {
    pub bar: &'a OhlcvBar,
    pub high_ref: f64,
    pub support_ref: f64,
    pub trend_mid: f64,
    pub volume_ratio: f64,
    pub momentum_prev: Option<f64>,
    pub momentum_now: Option<f64>,
    pub weekly_bullish: bool,
    pub monthly_bullish: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalMetrics {
    /// Volume ratio.
    pub fuel: f64,
    /// Close position in range.
    pub push: f64,
    /// Distance below the high reference, as a fraction.
    pub gap: f64,
    /// Support level.
    pub stop: f64,
    pub weekly_pass: bool,
    pub monthly_pass: bool,
}

impl SignalMetrics {
    pub fn macro_pass(&self) -> bool {
        self.weekly_pass && self.monthly_pass
    }

    pub fn fuel_display(&self) -> String {
        format!("{:.2}x", self.fuel)
    }

    pub fn push_display(&self) -> String {
        format!("{:.1}%", self.push * 100.0)
    }

    pub fn gap_display(&self) -> String {
        format!("{:.2}%", self.gap * 100.0)
    }

    pub fn stop_display(&self) -> String {
        format!("{:.2}", self.stop)
    }

    pub fn macro_display(&self) -> &'static str {
        pass_fail(self.macro_pass())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub action: Action,
    pub reason: Reason,
    pub metrics: SignalMetrics,
}

impl Recommendation {
    pub fn tag(&self) -> Option<StrategyTag> {
        self.reason.tag()
    }
}

/// Breakout confirmation shared by the EOD tree and the backtest plan.
pub fn is_confirmed_breakout(close: f64, high_ref: f64, push: f64, fuel: f64) -> bool {
    close > high_ref && push > BREAKOUT_CLOSE_POSITION && fuel > BREAKOUT_VOLUME_RATIO
}

/// Short momentum crossing from <= 0 to > 0 while above the mid-term trend.
pub fn is_reversal(close: f64, trend_mid: f64, prev: Option<f64>, now: Option<f64>) -> bool {
    match (prev, now) {
        (Some(prev), Some(now)) => prev <= 0.0 && now > 0.0 && close > trend_mid,
        _ => false,
    }
}

pub fn gap_to_high(close: f64, high_ref: f64) -> f64 {
    (high_ref - close) / high_ref
}

pub fn decide(input: &DecisionInput<'_>) -> Recommendation {
    let close = input.bar.close;
    let metrics = SignalMetrics {
        fuel: input.volume_ratio,
        push: input.bar.close_position(),
        gap: gap_to_high(close, input.high_ref),
        stop: input.support_ref,
        weekly_pass: input.weekly_bullish,
        monthly_pass: input.monthly_bullish,
    };

    let (action, reason) = if close < input.support_ref {
        (Action::Sell, Reason::BrokeSupport)
    } else if !metrics.macro_pass() {
        (
            Action::Wait,
            Reason::MacroVeto {
                weekly: metrics.weekly_pass,
                monthly: metrics.monthly_pass,
            },
        )
    } else if close > input.high_ref {
        if is_confirmed_breakout(close, input.high_ref, metrics.push, metrics.fuel) {
            (Action::Buy, Reason::StrongBreakout)
        } else {
            (Action::Wait, Reason::WeakBreakout)
        }
    } else if metrics.gap < ABSORPTION_GAP && metrics.fuel < ABSORPTION_VOLUME_RATIO {
        (Action::Wait, Reason::Absorbing)
    } else if is_reversal(close, input.trend_mid, input.momentum_prev, input.momentum_now) {
        (Action::Buy, Reason::MomentumReversal)
    } else {
        (Action::Wait, Reason::NormalConsolidation)
    };

    Recommendation {
        action,
        reason,
        metrics,
    }
}
