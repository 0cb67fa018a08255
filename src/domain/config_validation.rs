//! Configuration validation.
//!
//! Runs before any data is fetched. Missing optional keys fall back to their
//! defaults; only present-but-invalid values and missing required keys fail.

use crate::domain::backtest::MIN_HISTORY_BARS;
use crate::domain::error::SmartstockError;
use crate::domain::timeframe::PeriodPolicy;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), SmartstockError> {
    validate_data_config(config)?;
    validate_symbol(config, "backtest")?;
    validate_initial_capital(config)?;
    validate_costs(config)?;
    validate_position_fraction(config)?;
    validate_bar_counts(config)?;
    validate_dates(config)?;
    validate_resample(config)?;
    Ok(())
}

pub fn validate_eod_config(config: &dyn ConfigPort) -> Result<(), SmartstockError> {
    validate_data_config(config)?;
    validate_symbol(config, "eod")?;
    let lookback = config.get_int("eod", "lookback_bars", 2520);
    if lookback < MIN_HISTORY_BARS as i64 {
        return Err(SmartstockError::ConfigInvalid {
            section: "eod".to_string(),
            key: "lookback_bars".to_string(),
            reason: format!("lookback_bars must be at least {MIN_HISTORY_BARS}"),
        });
    }
    validate_resample(config)?;
    Ok(())
}

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), SmartstockError> {
    match config.get_string("data", "dir") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(SmartstockError::ConfigMissing {
            section: "data".to_string(),
            key: "dir".to_string(),
        }),
    }
}

fn validate_symbol(config: &dyn ConfigPort, section: &str) -> Result<(), SmartstockError> {
    match config.get_string(section, "symbol") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(SmartstockError::ConfigMissing {
            section: section.to_string(),
            key: "symbol".to_string(),
        }),
    }
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), SmartstockError> {
    let value = config.get_double("backtest", "initial_capital", 100_000.0);
    if value <= 0.0 || !value.is_finite() {
        return Err(SmartstockError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "initial_capital".to_string(),
            reason: "initial_capital must be positive".to_string(),
        });
    }
    Ok(())
}

fn validate_costs(config: &dyn ConfigPort) -> Result<(), SmartstockError> {
    for key in ["commission_pct", "slippage_pct"] {
        let value = config.get_double("backtest", key, 0.0);
        if !(0.0..100.0).contains(&value) {
            return Err(SmartstockError::ConfigInvalid {
                section: "backtest".to_string(),
                key: key.to_string(),
                reason: format!("{key} must be in [0, 100)"),
            });
        }
    }
    Ok(())
}

fn validate_position_fraction(config: &dyn ConfigPort) -> Result<(), SmartstockError> {
    let value = config.get_double("backtest", "max_position_fraction", 0.7);
    if value <= 0.0 || value > 1.0 {
        return Err(SmartstockError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "max_position_fraction".to_string(),
            reason: "max_position_fraction must be between 0 and 1".to_string(),
        });
    }
    Ok(())
}

fn validate_bar_counts(config: &dyn ConfigPort) -> Result<(), SmartstockError> {
    if config.get_int("backtest", "cooldown_bars", 10) < 0 {
        return Err(SmartstockError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "cooldown_bars".to_string(),
            reason: "cooldown_bars must be non-negative".to_string(),
        });
    }
    if config.get_int("backtest", "plan_ttl_bars", 15) < 1 {
        return Err(SmartstockError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "plan_ttl_bars".to_string(),
            reason: "plan_ttl_bars must be at least 1".to_string(),
        });
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), SmartstockError> {
    let start_str = config.get_string("backtest", "start_date");
    let end_str = config.get_string("backtest", "end_date");

    let start_date = parse_date(start_str.as_deref(), "start_date")?;
    let end_date = parse_date(end_str.as_deref(), "end_date")?;

    if start_date >= end_date {
        return Err(SmartstockError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "start_date".to_string(),
            reason: "start_date must be before end_date".to_string(),
        });
    }
    Ok(())
}

pub fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, SmartstockError> {
    match value {
        None => Err(SmartstockError::ConfigMissing {
            section: "backtest".to_string(),
            key: field.to_string(),
        }),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            SmartstockError::ConfigInvalid {
                section: "backtest".to_string(),
                key: field.to_string(),
                reason: format!("invalid {} format, expected YYYY-MM-DD", field),
            }
        }),
    }
}

fn validate_resample(config: &dyn ConfigPort) -> Result<(), SmartstockError> {
    match config.get_string("resample", "week_ends_on") {
        None => Ok(()),
        Some(s) if PeriodPolicy::parse_week_end(&s).is_some() => Ok(()),
        Some(s) => Err(SmartstockError::ConfigInvalid {
            section: "resample".to_string(),
            key: "week_ends_on".to_string(),
            reason: format!("unknown week end '{s}', expected a weekday such as sun or fri"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MockConfig {
        values: HashMap<(String, String), String>,
    }

    impl MockConfig {
        fn new() -> Self {
            Self {
                values: HashMap::new(),
            }
        }

        fn set(&mut self, section: &str, key: &str, value: &str) {
            self.values
                .insert((section.to_string(), key.to_string()), value.to_string());
        }

        fn valid_backtest() -> Self {
            let mut c = Self::new();
            c.set("data", "dir", "/tmp/data");
            c.set("backtest", "symbol", "SPY");
            c.set("backtest", "start_date", "2015-01-01");
            c.set("backtest", "end_date", "2024-12-31");
            c.set("backtest", "initial_capital", "100000");
            c.set("backtest", "commission_pct", "0.1");
            c.set("backtest", "slippage_pct", "0.05");
            c
        }

        fn valid_eod() -> Self {
            let mut c = Self::new();
            c.set("data", "dir", "/tmp/data");
            c.set("eod", "symbol", "SPY");
            c
        }
    }

    impl ConfigPort for MockConfig {
        fn get_string(&self, section: &str, key: &str) -> Option<String> {
            self.values
                .get(&(section.to_string(), key.to_string()))
                .cloned()
        }

        fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
            self.get_string(section, key)
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        }

        fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
            self.get_string(section, key)
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        }
    }

    fn assert_invalid(result: Result<(), SmartstockError>, expected_key: &str) {
        match result {
            Err(SmartstockError::ConfigInvalid { key, .. }) => assert_eq!(key, expected_key),
            other => panic!("expected ConfigInvalid for {expected_key}, got {other:?}"),
        }
    }

    fn assert_missing(result: Result<(), SmartstockError>, expected_key: &str) {
        match result {
            Err(SmartstockError::ConfigMissing { key, .. }) => assert_eq!(key, expected_key),
            other => panic!("expected ConfigMissing for {expected_key}, got {other:?}"),
        }
    }

    #[test]
    fn valid_backtest_config_passes() {
        assert!(validate_backtest_config(&MockConfig::valid_backtest()).is_ok());
    }

    #[test]
    fn defaults_fill_optional_keys() {
        let mut c = MockConfig::new();
        c.set("data", "dir", "data");
        c.set("backtest", "symbol", "SPY");
        c.set("backtest", "start_date", "2015-01-01");
        c.set("backtest", "end_date", "2024-12-31");
        assert!(validate_backtest_config(&c).is_ok());
    }

    #[test]
    fn missing_data_dir() {
        let mut c = MockConfig::valid_backtest();
        c.values.remove(&("data".to_string(), "dir".to_string()));
        assert_missing(validate_backtest_config(&c), "dir");
    }

    #[test]
    fn blank_symbol_is_missing() {
        let mut c = MockConfig::valid_backtest();
        c.set("backtest", "symbol", "   ");
        assert_missing(validate_backtest_config(&c), "symbol");
    }

    #[test]
    fn zero_capital_rejected() {
        let mut c = MockConfig::valid_backtest();
        c.set("backtest", "initial_capital", "0");
        assert_invalid(validate_backtest_config(&c), "initial_capital");
    }

    #[test]
    fn negative_costs_rejected() {
        let mut c = MockConfig::valid_backtest();
        c.set("backtest", "commission_pct", "-0.1");
        assert_invalid(validate_backtest_config(&c), "commission_pct");

        let mut c = MockConfig::valid_backtest();
        c.set("backtest", "slippage_pct", "-1");
        assert_invalid(validate_backtest_config(&c), "slippage_pct");
    }

    #[test]
    fn position_fraction_bounds() {
        let mut c = MockConfig::valid_backtest();
        c.set("backtest", "max_position_fraction", "1.5");
        assert_invalid(validate_backtest_config(&c), "max_position_fraction");

        c.set("backtest", "max_position_fraction", "1.0");
        assert!(validate_backtest_config(&c).is_ok());
    }

    #[test]
    fn plan_ttl_must_be_positive() {
        let mut c = MockConfig::valid_backtest();
        c.set("backtest", "plan_ttl_bars", "0");
        assert_invalid(validate_backtest_config(&c), "plan_ttl_bars");
    }

    #[test]
    fn start_after_end_rejected() {
        let mut c = MockConfig::valid_backtest();
        c.set("backtest", "start_date", "2025-01-01");
        assert_invalid(validate_backtest_config(&c), "start_date");
    }

    #[test]
    fn bad_date_format_rejected() {
        let mut c = MockConfig::valid_backtest();
        c.set("backtest", "end_date", "31/12/2024");
        assert_invalid(validate_backtest_config(&c), "end_date");
    }

    #[test]
    fn unknown_week_end_rejected() {
        let mut c = MockConfig::valid_backtest();
        c.set("resample", "week_ends_on", "someday");
        assert_invalid(validate_backtest_config(&c), "week_ends_on");

        c.set("resample", "week_ends_on", "fri");
        assert!(validate_backtest_config(&c).is_ok());
    }

    #[test]
    fn eod_config_checks_lookback() {
        let mut c = MockConfig::valid_eod();
        assert!(validate_eod_config(&c).is_ok());

        c.set("eod", "lookback_bars", "100");
        assert_invalid(validate_eod_config(&c), "lookback_bars");
    }

    #[test]
    fn eod_requires_symbol() {
        let mut c = MockConfig::new();
        c.set("data", "dir", "data");
        assert_missing(validate_eod_config(&c), "symbol");
    }
}
