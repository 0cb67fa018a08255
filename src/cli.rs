//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::prelude::*;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{self as backtest_engine, BacktestConfig, BacktestResult};
use crate::domain::config_validation::{
    parse_date, validate_backtest_config, validate_data_config, validate_eod_config,
};
use crate::domain::eod::{self, EodReport};
use crate::domain::error::SmartstockError;
use crate::domain::execution::ExecutionConfig;
use crate::domain::ohlcv::BarSeries;
use crate::domain::timeframe::{PeriodPolicy, Timeframe};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "smartstock", about = "Multi-timeframe breakout/reversal signals and backtester")]
pub struct Cli {
    /// Log state-machine transitions and data loading
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Recommend an action for the latest daily bar
    Eod {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
    },
    /// Replay the signal rules over history
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
        /// Directory for trades.csv and equity.csv
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List symbols available in the data directory
    ListSymbols {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    init_tracing(cli.verbose);
    match cli.command {
        Command::Eod { config, symbol } => run_eod(&config, symbol.as_deref()),
        Command::Backtest {
            config,
            symbol,
            start,
            end,
            output,
        } => run_backtest(
            &config,
            symbol.as_deref(),
            start.as_deref(),
            end.as_deref(),
            output.as_ref(),
        ),
        Command::ListSymbols { config } => run_list_symbols(&config),
    }
}

/// stderr fmt layer; INFO by default, DEBUG for this crate with `verbose`.
pub fn init_tracing(verbose: bool) {
    let crate_level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(
            tracing_subscriber::filter::Targets::new()
                .with_target("smartstock", crate_level)
                .with_default(tracing::Level::WARN),
        );
    // a second init (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::registry().with(fmt_layer).try_init();
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = SmartstockError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn fail(err: &SmartstockError) -> ExitCode {
    if err.is_insufficient_data() {
        eprintln!("error: {err}; no recommendation or equity curve produced");
    } else {
        eprintln!("error: {err}");
    }
    err.into()
}

pub fn build_period_policy(config: &dyn ConfigPort) -> PeriodPolicy {
    config
        .get_string("resample", "week_ends_on")
        .and_then(|s| PeriodPolicy::parse_week_end(&s))
        .map(|week_ends_on| PeriodPolicy { week_ends_on })
        .unwrap_or_default()
}

pub fn build_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, SmartstockError> {
    let start_date = parse_date(config.get_string("backtest", "start_date").as_deref(), "start_date")?;
    let end_date = parse_date(config.get_string("backtest", "end_date").as_deref(), "end_date")?;

    let defaults = ExecutionConfig::default();
    let mut bt_config = BacktestConfig::new(start_date, end_date);
    bt_config.initial_capital =
        config.get_double("backtest", "initial_capital", bt_config.initial_capital);
    bt_config.execution = ExecutionConfig {
        commission_pct: config.get_double("backtest", "commission_pct", defaults.commission_pct),
        slippage_pct: config.get_double("backtest", "slippage_pct", defaults.slippage_pct),
        max_position_fraction: config.get_double(
            "backtest",
            "max_position_fraction",
            defaults.max_position_fraction,
        ),
    };
    bt_config.cooldown_bars =
        config.get_int("backtest", "cooldown_bars", bt_config.cooldown_bars as i64).max(0) as usize;
    bt_config.plan_ttl_bars =
        config.get_int("backtest", "plan_ttl_bars", bt_config.plan_ttl_bars as i64).max(1) as usize;
    Ok(bt_config)
}

fn data_adapter(config: &dyn ConfigPort) -> Result<CsvAdapter, SmartstockError> {
    validate_data_config(config)?;
    let dir = config.get_string("data", "dir").unwrap_or_default();
    Ok(CsvAdapter::new(PathBuf::from(dir.trim())))
}

fn resolve_symbol(config: &dyn ConfigPort, section: &str) -> String {
    config
        .get_string(section, "symbol")
        .map(|s| s.trim().to_uppercase())
        .unwrap_or_default()
}

fn run_eod(config_path: &PathBuf, symbol_override: Option<&str>) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let mut adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    if let Some(symbol) = symbol_override {
        adapter.set("eod", "symbol", symbol);
    }

    if let Err(e) = validate_eod_config(&adapter) {
        return fail(&e);
    }

    let data_port = match data_adapter(&adapter) {
        Ok(d) => d,
        Err(e) => return fail(&e),
    };
    let symbol = resolve_symbol(&adapter, "eod");
    let lookback = adapter.get_int("eod", "lookback_bars", 2520).max(0) as usize;
    let policy = build_period_policy(&adapter);

    run_eod_pipeline(&data_port, &symbol, lookback, &policy)
}

pub fn run_eod_pipeline(
    data_port: &dyn DataPort,
    symbol: &str,
    lookback: usize,
    policy: &PeriodPolicy,
) -> ExitCode {
    match analyze_symbol(data_port, symbol, lookback, policy) {
        Ok(report) => {
            print_eod_report(&report);
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

/// Fetch the recent window for `symbol` and run EOD analysis on it.
pub fn analyze_symbol(
    data_port: &dyn DataPort,
    symbol: &str,
    lookback: usize,
    policy: &PeriodPolicy,
) -> Result<EodReport, SmartstockError> {
    let bars = data_port.fetch_recent(symbol, lookback)?;
    eprintln!("Loaded {} daily bars for {}", bars.len(), symbol);
    let series = BarSeries::new(symbol, Timeframe::Daily, bars)?;
    eod::analyze(series, policy)
}

fn print_eod_report(report: &EodReport) {
    let rec = &report.recommendation;
    let m = &rec.metrics;
    let date = report.date().map(|d| d.to_string()).unwrap_or_default();
    let close = report.close().unwrap_or_default();

    println!("{} {}  close {:.2}", report.symbol, date, close);
    println!("Action:  {} ({})", rec.action, rec.reason);
    println!("Fuel:    {}", m.fuel_display());
    println!("Push:    {}", m.push_display());
    println!("Gap:     {}", m.gap_display());
    println!("Stop:    {}", m.stop_display());
    println!(
        "Macro:   {} (weekly {}, monthly {})",
        m.macro_display(),
        if m.weekly_pass { "PASS" } else { "FAIL" },
        if m.monthly_pass { "PASS" } else { "FAIL" },
    );
    println!(
        "Levels:  HI {:.2}  LO {:.2}  MA200 {:.2}  MA50 {:.2}",
        report.high_ref, report.support_ref, report.ma_long, report.ma_mid
    );
    eprintln!(
        "Series:  {} daily, {} weekly, {} monthly bars",
        report.daily.len(),
        report.weekly.len(),
        report.monthly.len()
    );
}

fn run_backtest(
    config_path: &PathBuf,
    symbol_override: Option<&str>,
    start_override: Option<&str>,
    end_override: Option<&str>,
    output_path: Option<&PathBuf>,
) -> ExitCode {
    // Stage 1: Load config and apply overrides
    eprintln!("Loading config from {}", config_path.display());
    let mut adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    for (key, value) in [
        ("symbol", symbol_override),
        ("start_date", start_override),
        ("end_date", end_override),
    ] {
        if let Some(v) = value {
            adapter.set("backtest", key, v);
        }
    }

    // Stage 2: Validate and build
    if let Err(e) = validate_backtest_config(&adapter) {
        return fail(&e);
    }
    let bt_config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };
    let data_port = match data_adapter(&adapter) {
        Ok(d) => d,
        Err(e) => return fail(&e),
    };
    let symbol = resolve_symbol(&adapter, "backtest");
    let policy = build_period_policy(&adapter);

    // Stage 3: Run and report
    let report_port = CsvReportAdapter::new();
    let report: Option<&dyn ReportPort> = output_path.map(|_| &report_port as &dyn ReportPort);
    run_backtest_pipeline(
        &data_port,
        report,
        &symbol,
        &bt_config,
        &policy,
        output_path,
    )
}

pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    report_port: Option<&dyn ReportPort>,
    symbol: &str,
    bt_config: &BacktestConfig,
    policy: &PeriodPolicy,
    output_path: Option<&PathBuf>,
) -> ExitCode {
    let result = match backtest_symbol(data_port, symbol, bt_config, policy) {
        Ok(r) => r,
        Err(e) => return fail(&e),
    };

    print_backtest_summary(&result, bt_config);

    if let (Some(port), Some(dir)) = (report_port, output_path) {
        if let Err(e) = port.write(&result, dir) {
            return fail(&e);
        }
        eprintln!("\nReport written to: {}", dir.display());
    }
    ExitCode::SUCCESS
}

/// Fetch `symbol` over the configured range and replay it.
pub fn backtest_symbol(
    data_port: &dyn DataPort,
    symbol: &str,
    bt_config: &BacktestConfig,
    policy: &PeriodPolicy,
) -> Result<BacktestResult, SmartstockError> {
    let bars = data_port.fetch_ohlcv(symbol, bt_config.start_date, bt_config.end_date)?;
    eprintln!(
        "Running backtest: {} ({} bars, {} to {})",
        symbol,
        bars.len(),
        bt_config.start_date,
        bt_config.end_date,
    );
    let series = BarSeries::new(symbol, Timeframe::Daily, bars)?;
    backtest_engine::run_backtest(series, bt_config, policy)
}

fn print_backtest_summary(result: &BacktestResult, bt_config: &BacktestConfig) {
    let stats = &result.stats;
    let first = result.equity_curve.first().map(|p| p.date);
    let last = result.equity_curve.last().map(|p| p.date);

    eprintln!("\n=== Backtest Results: {} ===", result.symbol);
    if let (Some(first), Some(last)) = (first, last) {
        eprintln!("Evaluated:        {} to {}", first, last);
    }
    eprintln!("Initial Capital:  {}", crate::domain::metrics::format_currency(bt_config.initial_capital));
    eprintln!("Final Equity:     {}", stats.final_equity_display());
    eprintln!("Total Return:     {}", stats.total_return_display());
    eprintln!("Max Drawdown:     {}", stats.max_drawdown_display());
    eprintln!("Signals Issued:   {}", stats.signals_issued);
    eprintln!("Triggered:        {}", stats.signals_triggered);
    eprintln!("Macro Vetoes:     {}", stats.macro_vetoes);
    eprintln!(
        "Entries:          {} breakout, {} reversal",
        stats.breakout_trades, stats.reversal_trades
    );
    eprintln!(
        "Round Trips:      {} ({} win rate)",
        stats.round_trips,
        stats.win_rate_display()
    );
    eprintln!("Final State:      {:?}", result.final_state);
}

fn run_list_symbols(config_path: &PathBuf) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let adapter = match data_adapter(&config) {
        Ok(a) => a,
        Err(e) => return fail(&e),
    };

    let symbols = match adapter.list_symbols() {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    if symbols.is_empty() {
        eprintln!("No symbols found");
    } else {
        for symbol in &symbols {
            println!("{}", symbol);
        }
        eprintln!("{} symbols found", symbols.len());
    }
    ExitCode::SUCCESS
}
