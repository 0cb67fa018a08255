//! Domain error types.
//!
//! Every boundary function returns `Result<_, SmartstockError>`. The
//! insufficient-data variants (`NoData`, `InsufficientData`) and the
//! computation-failure variant (`AnalysisFailed`) are kept distinct so callers
//! can tell "nothing to show yet" apart from "something went wrong".

use crate::domain::timeframe::Timeframe;

/// Top-level error type for smartstock.
#[derive(Debug, thiserror::Error)]
pub enum SmartstockError {
    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("no data for {symbol}")]
    NoData { symbol: String },

    #[error("insufficient {timeframe} data for {symbol}: have {bars} bars, need {minimum}")]
    InsufficientData {
        symbol: String,
        timeframe: Timeframe,
        bars: usize,
        minimum: usize,
    },

    #[error("analysis failed: {reason}")]
    AnalysisFailed { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SmartstockError {
    /// True for the "not enough history" outcomes, as opposed to hard failures.
    pub fn is_insufficient_data(&self) -> bool {
        matches!(
            self,
            SmartstockError::NoData { .. } | SmartstockError::InsufficientData { .. }
        )
    }
}

impl From<&SmartstockError> for std::process::ExitCode {
    fn from(err: &SmartstockError) -> Self {
        let code: u8 = match err {
            SmartstockError::Io(_) => 1,
            SmartstockError::ConfigParse { .. }
            | SmartstockError::ConfigMissing { .. }
            | SmartstockError::ConfigInvalid { .. } => 2,
            SmartstockError::DataSource { .. } => 3,
            SmartstockError::NoData { .. } | SmartstockError::InsufficientData { .. } => 5,
            SmartstockError::AnalysisFailed { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
