//! INI file configuration adapter.
//!
//! Sections and keys are case-insensitive. Values given on the command line
//! are written over the file's with [`FileConfigAdapter::set`].

use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let mut config = Ini::new();
        config.load(path).map_err(std::io::Error::other)?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, String> {
        let mut config = Ini::new();
        config.read(content.to_string())?;
        Ok(Self { config })
    }

    /// Override (or add) a single value.
    pub fn set(&mut self, section: &str, key: &str, value: &str) {
        self.config.set(section, key, Some(value.to_string()));
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.config
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"
[data]
dir = /var/lib/smartstock

[backtest]
symbol = SPY
start_date = 2015-01-01
end_date = 2024-12-31
initial_capital = 100000.0
commission_pct = 0.1
cooldown_bars = 10

[eod]
symbol = QQQ

[resample]
week_ends_on = fri
"#;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn from_string_parses_sections() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(
            adapter.get_string("data", "dir"),
            Some("/var/lib/smartstock".to_string())
        );
        assert_eq!(adapter.get_string("eod", "symbol"), Some("QQQ".to_string()));
        assert_eq!(
            adapter.get_string("resample", "week_ends_on"),
            Some("fri".to_string())
        );
    }

    #[test]
    fn numeric_values() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(adapter.get_int("backtest", "cooldown_bars", 0), 10);
        assert_eq!(adapter.get_double("backtest", "initial_capital", 0.0), 100000.0);
        assert_eq!(adapter.get_double("backtest", "commission_pct", 0.0), 0.1);
    }

    #[test]
    fn missing_keys_fall_back() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(adapter.get_string("backtest", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
        assert_eq!(adapter.get_int("backtest", "plan_ttl_bars", 15), 15);
        assert_eq!(adapter.get_double("backtest", "slippage_pct", 0.05), 0.05);
    }

    #[test]
    fn non_numeric_falls_back() {
        let adapter =
            FileConfigAdapter::from_string("[backtest]\ncooldown_bars = abc\n").unwrap();
        assert_eq!(adapter.get_int("backtest", "cooldown_bars", 42), 42);
        assert_eq!(adapter.get_double("backtest", "cooldown_bars", 9.5), 9.5);
    }

    #[test]
    fn set_overrides_file_value() {
        let mut adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        adapter.set("backtest", "symbol", "IWM");
        adapter.set("backtest", "output", "out");
        assert_eq!(adapter.get_string("backtest", "symbol"), Some("IWM".to_string()));
        assert_eq!(adapter.get_string("backtest", "output"), Some("out".to_string()));
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config(SAMPLE);
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(adapter.get_string("backtest", "symbol"), Some("SPY".to_string()));
    }

    #[test]
    fn from_file_returns_error_for_missing_file() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/config.ini");
        assert!(result.is_err());
    }
}
