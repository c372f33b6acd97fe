// Scanner settings, loaded from a JSON config file
use crate::backtest::BacktestConfig;
use crate::error::EngineError;
use crate::services::DEFAULT_MAX_CONCURRENT_FETCHES;
use crate::snapshot::MIN_BARS;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct BacktestSettings {
    pub score_threshold: u8,
    pub holding_periods: Vec<usize>,
}

impl Default for BacktestSettings {
    fn default() -> Self {
        BacktestSettings {
            score_threshold: 70,
            holding_periods: vec![5, 10, 20],
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ScannerSettings {
    /// Directory holding one `<TICKER>.csv` per instrument.
    pub data_dir: PathBuf,
    pub report_dir: PathBuf,
    pub tickers: Vec<String>,
    pub lookback_bars: usize,
    pub max_concurrent_fetches: usize,
    pub backtest: BacktestSettings,
}

impl Default for ScannerSettings {
    fn default() -> Self {
        ScannerSettings {
            data_dir: PathBuf::from("data"),
            report_dir: PathBuf::from("reports"),
            tickers: Vec::new(),
            lookback_bars: 126,
            max_concurrent_fetches: DEFAULT_MAX_CONCURRENT_FETCHES,
            backtest: BacktestSettings::default(),
        }
    }
}

impl ScannerSettings {
    pub fn load(path: &Path) -> Result<Self, EngineError> {
        let raw = std::fs::read_to_string(path)?;
        let settings = Self::from_json_str(&raw)?;
        tracing::debug!(path = %path.display(), tickers = settings.tickers.len(), "loaded scanner settings");
        Ok(settings)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, EngineError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.lookback_bars == 0 {
            return Err(EngineError::ConfigError("lookback_bars must be positive".to_string()));
        }
        if self.max_concurrent_fetches == 0 {
            return Err(EngineError::ConfigError(
                "max_concurrent_fetches must be positive".to_string(),
            ));
        }
        if self.lookback_bars < MIN_BARS {
            tracing::warn!(
                lookback_bars = self.lookback_bars,
                min_bars = MIN_BARS,
                "lookback shorter than indicator warm-up, every ticker will be indeterminate"
            );
        }
        self.backtest_config().map(|_| ())
    }

    pub fn backtest_config(&self) -> Result<BacktestConfig, EngineError> {
        BacktestConfig::new(
            self.backtest.score_threshold,
            self.backtest.holding_periods.iter().copied(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let settings = ScannerSettings::default();
        assert_eq!(settings.lookback_bars, 126);
        assert_eq!(settings.max_concurrent_fetches, 8);
        assert_eq!(settings.backtest.score_threshold, 70);
        assert_eq!(settings.backtest.holding_periods, vec![5, 10, 20]);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let settings = ScannerSettings::from_json_str(
            r#"{ "tickers": ["AAPL", "msft"], "backtest": { "score_threshold": 80 } }"#,
        )
        .unwrap();
        assert_eq!(settings.tickers, vec!["AAPL".to_string(), "msft".to_string()]);
        assert_eq!(settings.backtest.score_threshold, 80);
        assert_eq!(settings.backtest.holding_periods, vec![5, 10, 20]);
        assert_eq!(settings.data_dir, PathBuf::from("data"));

        let config = settings.backtest_config().unwrap();
        assert_eq!(config.score_threshold(), 80);
        assert_eq!(config.max_holding_period(), 20);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{ "data_dir": "/srv/bars", "lookback_bars": 252 }}"#).unwrap();
        let settings = ScannerSettings::load(file.path()).unwrap();
        assert_eq!(settings.data_dir, PathBuf::from("/srv/bars"));
        assert_eq!(settings.lookback_bars, 252);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let zero_lookback = ScannerSettings { lookback_bars: 0, ..ScannerSettings::default() };
        assert!(matches!(zero_lookback.validate(), Err(EngineError::ConfigError(_))));

        let zero_fetches = ScannerSettings { max_concurrent_fetches: 0, ..ScannerSettings::default() };
        assert!(matches!(zero_fetches.validate(), Err(EngineError::ConfigError(_))));

        let no_periods = ScannerSettings {
            backtest: BacktestSettings { score_threshold: 70, holding_periods: Vec::new() },
            ..ScannerSettings::default()
        };
        assert!(matches!(no_periods.validate(), Err(EngineError::ConfigError(_))));
    }

    #[test]
    fn test_malformed_json_is_json_error() {
        let err = ScannerSettings::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, EngineError::JsonError { .. }));
        let err = ScannerSettings::load(Path::new("no/such/settings.json")).unwrap_err();
        assert!(matches!(err, EngineError::IoError { .. }));
    }
}
