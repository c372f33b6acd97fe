use crate::data::csv_parser::DailyCsvParser;
use crate::error::EngineError;
use async_trait::async_trait;
use chrono::NaiveDate;
use shared::Bar;
use std::path::{Path, PathBuf};

/// The slice of history a caller wants: at most `lookback_bars` bars dated on or before `as_of`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HistoryWindow {
    pub as_of: NaiveDate,
    pub lookback_bars: usize,
}

impl HistoryWindow {
    pub fn new(as_of: NaiveDate, lookback_bars: usize) -> Self {
        Self { as_of, lookback_bars }
    }

    /// Drops bars after `as_of`, then keeps the most recent `lookback_bars`.
    pub fn apply(&self, mut bars: Vec<Bar>) -> Vec<Bar> {
        bars.retain(|bar| bar.date <= self.as_of);
        let excess = bars.len().saturating_sub(self.lookback_bars);
        bars.drain(..excess);
        bars
    }
}

/// Source of daily bars for a ticker.
///
/// An unknown ticker yields an empty vector. Errors are reserved for a provider that
/// could not answer (I/O, malformed payload, rejected request).
#[async_trait]
pub trait PriceHistoryProvider: Send + Sync {
    async fn fetch_history(&self, ticker: &str, window: &HistoryWindow) -> Result<Vec<Bar>, EngineError>;
}

/// Reads `<root>/<TICKER>.csv` files in the `Date,Open,High,Low,Close,Volume` layout.
pub struct CsvDirectoryProvider {
    root: PathBuf,
}

impl CsvDirectoryProvider {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn path_for(&self, ticker: &str) -> Result<PathBuf, EngineError> {
        let valid = !ticker.is_empty()
            && ticker
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '=' | '_'))
            && !ticker.contains("..");
        if !valid {
            return Err(EngineError::ProviderError {
                ticker: ticker.to_string(),
                message: "ticker contains unsupported characters".to_string(),
            });
        }
        Ok(self.root.join(format!("{}.csv", ticker.to_ascii_uppercase())))
    }
}

#[async_trait]
impl PriceHistoryProvider for CsvDirectoryProvider {
    async fn fetch_history(&self, ticker: &str, window: &HistoryWindow) -> Result<Vec<Bar>, EngineError> {
        let path = self.path_for(ticker)?;
        let contents = match tokio::fs::read(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(ticker = %ticker, path = %path.display(), "no history file for ticker");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let bars = DailyCsvParser::parse_bars(contents.as_slice())?;
        let total = bars.len();
        let bars = window.apply(bars);
        tracing::debug!(
            ticker = %ticker,
            total,
            kept = bars.len(),
            as_of = %window.as_of,
            "loaded history from CSV"
        );
        Ok(bars)
    }
}
