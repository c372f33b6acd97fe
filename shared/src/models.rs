use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// One daily OHLCV observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Reasons a bar sequence is rejected before any indicator is computed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataIntegrityError {
    #[error("bar {index}: date {current} does not follow {previous}")]
    NonMonotonicDate {
        index: usize,
        previous: NaiveDate,
        current: NaiveDate,
    },

    #[error("bar {index}: {field} price {value} is not a positive finite number")]
    InvalidPrice {
        index: usize,
        field: &'static str,
        value: f64,
    },

    #[error("bar {index}: negative volume {value}")]
    NegativeVolume { index: usize, value: f64 },
}

/// Checks ordering and price sanity of a bar sequence.
///
/// Dates must be strictly increasing (gaps are fine, duplicates are not) and every
/// OHLC field must be finite and greater than zero.
pub fn validate_bars(bars: &[Bar]) -> Result<(), DataIntegrityError> {
    for (index, bar) in bars.iter().enumerate() {
        for (field, value) in [
            ("open", bar.open),
            ("high", bar.high),
            ("low", bar.low),
            ("close", bar.close),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(DataIntegrityError::InvalidPrice { index, field, value });
            }
        }
        if index > 0 {
            let previous = bars[index - 1].date;
            if bar.date <= previous {
                return Err(DataIntegrityError::NonMonotonicDate {
                    index,
                    previous,
                    current: bar.date,
                });
            }
        }
    }
    Ok(())
}

/// A validated, date-ordered bar sequence for one instrument.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceHistory {
    ticker: String,
    bars: Vec<Bar>,
}

impl PriceHistory {
    pub fn new(ticker: impl Into<String>, bars: Vec<Bar>) -> Result<Self, DataIntegrityError> {
        validate_bars(&bars)?;
        Ok(Self {
            ticker: ticker.into(),
            bars,
        })
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrendLabel {
    Strong,
    Medium,
    Weak,
    Neutral,
}

impl TrendLabel {
    pub fn from_score(score: u8) -> Self {
        match score {
            80.. => TrendLabel::Strong,
            60..=79 => TrendLabel::Medium,
            40..=59 => TrendLabel::Weak,
            _ => TrendLabel::Neutral,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TrendLabel::Strong => "Strong",
            TrendLabel::Medium => "Medium",
            TrendLabel::Weak => "Weak",
            TrendLabel::Neutral => "Neutral",
        }
    }
}

impl fmt::Display for TrendLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Indicator readings for the last bar of a history prefix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub date: NaiveDate,
    pub close: f64,
    pub ema20: f64,
    pub ema50: f64,
    pub ema200: f64,
    pub rsi14: f64,
    pub macd: f64,
    pub macd_signal: f64,
    pub macd_histogram: f64,
    pub macd_above_signal: bool,
    pub adx14: f64,
    pub plus_di14: f64,
    pub minus_di14: f64,
    pub volume_ratio: f64,
    pub bullish_crossover: bool,
    pub bearish_crossover: bool,
    pub momentum_score: u8,
    pub trend_label: TrendLabel,
}

/// A hypothetical entry recorded when the momentum score reached the backtest threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestSignal {
    pub bar_index: usize,
    pub trigger_date: NaiveDate,
    pub entry_price: f64,
    pub momentum_score: u8,
    /// Holding period in bars -> forward return in percent, rounded to two decimals.
    pub forward_returns: BTreeMap<usize, f64>,
}

impl BacktestSignal {
    pub fn forward_return(&self, holding_period: usize) -> Option<f64> {
        self.forward_returns.get(&holding_period).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(day: u32, close: f64) -> Bar {
        Bar {
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1_000,
        }
    }

    #[test]
    fn test_validate_accepts_gaps() {
        let bars = vec![bar(1, 10.0), bar(4, 11.0), bar(5, 12.0)];
        assert!(validate_bars(&bars).is_ok());
    }

    #[test]
    fn test_validate_rejects_duplicate_date() {
        let bars = vec![bar(1, 10.0), bar(2, 11.0), bar(2, 12.0)];
        let err = validate_bars(&bars).unwrap_err();
        assert!(matches!(err, DataIntegrityError::NonMonotonicDate { index: 2, .. }));
    }

    #[test]
    fn test_validate_rejects_backwards_date() {
        let bars = vec![bar(5, 10.0), bar(3, 11.0)];
        assert!(matches!(
            validate_bars(&bars),
            Err(DataIntegrityError::NonMonotonicDate { index: 1, .. })
        ));
    }

    #[test]
    fn test_validate_rejects_negative_and_nan_prices() {
        let mut negative = bar(1, 10.0);
        negative.low = -0.5;
        let err = validate_bars(&[negative]).unwrap_err();
        assert_eq!(
            err,
            DataIntegrityError::InvalidPrice { index: 0, field: "low", value: -0.5 }
        );

        let mut nan = bar(2, 10.0);
        nan.close = f64::NAN;
        let err = validate_bars(&[bar(1, 10.0), nan]).unwrap_err();
        assert!(matches!(err, DataIntegrityError::InvalidPrice { index: 1, field: "close", .. }));
    }

    #[test]
    fn test_price_history_rejects_malformed_bars() {
        let result = PriceHistory::new("ACME", vec![bar(2, 10.0), bar(1, 11.0)]);
        assert!(result.is_err());

        let history = PriceHistory::new("ACME", vec![bar(1, 10.0), bar(2, 11.0)]).unwrap();
        assert_eq!(history.ticker(), "ACME");
        assert_eq!(history.len(), 2);
        assert_eq!(history.last().map(|b| b.close), Some(11.0));
    }

    #[test]
    fn test_empty_history_is_valid() {
        let history = PriceHistory::new("NONE", Vec::new()).unwrap();
        assert!(history.is_empty());
    }

    #[test]
    fn test_trend_label_boundaries() {
        assert_eq!(TrendLabel::from_score(100), TrendLabel::Strong);
        assert_eq!(TrendLabel::from_score(80), TrendLabel::Strong);
        assert_eq!(TrendLabel::from_score(79), TrendLabel::Medium);
        assert_eq!(TrendLabel::from_score(60), TrendLabel::Medium);
        assert_eq!(TrendLabel::from_score(59), TrendLabel::Weak);
        assert_eq!(TrendLabel::from_score(40), TrendLabel::Weak);
        assert_eq!(TrendLabel::from_score(39), TrendLabel::Neutral);
        assert_eq!(TrendLabel::from_score(0), TrendLabel::Neutral);
    }

    #[test]
    fn test_signal_serializes_forward_returns_by_period() {
        let mut forward_returns = BTreeMap::new();
        forward_returns.insert(10, -1.25);
        forward_returns.insert(5, 2.5);
        let signal = BacktestSignal {
            bar_index: 60,
            trigger_date: NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
            entry_price: 101.5,
            momentum_score: 85,
            forward_returns,
        };
        assert_eq!(signal.forward_return(5), Some(2.5));
        assert_eq!(signal.forward_return(20), None);

        let json = serde_json::to_value(&signal).unwrap();
        assert_eq!(json["forward_returns"]["5"], 2.5);
        assert_eq!(json["trigger_date"], "2024-05-02");
    }
}
