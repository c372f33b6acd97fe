//! Threshold backtest over a single instrument's history.
//!
//! Walks bars from the warm-up index to the last bar that still has every requested
//! holding period ahead of it, and records a [`BacktestSignal`] wherever the momentum
//! score reaches the threshold.

pub mod summary;

pub use summary::{BacktestSummary, HorizonStats};

use crate::error::EngineError;
use crate::snapshot::{IndicatorSeries, SnapshotResult, MIN_BARS};
use shared::utils::{percent_change, round_to};
use shared::{validate_bars, BacktestSignal, Bar, DataIntegrityError};
use std::collections::{BTreeMap, BTreeSet};

/// First bar index evaluated by the backtest.
pub const WARMUP_BARS: usize = MIN_BARS;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BacktestConfig {
    score_threshold: u8,
    holding_periods: BTreeSet<usize>,
}

impl BacktestConfig {
    pub fn new(
        score_threshold: u8,
        holding_periods: impl IntoIterator<Item = usize>,
    ) -> Result<Self, EngineError> {
        let holding_periods: BTreeSet<usize> = holding_periods.into_iter().collect();
        if holding_periods.is_empty() {
            return Err(EngineError::ConfigError(
                "at least one holding period is required".to_string(),
            ));
        }
        if holding_periods.contains(&0) {
            return Err(EngineError::ConfigError(
                "holding periods must be at least one bar".to_string(),
            ));
        }
        Ok(Self {
            score_threshold,
            holding_periods,
        })
    }

    pub fn score_threshold(&self) -> u8 {
        self.score_threshold
    }

    pub fn holding_periods(&self) -> &BTreeSet<usize> {
        &self.holding_periods
    }

    pub fn max_holding_period(&self) -> usize {
        // Non-empty by construction.
        self.holding_periods.iter().next_back().copied().unwrap_or(0)
    }

    /// Shortest history that can produce at least one signal.
    pub fn min_history_len(&self) -> usize {
        WARMUP_BARS + self.max_holding_period() + 1
    }
}

pub fn backtest(bars: &[Bar], config: &BacktestConfig) -> Result<Vec<BacktestSignal>, DataIntegrityError> {
    validate_bars(bars)?;
    if bars.len() < config.min_history_len() {
        tracing::debug!(
            bars = bars.len(),
            required = config.min_history_len(),
            "history too short to backtest"
        );
        return Ok(Vec::new());
    }

    let series = IndicatorSeries::compute(bars);
    let last_index = bars.len() - config.max_holding_period() - 1;
    let mut signals = Vec::new();

    for index in WARMUP_BARS..=last_index {
        let snapshot = match series.snapshot_at(index) {
            SnapshotResult::Ready(snapshot) => snapshot,
            SnapshotResult::Indeterminate { .. } => continue,
        };
        if snapshot.momentum_score < config.score_threshold {
            continue;
        }

        let entry_price = bars[index].close;
        let forward_returns: BTreeMap<usize, f64> = config
            .holding_periods
            .iter()
            .map(|&h| {
                let exit = bars[index + h].close;
                (h, round_to(percent_change(entry_price, exit), 2))
            })
            .collect();

        signals.push(BacktestSignal {
            bar_index: index,
            trigger_date: bars[index].date,
            entry_price,
            momentum_score: snapshot.momentum_score,
            forward_returns,
        });
    }

    tracing::debug!(
        bars = bars.len(),
        evaluated = last_index + 1 - WARMUP_BARS,
        signals = signals.len(),
        threshold = config.score_threshold,
        "backtest complete"
    );
    Ok(signals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::compute_snapshot;
    use crate::snapshot::fixtures::{choppy, flat, linear_rise};
    use proptest::prelude::*;

    fn config(threshold: u8, periods: &[usize]) -> BacktestConfig {
        BacktestConfig::new(threshold, periods.iter().copied()).unwrap()
    }

    #[test]
    fn test_config_rejects_empty_and_zero_periods() {
        assert!(matches!(BacktestConfig::new(70, std::iter::empty()), Err(EngineError::ConfigError(_))));
        assert!(matches!(BacktestConfig::new(70, [0usize, 5]), Err(EngineError::ConfigError(_))));
        let cfg = config(70, &[20, 5, 10, 5]);
        assert_eq!(cfg.holding_periods().iter().copied().collect::<Vec<_>>(), vec![5, 10, 20]);
        assert_eq!(cfg.max_holding_period(), 20);
        assert_eq!(cfg.min_history_len(), 71);
    }

    #[test]
    fn test_flat_history_yields_no_signals() {
        let signals = backtest(&flat(80, 42.0), &config(80, &[5])).unwrap();
        assert!(signals.is_empty());
    }

    #[test]
    fn test_short_history_yields_empty() {
        let bars = linear_rise(70);
        // 50 + 20 + 1 = 71 bars needed.
        assert!(backtest(&bars, &config(0, &[20])).unwrap().is_empty());
    }

    #[test]
    fn test_minimum_history_evaluates_exactly_one_bar() {
        let bars = choppy(71);
        let signals = backtest(&bars, &config(0, &[20])).unwrap();
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].bar_index, 50);
    }

    #[test]
    fn test_threshold_zero_emits_every_evaluated_bar() {
        let bars = choppy(120);
        let signals = backtest(&bars, &config(0, &[5, 10])).unwrap();
        assert_eq!(signals.len(), 120 - 10 - 50);
        assert_eq!(signals.first().map(|s| s.bar_index), Some(50));
        assert_eq!(signals.last().map(|s| s.bar_index), Some(109));
    }

    #[test]
    fn test_forward_returns_are_rounded_percentages() {
        let bars = linear_rise(100);
        let signals = backtest(&bars, &config(0, &[5])).unwrap();
        let signal = &signals[0];
        assert_eq!(signal.entry_price, bars[50].close);
        let expected = ((bars[55].close - bars[50].close) / bars[50].close * 100.0 * 100.0).round() / 100.0;
        assert_eq!(signal.forward_return(5), Some(expected));
        assert!(signal.forward_return(5).unwrap() > 0.0);
    }

    #[test]
    fn test_signals_match_prefix_snapshots() {
        let bars = choppy(150);
        let cfg = config(40, &[3, 7]);
        let signals = backtest(&bars, &cfg).unwrap();
        for signal in &signals {
            let snapshot = compute_snapshot(&bars[..=signal.bar_index])
                .unwrap()
                .into_snapshot()
                .unwrap();
            assert_eq!(snapshot.momentum_score, signal.momentum_score);
            assert!(snapshot.momentum_score >= 40);
        }
        let expected = (WARMUP_BARS..=150 - 7 - 1)
            .filter(|&i| {
                compute_snapshot(&bars[..=i])
                    .unwrap()
                    .into_snapshot()
                    .map_or(false, |s| s.momentum_score >= 40)
            })
            .count();
        assert_eq!(signals.len(), expected);
    }

    #[test]
    fn test_malformed_history_is_rejected() {
        let mut bars = linear_rise(100);
        bars[70].high = f64::INFINITY;
        assert!(backtest(&bars, &config(0, &[5])).is_err());
    }

    proptest! {
        #[test]
        fn backtest_window_and_determinism(
            len in 40usize..140,
            periods in prop::collection::btree_set(1usize..30, 1..4),
            threshold in 0u8..=100,
        ) {
            let bars = choppy(len);
            let cfg = BacktestConfig::new(threshold, periods.iter().copied()).unwrap();
            let max_h = cfg.max_holding_period();
            let first = backtest(&bars, &cfg).unwrap();
            let second = backtest(&bars, &cfg).unwrap();
            prop_assert_eq!(&first, &second);
            for signal in &first {
                prop_assert!(signal.bar_index >= WARMUP_BARS);
                prop_assert!(signal.bar_index + max_h < bars.len());
                prop_assert!(signal.momentum_score >= threshold);
                prop_assert_eq!(signal.forward_returns.len(), periods.len());
            }
        }
    }
}
